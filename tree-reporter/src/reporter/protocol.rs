// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ProtocolVersionError, ProtocolVersionErrorInner};
use std::fmt;

/// The version of the engine event protocol, as announced in a `hello` event.
///
/// Minor versions only ever add optional fields, so any minor version of a supported major version
/// is accepted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProtocolVersion {
    /// The major version.
    pub major: u16,
    /// The minor version.
    pub minor: u16,
}

impl ProtocolVersion {
    /// The only major version currently supported.
    pub const SUPPORTED_MAJOR: u16 = 1;

    /// Parses and validates a `<major>.<minor>` version string.
    pub fn parse(input: &str) -> Result<Self, ProtocolVersionError> {
        let error = |err| ProtocolVersionError {
            input: input.to_owned(),
            err,
        };

        let Some((major, minor)) = input.split_once('.') else {
            return Err(error(ProtocolVersionErrorInner::InvalidFormat {
                expected: "<major>.<minor>",
            }));
        };
        let major: u16 = major.parse().map_err(|err| {
            error(ProtocolVersionErrorInner::InvalidInteger {
                which: "major",
                err,
            })
        })?;
        let minor: u16 = minor.parse().map_err(|err| {
            error(ProtocolVersionErrorInner::InvalidInteger {
                which: "minor",
                err,
            })
        })?;

        if major != Self::SUPPORTED_MAJOR {
            return Err(error(ProtocolVersionErrorInner::UnsupportedMajor {
                value: major,
                supported: Self::SUPPORTED_MAJOR,
            }));
        }
        Ok(Self { major, minor })
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.0", 0 ; "initial")]
    #[test_case("1.17", 17 ; "later minor")]
    fn parse_supported(input: &str, minor: u16) {
        let version = ProtocolVersion::parse(input).expect("version is supported");
        assert_eq!(version, ProtocolVersion { major: 1, minor });
        assert_eq!(version.to_string(), input);
    }

    #[test_case("1", "expected protocol version in form of `<major>.<minor>`" ; "no minor")]
    #[test_case("x.1", "version component `major` could not be parsed as an integer" ; "bad major")]
    #[test_case("1.-1", "version component `minor` could not be parsed as an integer" ; "bad minor")]
    #[test_case("1.0.0", "version component `minor` could not be parsed as an integer" ; "patch")]
    #[test_case("2.0", "major version 2 is not supported (supported: 1)" ; "future major")]
    #[test_case("0.9", "major version 0 is not supported (supported: 1)" ; "old major")]
    fn parse_errors(input: &str, message: &str) {
        let error = ProtocolVersion::parse(input).expect_err("version is rejected");
        assert_eq!(error.input, input);
        assert_eq!(error.err.to_string(), message);
    }
}
