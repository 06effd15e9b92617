// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while reversing [`escape_attribute_value`](crate::escape_attribute_value).
///
/// Returned by [`unescape_attribute_value`](crate::unescape_attribute_value).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum UnescapeError {
    /// The value ended with an escape character that had nothing after it.
    #[error("dangling escape character at end of value (offset {offset})")]
    DanglingEscape {
        /// The byte offset of the escape character.
        offset: usize,
    },

    /// An escape character was followed by a character that is not a known substitute.
    #[error("unknown escape sequence `|{substitute}` at offset {offset}")]
    UnknownEscape {
        /// The byte offset of the escape character.
        offset: usize,

        /// The character following the escape character.
        substitute: char,
    },
}

/// An error that occurs while parsing a rendered service message.
///
/// Returned by [`ServiceMessage::parse`](crate::ServiceMessage::parse).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseMessageError {
    /// The line did not start with `##teamcity[`.
    #[error("line does not start with `##teamcity[`")]
    MissingPrefix,

    /// The line did not end with `]`.
    #[error("message is not terminated by `]`")]
    Unterminated,

    /// The message had no command name.
    #[error("message has no command name")]
    MissingCommand,

    /// An attribute was not of the form `key='value'`.
    #[error("malformed attribute at offset {offset}")]
    MalformedAttribute {
        /// The byte offset within the message body where parsing failed.
        offset: usize,
    },

    /// An attribute value contained an invalid escape sequence.
    #[error("invalid value for attribute `{key}`")]
    InvalidValue {
        /// The attribute whose value failed to unescape.
        key: String,

        /// The underlying error.
        #[source]
        error: UnescapeError,
    },
}
