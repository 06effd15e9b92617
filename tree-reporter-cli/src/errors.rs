// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    exit_codes::TreeReporterExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::{FromPathBufError, Utf8PathBuf};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;
use tree_reporter::errors::{ConfigParseError, ConfigParseErrorKind};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholder messages. Errors are expected to be printed with
// display_to_stderr, which colorizes them.

/// An error that the user can act on, as opposed to a bug in tree-reporter.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    GetCurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to open input file")]
    InputOpenFailed {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read input")]
    InputReadFailed {
        line: usize,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to write output")]
    WriteOutputFailed {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn input_open_failed(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::InputOpenFailed {
            path: path.into(),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::GetCurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. } => TreeReporterExitCode::SETUP_ERROR,
            Self::InputOpenFailed { .. } | Self::InputReadFailed { .. } => {
                TreeReporterExitCode::INPUT_READ_FAILED
            }
            Self::WriteOutputFailed { .. } => TreeReporterExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::GetCurrentDirFailed { err } => {
                error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                error!("current directory is not valid UTF-8");
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                match err.kind() {
                    ConfigParseErrorKind::BuildError(build_error) => {
                        error!(
                            "failed to parse config file `{}`",
                            err.config_file().style(styles.bold)
                        );
                        Some(build_error.as_ref() as &dyn Error)
                    }
                    ConfigParseErrorKind::DeserializeError(de_error) => {
                        error!(
                            "failed to parse config file `{}` at key `{}`",
                            err.config_file().style(styles.bold),
                            de_error.path().style(styles.bold)
                        );
                        Some(de_error.inner() as &dyn Error)
                    }
                    // The kind is non-exhaustive.
                    _ => {
                        error!("{err}");
                        err.source()
                    }
                }
            }
            Self::InputOpenFailed { path, err } => {
                error!("failed to open input file `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::InputReadFailed { line, err } => {
                error!("failed to read input at line {line}");
                Some(err as &dyn Error)
            }
            Self::WriteOutputFailed { err } => {
                error!("failed to write service messages to stdout");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
