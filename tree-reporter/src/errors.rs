// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by tree-reporter.

use crate::{
    reporter::TestKey,
    tree::{LifecycleOp, NodeId, NodeState, TestOutcome},
};
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error, fmt, io};
use thiserror::Error;

/// An error produced by an operation on the result tree.
///
/// These indicate that the tree was driven in a way that the lifecycle state machine does not
/// allow. The offending operation is aborted and the tree is left as it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// The node does not belong to this tree.
    #[error("node {id} does not exist in this tree")]
    UnknownNode {
        /// The requested node.
        id: NodeId,
    },

    /// A lifecycle operation was attempted on the hidden root.
    #[error("cannot {operation} the hidden root node")]
    HiddenRoot {
        /// The attempted operation.
        operation: LifecycleOp,
    },

    /// A lifecycle operation is not permitted from the node's current state.
    #[error("cannot {operation} node {id} (`{name}`): unexpected state `{state}`")]
    UnexpectedState {
        /// The node.
        id: NodeId,
        /// The node's display name.
        name: String,
        /// The node's state at the time of the call.
        state: NodeState,
        /// The attempted operation.
        operation: LifecycleOp,
    },

    /// A child was added to a suite that has already finished.
    #[error("cannot add child `{child}` to finished suite {id} (`{name}`)")]
    FinishedSuite {
        /// The suite.
        id: NodeId,
        /// The suite's display name.
        name: String,
        /// The name of the child that was being added.
        child: String,
    },

    /// A test's outcome was set more than once.
    #[error("outcome for test {id} (`{name}`) has already been set to `{existing}`")]
    OutcomeAlreadySet {
        /// The test.
        id: NodeId,
        /// The test's display name.
        name: String,
        /// The outcome that was recorded first.
        existing: TestOutcome,
    },

    /// A test was finished before its outcome was set.
    #[error("cannot finish test {id} (`{name}`) before its outcome is set")]
    OutcomeNotSet {
        /// The test.
        id: NodeId,
        /// The test's display name.
        name: String,
    },

    /// A suite operation was attempted on a test node.
    #[error("node {id} (`{name}`) is not a suite")]
    NotASuite {
        /// The node.
        id: NodeId,
        /// The node's display name.
        name: String,
    },

    /// A test operation was attempted on a suite node.
    #[error("node {id} (`{name}`) is not a test")]
    NotATest {
        /// The node.
        id: NodeId,
        /// The node's display name.
        name: String,
    },

    /// The output sink failed.
    #[error("error writing service message")]
    Write {
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while handling a single engine event.
///
/// These are reported through [`Reporter::report`](crate::reporter::Reporter::report) without
/// interrupting delivery of later events.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportEventError {
    /// An event arrived while no run was in progress.
    #[error("received `{event}` event while no run is in progress")]
    NoRunInProgress {
        /// The name of the event.
        event: &'static str,
    },

    /// A `start` event arrived while a run was already in progress.
    #[error("received `start` event while a run is already in progress")]
    RunAlreadyStarted,

    /// The engine speaks a protocol version this reporter does not support.
    ///
    /// The reporter stops producing output for the rest of the process.
    #[error("engine `{engine}` is not supported; no results will be reported")]
    UnsupportedProtocol {
        /// The engine's name, or `unknown`.
        engine: String,
        /// The underlying error.
        #[source]
        error: ProtocolVersionError,
    },

    /// The same test was registered twice.
    #[error("test {key} (`{title}`) has already been associated with a node")]
    TestAlreadyAssociated {
        /// The engine's key for the test.
        key: TestKey,
        /// The test's title.
        title: String,
    },

    /// An operation on the result tree failed.
    #[error("error updating the result tree for test {key} (`{title}`)")]
    Tree {
        /// The engine's key for the test.
        key: TestKey,
        /// The test's title.
        title: String,
        /// The underlying error.
        #[source]
        error: TreeError,
    },

    /// Finishing unfinished nodes at the end of the run failed.
    #[error("error finishing nodes left over at the end of the run")]
    Sweep {
        /// The underlying error.
        #[source]
        error: TreeError,
    },

    /// The run preamble could not be written.
    #[error("error writing run preamble")]
    Preamble {
        /// The underlying error.
        #[source]
        error: TreeError,
    },

    /// An event could not be decoded from the engine's stream.
    #[error("error decoding engine event on line {line}")]
    Decode {
        /// The 1-based line number in the stream.
        line: usize,
        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

/// Error returned when an engine announces a protocol version that fails to parse or is not
/// supported.
#[derive(Clone, Debug, Error)]
#[error("unsupported engine protocol version: {input}")]
pub struct ProtocolVersionError {
    /// The input that failed to parse.
    pub input: String,
    /// The underlying error.
    #[source]
    pub err: ProtocolVersionErrorInner,
}

/// The different errors that can occur when parsing and validating a protocol version.
#[derive(Clone, Debug, Error)]
pub enum ProtocolVersionErrorInner {
    /// The input did not have a valid syntax.
    #[error("expected protocol version in form of `{expected}`")]
    InvalidFormat {
        /// The expected pseudo format.
        expected: &'static str,
    },
    /// A decimal integer was expected but could not be parsed.
    #[error("version component `{which}` could not be parsed as an integer")]
    InvalidInteger {
        /// Which component was invalid.
        which: &'static str,
        /// The parse failure.
        #[source]
        err: std::num::ParseIntError,
    },
    /// The major version is not one this reporter understands.
    #[error("major version {value} is not supported (supported: {supported})")]
    UnsupportedMajor {
        /// The major version that was parsed.
        value: u16,
        /// The supported major version.
        supported: u16,
    },
}

/// An error that occurred while reading the reporter config.
#[derive(Debug, Error)]
#[error("failed to parse tree-reporter config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The sources could not be combined into a config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The combined config could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, "\n  caused by: {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
