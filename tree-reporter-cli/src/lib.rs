// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line frontend for [`tree_reporter`].
//!
//! `tree-reporter report` reads a test engine's JSON event stream, one event per line, and writes
//! the corresponding service messages to stdout as each event arrives.
//!
//! Exit codes are documented in [`TreeReporterExitCode`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::TreeReporterExitCode;
#[doc(hidden)]
pub use output::{Color, OutputContext, StderrStyles};
