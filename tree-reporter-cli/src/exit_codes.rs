// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `tree-reporter` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TreeReporterExitCode {}

impl TreeReporterExitCode {
    /// The stream was reported without errors.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up the reporter, for example an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The stream was reported to the end, but one or more events could not be handled.
    ///
    /// Each such error is logged to stderr as it happens.
    pub const EVENT_ERRORS: i32 = 100;

    /// The input stream could not be opened or read.
    pub const INPUT_READ_FAILED: i32 = 101;

    /// Writing service messages to stdout produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
