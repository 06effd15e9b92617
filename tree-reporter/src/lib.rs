// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Live hierarchical test result reporting for IDE test consoles.
//!
//! A test engine emits a stream of events (run started, test began, test passed, and so on). The
//! [`Reporter`](reporter::Reporter) in this crate turns that stream into a tree of suites and
//! tests, and reports every change to the tree as a line-oriented [service
//! message](service_messages) that a test console can render incrementally.
//!
//! The crate is organized in layers:
//!
//! * [`tree`]: the result tree, with a lifecycle state machine per node.
//! * [`reporter`]: maps engine events onto tree operations, isolating failures per event.
//! * [`sink`]: where rendered messages are written.
//! * [`config`]: user-facing settings, read from `.config/tree-reporter.toml`.

pub mod config;
pub mod errors;
pub mod reporter;
pub mod sink;
pub mod tree;
