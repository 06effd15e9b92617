// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Render and read test-status service messages.
//!
//! A service message is a single line of the form
//!
//! ```text
//! ##teamcity[<command> key1='value1' key2='value2']
//! ```
//!
//! Development environments parse these lines character by character to build a live view of a
//! test run. Attribute values are escaped with [`escape_attribute_value`] so that a value can never
//! terminate the line, the attribute or the message early.

mod errors;
mod escape;
mod message;

pub use errors::*;
pub use escape::*;
pub use message::*;
