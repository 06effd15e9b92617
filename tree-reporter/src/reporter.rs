// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translates engine events into lifecycle operations on the result tree.
//!
//! The main structure in this module is [`Reporter`].

mod events;
mod failure;
mod imp;
mod protocol;

pub use events::{EngineEvent, EngineFailure, EngineTest, TestKey};
pub use imp::Reporter;
pub use protocol::ProtocolVersion;
