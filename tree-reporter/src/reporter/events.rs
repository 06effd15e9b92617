// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by a test engine, in the form the reporter consumes them.
//!
//! Engines write one JSON object per line, tagged by the `event` field:
//!
//! ```json
//! {"event":"hello","protocol":"1.0","engine":"mocha"}
//! {"event":"start","tests":[{"id":1,"title":"adds","parents":["Math"]}]}
//! {"event":"test","test":{"id":1,"title":"adds","parents":["Math"]}}
//! {"event":"pass","test":{"id":1,"title":"adds","parents":["Math"],"duration":5}}
//! {"event":"end"}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, time::Duration};

/// A stable identifier the engine assigns to each test.
///
/// The same key must be used for every event concerning one test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TestKey(u64);

impl TestKey {
    /// Creates a new key.
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the numeric key.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single event in an engine's event stream.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// The engine introduces itself. Sent before `start`, if at all.
    Hello {
        /// The event protocol version the engine speaks, as `<major>.<minor>`.
        protocol: String,
        /// The engine's name, for diagnostics.
        #[serde(default)]
        engine: Option<String>,
    },

    /// A run began.
    Start {
        /// Every test the run will execute, if the engine knows them upfront.
        #[serde(default)]
        tests: Option<Vec<EngineTest>>,
    },

    /// A test began executing.
    Test {
        /// The test.
        test: EngineTest,
    },

    /// A test passed.
    Pass {
        /// The test.
        test: EngineTest,
    },

    /// A test was skipped.
    Pending {
        /// The test.
        test: EngineTest,
    },

    /// A test failed an assertion.
    Fail {
        /// The test.
        test: EngineTest,
        /// What went wrong.
        #[serde(default)]
        error: Option<EngineFailure>,
    },

    /// A test raised an error other than an assertion failure.
    Error {
        /// The test.
        test: EngineTest,
        /// What went wrong.
        #[serde(default)]
        error: Option<EngineFailure>,
    },

    /// The run ended.
    End,
}

impl EngineEvent {
    /// Returns the name of the event, as written in the `event` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Start { .. } => "start",
            Self::Test { .. } => "test",
            Self::Pass { .. } => "pass",
            Self::Pending { .. } => "pending",
            Self::Fail { .. } => "fail",
            Self::Error { .. } => "error",
            Self::End => "end",
        }
    }
}

/// A test, as described by the engine.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct EngineTest {
    /// The engine's stable key for this test.
    pub id: TestKey,

    /// The test's own title.
    pub title: String,

    /// Titles of the enclosing suites, innermost first.
    #[serde(default)]
    pub parents: Vec<String>,

    /// How long the test took, in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

impl EngineTest {
    /// Creates a new test with no parents and no duration.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: TestKey::new(id),
            title: title.into(),
            parents: Vec::new(),
            duration: None,
        }
    }

    /// Sets the enclosing suites, innermost first.
    pub fn with_parents<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the duration in milliseconds.
    pub fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }

    /// Returns the enclosing suites, outermost first.
    pub fn suite_path(&self) -> impl Iterator<Item = &str> {
        self.parents.iter().rev().map(String::as_str)
    }

    pub(super) fn duration(&self) -> Option<Duration> {
        self.duration.map(Duration::from_millis)
    }
}

/// A failure, as described by the engine.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EngineFailure {
    /// The failure message.
    #[serde(default)]
    pub message: Option<String>,

    /// The stack trace. Usually starts with the message.
    #[serde(default)]
    pub stack: Option<String>,

    /// The value a failed comparison produced. `null` is a value.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub actual: Option<serde_json::Value>,

    /// The value a failed comparison expected. `null` is a value.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub expected: Option<serde_json::Value>,
}

/// Deserializes a field that, if present at all, is `Some` even when `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}
