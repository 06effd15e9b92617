// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use service_messages::{
    TEST_FAILED, TEST_FINISHED, TEST_IGNORED, TEST_STARTED, TEST_SUITE_STARTED,
};
use std::{collections::HashMap, fmt, time::Duration};

/// The identifier of a node within a [`Tree`](super::Tree).
///
/// Identifiers are assigned in creation order, starting at 1. The hidden root is always
/// [`NodeId::ROOT`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    /// The identifier of the hidden root.
    pub const ROOT: Self = Self(0);

    pub(super) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric identifier, as written to `nodeId` attributes.
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(super) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The lifecycle state of a node.
///
/// States only move forward: `Created`, then optionally `Registered`, then `Started`, then
/// `Finished`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum NodeState {
    /// The node exists in the tree but the consumer has not been told about it.
    Created,
    /// The consumer shows the node, but not as running.
    Registered,
    /// The consumer shows the node as running.
    Started,
    /// The node is done; no further messages are written for it.
    Finished,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Registered => write!(f, "registered"),
            Self::Started => write!(f, "started"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A lifecycle operation, used in error messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleOp {
    /// [`Tree::register`](super::Tree::register).
    Register,
    /// [`Tree::start`](super::Tree::start).
    Start,
    /// [`Tree::finish`](super::Tree::finish).
    Finish,
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => write!(f, "register"),
            Self::Start => write!(f, "start"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// A suite or test node in the result tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) parent: Option<NodeId>,
    pub(super) name: String,
    pub(super) node_type: Option<String>,
    pub(super) location_path: Option<String>,
    pub(super) state: NodeState,
    pub(super) kind: NodeKind,
}

impl Node {
    pub(super) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        name: String,
        node_type: Option<String>,
        location_path: Option<String>,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            parent,
            name,
            node_type,
            location_path,
            state: NodeState::Created,
            kind,
        }
    }

    /// Returns this node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the parent suite, or `None` for the hidden root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the classification tag written as `nodeType`, e.g. `suite` or `test`.
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    /// Returns the navigation path used to build `locationHint`.
    pub fn location_path(&self) -> Option<&str> {
        self.location_path.as_deref()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Returns the suite- or test-specific data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the suite data if this is a suite node.
    pub fn as_suite(&self) -> Option<&SuiteData> {
        match &self.kind {
            NodeKind::Suite(data) => Some(data),
            NodeKind::Test(_) => None,
        }
    }

    /// Returns the test data if this is a test node.
    pub fn as_test(&self) -> Option<&TestData> {
        match &self.kind {
            NodeKind::Suite(_) => None,
            NodeKind::Test(data) => Some(data),
        }
    }

    pub(super) fn start_command(&self) -> &'static str {
        match self.kind {
            NodeKind::Suite(_) => TEST_SUITE_STARTED,
            NodeKind::Test(_) => TEST_STARTED,
        }
    }
}

/// Data specific to suite or test nodes.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A suite: a node with children.
    Suite(SuiteData),
    /// A test: a leaf node with an outcome.
    Test(TestData),
}

/// Suite-specific node data.
#[derive(Clone, Debug, Default)]
pub struct SuiteData {
    pub(super) children: Vec<NodeId>,
    pub(super) by_name: HashMap<String, NodeId>,
    pub(super) finished_child_count: usize,
}

impl SuiteData {
    /// Returns the children in the order they were added.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the child most recently added with this name.
    pub fn child_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the number of children that have reported finishing.
    pub fn finished_child_count(&self) -> usize {
        self.finished_child_count
    }
}

/// Test-specific node data.
#[derive(Clone, Debug, Default)]
pub struct TestData {
    pub(super) result: Option<TestResult>,
}

impl TestData {
    /// Returns the recorded result, if the outcome has been set.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }
}

/// The outcome of a single test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestOutcome {
    /// The test passed.
    Success,
    /// The test was not run.
    Skipped,
    /// The test failed an assertion.
    Failed,
    /// The test raised an unexpected error.
    Error,
}

impl TestOutcome {
    /// Returns the command used for the finish message of a test with this outcome.
    pub fn finish_command(self) -> &'static str {
        match self {
            Self::Success => TEST_FINISHED,
            Self::Skipped => TEST_IGNORED,
            Self::Failed | Self::Error => TEST_FAILED,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The result recorded for a test through [`Tree::set_outcome`](super::Tree::set_outcome).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestResult {
    /// The outcome.
    pub outcome: TestOutcome,

    /// The time the test took. Written in whole milliseconds.
    pub duration: Option<Duration>,

    /// A human-readable failure (or skip) message.
    pub message: Option<String>,

    /// Further failure details, typically a stack trace.
    pub details: Option<String>,

    /// The actual and expected values of a failed comparison.
    pub comparison: Option<Comparison>,
}

impl TestResult {
    /// Creates a new result with only an outcome.
    pub fn new(outcome: TestOutcome) -> Self {
        Self {
            outcome,
            duration: None,
            message: None,
            details: None,
            comparison: None,
        }
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the message.
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Sets the details.
    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    /// Sets the actual/expected pair.
    pub fn with_comparison(mut self, comparison: Option<Comparison>) -> Self {
        self.comparison = comparison;
        self
    }
}

/// String forms of the actual and expected values of a failed comparison.
///
/// The two values are always reported together.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comparison {
    /// The value the test produced.
    pub actual: String,
    /// The value the test expected.
    pub expected: String,
}
