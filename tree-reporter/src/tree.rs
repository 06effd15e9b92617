// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The result tree: suites and tests, each with a lifecycle state machine.
//!
//! Every state transition writes one service message to the tree's [`MessageSink`]. Two rules
//! keep the consumer's view consistent regardless of the order in which events arrive:
//!
//! * Starting a node first starts every ancestor that is not yet running, outermost first.
//! * Finishing a node with `cascade` set counts it against its parent suite, and the suite
//!   finishes itself once every child has finished.
//!
//! The hidden root (id 0) owns the top-level suites. It never produces messages itself.

mod node;
mod render;

pub use node::{
    Comparison, LifecycleOp, Node, NodeId, NodeKind, NodeState, SuiteData, TestData, TestOutcome,
    TestResult,
};

use crate::{errors::TreeError, sink::MessageSink};
use debug_ignore::DebugIgnore;
use service_messages::ServiceMessage;
use tracing::debug;

/// The display name of the hidden root.
pub const HIDDEN_ROOT_NAME: &str = "hidden root";

/// A tree of suite and test nodes that reports lifecycle transitions to a sink.
#[derive(Debug)]
pub struct Tree<W> {
    sink: DebugIgnore<W>,
    // Indexed by node id: ids are handed out densely, in creation order.
    nodes: Vec<Node>,
    next_id: u32,
}

impl<W: MessageSink> Tree<W> {
    /// Creates a new tree containing only the hidden root.
    pub fn new(sink: W) -> Self {
        let root = Node::new(
            NodeId::ROOT,
            None,
            HIDDEN_ROOT_NAME.to_owned(),
            None,
            None,
            NodeKind::Suite(SuiteData::default()),
        );
        Self {
            sink: DebugIgnore(sink),
            nodes: vec![root],
            next_id: 1,
        }
    }

    /// Returns the hidden root.
    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes
            .get(id.index())
            .ok_or(TreeError::UnknownNode { id })
    }

    /// Returns the lifecycle state of a node.
    pub fn state(&self, id: NodeId) -> Result<NodeState, TreeError> {
        Ok(self.node(id)?.state)
    }

    /// Returns the children of a suite, in the order they were added.
    pub fn children(&self, suite: NodeId) -> Result<&[NodeId], TreeError> {
        let node = self.node(suite)?;
        node.as_suite()
            .map(SuiteData::children)
            .ok_or_else(|| not_a_suite(node))
    }

    /// Returns the outcome recorded for a test, if any.
    pub fn outcome(&self, test: NodeId) -> Result<Option<TestOutcome>, TreeError> {
        let node = self.node(test)?;
        match &node.kind {
            NodeKind::Test(data) => Ok(data.result.as_ref().map(|result| result.outcome)),
            NodeKind::Suite(_) => Err(TreeError::NotATest {
                id: test,
                name: node.name.clone(),
            }),
        }
    }

    /// Iterates over all nodes except the hidden root, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().skip(1)
    }

    /// Returns the id the next created node will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId::new(self.next_id)
    }

    /// Removes every node except the hidden root, and restarts id allocation at 1.
    pub fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NodeId::ROOT.index()].kind = NodeKind::Suite(SuiteData::default());
        self.next_id = 1;
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Consumes the tree, returning the sink.
    pub fn into_sink(self) -> W {
        self.sink.0
    }

    /// Writes a message that is not tied to a node, such as the run preamble.
    pub fn write_message(&mut self, message: &ServiceMessage) -> Result<(), TreeError> {
        self.write_text(&message.to_string(), true)
    }

    /// Writes raw text to the sink.
    pub fn write_text(&mut self, text: &str, append_newline: bool) -> Result<(), TreeError> {
        self.sink
            .write_text(text, append_newline)
            .map_err(|error| TreeError::Write { error })
    }

    /// Looks up a direct child of `suite` by display name.
    pub fn find_child_by_name(
        &self,
        suite: NodeId,
        name: &str,
    ) -> Result<Option<NodeId>, TreeError> {
        let node = self.node(suite)?;
        match &node.kind {
            NodeKind::Suite(data) => Ok(data.child_by_name(name)),
            NodeKind::Test(_) => Err(not_a_suite(node)),
        }
    }

    /// Adds a suite node under `parent`, in the `Created` state.
    ///
    /// Callers are expected to check [`find_child_by_name`](Self::find_child_by_name) first: adding
    /// a second child with the same name makes name lookups return the newer child.
    pub fn add_suite_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        node_type: Option<&str>,
        location_path: Option<String>,
    ) -> Result<NodeId, TreeError> {
        self.add_child(
            parent,
            name.into(),
            node_type,
            location_path,
            NodeKind::Suite(SuiteData::default()),
        )
    }

    /// Adds a test node under `parent`, in the `Created` state.
    pub fn add_test_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        node_type: Option<&str>,
        location_path: Option<String>,
    ) -> Result<NodeId, TreeError> {
        self.add_child(
            parent,
            name.into(),
            node_type,
            location_path,
            NodeKind::Test(TestData::default()),
        )
    }

    /// Shows the node to the consumer without marking it as running.
    ///
    /// Only legal from `Created`.
    pub fn register(&mut self, id: NodeId) -> Result<(), TreeError> {
        check_not_root(id, LifecycleOp::Register)?;
        let node = self.node(id)?;
        if node.state != NodeState::Created {
            return Err(unexpected_state(node, LifecycleOp::Register));
        }

        let message = render::init_message(node, false);
        self.write_message(&message)?;
        self.set_state(id, NodeState::Registered);
        Ok(())
    }

    /// Marks the node, and every ancestor that is not running yet, as running.
    ///
    /// Starting a node that is already running does nothing. Starting a finished node fails.
    pub fn start(&mut self, id: NodeId) -> Result<(), TreeError> {
        check_not_root(id, LifecycleOp::Start)?;

        // Walk up to the nearest running ancestor, collecting every node that still needs a
        // start message.
        let mut pending = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor.filter(|&current| current != NodeId::ROOT) {
            let node = self.node(current)?;
            match node.state {
                NodeState::Started => break,
                NodeState::Finished => return Err(unexpected_state(node, LifecycleOp::Start)),
                NodeState::Created | NodeState::Registered => pending.push(current),
            }
            cursor = node.parent;
        }

        for current in pending.into_iter().rev() {
            let message = render::start_message(self.node(current)?);
            self.write_message(&message)?;
            self.set_state(current, NodeState::Started);
        }
        Ok(())
    }

    /// Marks the node as finished.
    ///
    /// Only legal from `Registered` or `Started`; a test must have its outcome set first. If
    /// `cascade` is true, the parent suite is notified, and finishes itself once this was its last
    /// unfinished child.
    pub fn finish(&mut self, id: NodeId, cascade: bool) -> Result<(), TreeError> {
        let mut current = id;
        loop {
            let parent = self.finish_one(current)?;
            if !cascade {
                return Ok(());
            }
            let Some(parent) = parent.filter(|&parent| parent != NodeId::ROOT) else {
                return Ok(());
            };
            if !self.on_child_finished(parent)? {
                return Ok(());
            }
            current = parent;
        }
    }

    /// Finishes this node and all of its unfinished descendants, children first.
    ///
    /// This reconciles runs that ended while nodes were still in flight. Parents are not notified,
    /// so no suite finishes twice. Called on the hidden root, sweeps every top-level node.
    ///
    /// A test without an outcome is given one: `Error` if it was running, `Skipped` if it was only
    /// registered. Nodes still in `Created` were never shown to the consumer and are left as is,
    /// though their descendants are still swept.
    pub fn finish_if_started(&mut self, id: NodeId) -> Result<(), TreeError> {
        // Post-order walk: a node is visited once to queue its children, and again to finish it.
        let mut stack = vec![(id, false)];
        while let Some((current, children_done)) = stack.pop() {
            let node = self.node(current)?;
            if node.state == NodeState::Finished {
                continue;
            }
            if !children_done {
                stack.push((current, true));
                if let NodeKind::Suite(data) = &node.kind {
                    stack.extend(data.children.iter().rev().map(|&child| (child, false)));
                }
                continue;
            }

            if current == NodeId::ROOT || node.state == NodeState::Created {
                continue;
            }
            if let NodeKind::Test(data) = &node.kind
                && data.result.is_none()
            {
                let result = unfinished_test_result(node);
                debug!(
                    "test {current} (`{}`) had no outcome at end of run: {}",
                    node.name, result.outcome
                );
                self.set_outcome(current, result)?;
            }
            self.finish_one(current)?;
        }
        Ok(())
    }

    /// Records the outcome of a test. May only be called once per test.
    ///
    /// A skipped test without a message is given the message `Pending test '<name>'`.
    pub fn set_outcome(&mut self, id: NodeId, mut result: TestResult) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        let Node { name, kind, .. } = node;
        let NodeKind::Test(data) = kind else {
            return Err(TreeError::NotATest {
                id,
                name: name.clone(),
            });
        };
        if let Some(existing) = &data.result {
            return Err(TreeError::OutcomeAlreadySet {
                id,
                name: name.clone(),
                existing: existing.outcome,
            });
        }

        if result.outcome == TestOutcome::Skipped
            && result.message.as_deref().is_none_or(str::is_empty)
        {
            result.message = Some(format!("Pending test '{name}'"));
        }
        data.result = Some(result);
        Ok(())
    }

    // ---
    // Helper methods
    // ---

    fn add_child(
        &mut self,
        parent: NodeId,
        name: String,
        node_type: Option<&str>,
        location_path: Option<String>,
        kind: NodeKind,
    ) -> Result<NodeId, TreeError> {
        let parent_node = self.node(parent)?;
        if parent_node.as_suite().is_none() {
            return Err(not_a_suite(parent_node));
        }
        if parent != NodeId::ROOT && parent_node.state == NodeState::Finished {
            return Err(TreeError::FinishedSuite {
                id: parent,
                name: parent_node.name.clone(),
                child: name,
            });
        }

        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        debug_assert_eq!(id.index(), self.nodes.len(), "node ids are dense");

        self.nodes.push(Node::new(
            id,
            Some(parent),
            name.clone(),
            node_type.map(str::to_owned),
            location_path,
            kind,
        ));
        if let NodeKind::Suite(data) = &mut self.nodes[parent.index()].kind {
            data.children.push(id);
            data.by_name.insert(name, id);
        }
        Ok(id)
    }

    /// Finishes a single node without notifying its parent, returning the parent.
    fn finish_one(&mut self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        check_not_root(id, LifecycleOp::Finish)?;
        let node = self.node(id)?;
        if !matches!(node.state, NodeState::Registered | NodeState::Started) {
            return Err(unexpected_state(node, LifecycleOp::Finish));
        }

        let message = render::finish_message(node)?;
        let parent = node.parent;
        self.write_message(&message)?;
        self.set_state(id, NodeState::Finished);
        Ok(parent)
    }

    /// Counts a finished child against `suite`. Returns true if the suite should now finish.
    fn on_child_finished(&mut self, suite: NodeId) -> Result<bool, TreeError> {
        let node = self.node(suite)?;
        if node.as_suite().is_none() {
            return Err(not_a_suite(node));
        }

        let node = self.node_mut(suite)?;
        let state = node.state;
        let mut all_finished = false;
        if let NodeKind::Suite(data) = &mut node.kind {
            data.finished_child_count += 1;
            all_finished = data.finished_child_count == data.children.len();
        }

        // A suite still in `Created` was never announced, so it is left for the sweep.
        Ok(all_finished && matches!(state, NodeState::Registered | NodeState::Started))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(TreeError::UnknownNode { id })
    }

    fn set_state(&mut self, id: NodeId, state: NodeState) {
        // Callers have already looked the node up.
        if let Some(node) = self.nodes.get_mut(id.index()) {
            debug!("node {id} (`{}`): {} -> {state}", node.name, node.state);
            node.state = state;
        }
    }
}

/// The message reported for a test that was running when the run ended.
fn unfinished_test_result(node: &Node) -> TestResult {
    if node.state == NodeState::Started {
        TestResult::new(TestOutcome::Error).with_message(Some(format!(
            "Test '{}' did not finish before the run ended",
            node.name
        )))
    } else {
        TestResult::new(TestOutcome::Skipped)
    }
}

fn check_not_root(id: NodeId, operation: LifecycleOp) -> Result<(), TreeError> {
    if id == NodeId::ROOT {
        Err(TreeError::HiddenRoot { operation })
    } else {
        Ok(())
    }
}

fn unexpected_state(node: &Node, operation: LifecycleOp) -> TreeError {
    TreeError::UnexpectedState {
        id: node.id,
        name: node.name.clone(),
        state: node.state,
        operation,
    }
}

fn not_a_suite(node: &Node) -> TreeError {
    TreeError::NotASuite {
        id: node.id,
        name: node.name.clone(),
    }
}
