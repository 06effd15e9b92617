// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service messages for node lifecycle transitions.

use super::node::{Node, NodeId, NodeKind, NodeState, TestOutcome};
use crate::errors::TreeError;
use service_messages::{ServiceMessage, TEST_SUITE_FINISHED};

/// The message that introduces a node to the consumer.
pub(super) fn init_message(node: &Node, running: bool) -> ServiceMessage {
    let mut message = ServiceMessage::new(node.start_command())
        .attr("nodeId", node.id)
        .attr("parentNodeId", node.parent.unwrap_or(NodeId::ROOT))
        .attr("name", &node.name)
        .attr("running", running);

    // A location hint is only meaningful together with a node type.
    if let Some(node_type) = &node.node_type {
        message = message.attr("nodeType", node_type);
        if let Some(location_path) = &node.location_path {
            message = message.attr("locationHint", format!("{node_type}://{location_path}"));
        }
    }
    message
}

/// The message that marks a node as running.
pub(super) fn start_message(node: &Node) -> ServiceMessage {
    if node.state == NodeState::Created {
        init_message(node, true)
    } else {
        ServiceMessage::new(node.start_command())
            .attr("nodeId", node.id)
            .attr("running", true)
    }
}

pub(super) fn finish_message(node: &Node) -> Result<ServiceMessage, TreeError> {
    let data = match &node.kind {
        NodeKind::Suite(_) => {
            return Ok(ServiceMessage::new(TEST_SUITE_FINISHED).attr("nodeId", node.id));
        }
        NodeKind::Test(data) => data,
    };
    let result = data.result.as_ref().ok_or_else(|| TreeError::OutcomeNotSet {
        id: node.id,
        name: node.name.clone(),
    })?;

    let (actual, expected) = match &result.comparison {
        Some(comparison) => (Some(&comparison.actual), Some(&comparison.expected)),
        None => (None, None),
    };
    let message = ServiceMessage::new(result.outcome.finish_command())
        .attr("nodeId", node.id)
        .attr_opt("duration", result.duration.map(|d| d.as_millis()))
        .attr_opt("error", (result.outcome == TestOutcome::Error).then_some("yes"))
        .attr_opt("message", result.message.as_ref())
        .attr_opt("details", result.details.as_ref())
        .attr_opt("actual", actual)
        .attr_opt("expected", expected);
    Ok(message)
}
