// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use service_messages::ServiceMessage;
use tree_reporter::{
    config::ReporterSettings,
    errors::ReportEventError,
    reporter::{EngineEvent, EngineFailure, EngineTest, Reporter},
};

/// The output of a reporter that was fed a sequence of events.
pub(crate) struct RunOutput {
    pub(crate) output: String,
    pub(crate) errors: Vec<ReportEventError>,
}

impl RunOutput {
    /// Parses every output line, panicking if one is not a well-formed service message.
    pub(crate) fn messages(&self) -> Vec<ServiceMessage> {
        self.output
            .lines()
            .map(|line| {
                ServiceMessage::parse(line)
                    .unwrap_or_else(|error| panic!("line {line:?} failed to parse: {error}"))
            })
            .collect()
    }
}

/// Reports events to a fresh reporter, then finishes the run as a host does at end of input.
pub(crate) fn run_events(
    settings: ReporterSettings,
    events: impl IntoIterator<Item = EngineEvent>,
) -> RunOutput {
    let mut reporter = Reporter::new(String::new(), settings);
    for event in events {
        reporter.report(event);
    }
    reporter
        .finish_run()
        .expect("finishing the run succeeds");
    let errors = reporter.take_errors();
    RunOutput {
        output: reporter.into_sink(),
        errors,
    }
}

/// Reports JSON lines to a fresh reporter, then finishes the run.
pub(crate) fn run_lines(settings: ReporterSettings, input: &str) -> RunOutput {
    let mut reporter = Reporter::new(String::new(), settings);
    for (index, line) in input.lines().enumerate() {
        reporter.report_line(index + 1, line);
    }
    reporter
        .finish_run()
        .expect("finishing the run succeeds");
    let errors = reporter.take_errors();
    RunOutput {
        output: reporter.into_sink(),
        errors,
    }
}

pub(crate) fn math_tests() -> [EngineTest; 2] {
    [
        EngineTest::new(1, "adds").with_parents(["Math"]),
        EngineTest::new(2, "subtracts").with_parents(["Math"]),
    ]
}

pub(crate) fn assertion_failure() -> EngineFailure {
    EngineFailure {
        message: Some("expected 1 to equal 2".to_owned()),
        stack: Some(
            "AssertionError: expected 1 to equal 2\n    at Context.<anonymous> (test/math.js:9:12)"
                .to_owned(),
        ),
        actual: Some(serde_json::json!(1)),
        expected: Some(serde_json::json!(2)),
    }
}
