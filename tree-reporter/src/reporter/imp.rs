// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    events::{EngineEvent, EngineFailure, EngineTest, TestKey},
    failure::FailureReport,
    protocol::ProtocolVersion,
};
use crate::{
    config::ReporterSettings,
    errors::{DisplayErrorChain, ReportEventError, TreeError},
    sink::MessageSink,
    tree::{NodeId, TestOutcome, TestResult, Tree},
};
use service_messages::{ENTERED_THE_MATRIX, ServiceMessage, TEST_COUNT, join_list};
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Reports engine events to a [`MessageSink`] as a live result tree.
///
/// Events are processed one at a time, in the order the engine emits them. A failure while
/// processing one event never prevents later events from being reported: use
/// [`report`](Self::report) to record failures and keep going, and
/// [`take_errors`](Self::take_errors) to inspect them afterwards.
#[derive(Debug)]
pub struct Reporter<W> {
    settings: ReporterSettings,
    tree: Tree<W>,
    // Present while a run is in progress.
    run: Option<RunState>,
    inert: bool,
    errors: Vec<ReportEventError>,
}

#[derive(Debug, Default)]
struct RunState {
    tests: HashMap<TestKey, NodeId>,
}

impl<W: MessageSink> Reporter<W> {
    /// Creates a new reporter writing to `sink`.
    pub fn new(sink: W, settings: ReporterSettings) -> Self {
        Self {
            settings,
            tree: Tree::new(sink),
            run: None,
            inert: false,
            errors: Vec::new(),
        }
    }

    /// Returns the result tree of the current run. Empty if no run is in progress.
    pub fn tree(&self) -> &Tree<W> {
        &self.tree
    }

    /// Returns true if a run is in progress.
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Returns true if the engine was found to be incompatible, in which case events are ignored.
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Handles an event, recording any error instead of returning it.
    pub fn report(&mut self, event: EngineEvent) {
        if let Err(error) = self.handle(event) {
            self.record_error(error);
        }
    }

    /// Decodes one line of an engine's JSON-lines stream and reports it.
    ///
    /// `line_number` is 1-based and only used for diagnostics. Blank lines are ignored.
    pub fn report_line(&mut self, line_number: usize, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match serde_json::from_str::<EngineEvent>(line) {
            Ok(event) => self.report(event),
            Err(error) => self.record_error(ReportEventError::Decode {
                line: line_number,
                error,
            }),
        }
    }

    /// Handles an event.
    ///
    /// Errors from registering individual tests in a `start` event are recorded rather than
    /// returned, so that one bad entry does not prevent the rest from registering.
    pub fn handle(&mut self, event: EngineEvent) -> Result<(), ReportEventError> {
        if self.inert {
            debug!("ignoring `{}` event: reporter is inert", event.name());
            return Ok(());
        }

        match event {
            EngineEvent::Hello { protocol, engine } => self.check_protocol(&protocol, engine),
            EngineEvent::Start { tests } => self.start_run(tests),
            EngineEvent::Test { test } => {
                let id = self.resolve_test("test", &test)?;
                self.tree.start(id).map_err(|error| tree_error(&test, error))
            }
            EngineEvent::Pass { test } => self.finish_test("pass", test, TestOutcome::Success, None),
            EngineEvent::Pending { test } => {
                self.finish_test("pending", test, TestOutcome::Skipped, None)
            }
            EngineEvent::Fail { test, error } => {
                self.finish_test("fail", test, TestOutcome::Failed, error)
            }
            EngineEvent::Error { test, error } => {
                self.finish_test("error", test, TestOutcome::Error, error)
            }
            EngineEvent::End => {
                if self.run.is_none() {
                    return Err(ReportEventError::NoRunInProgress { event: "end" });
                }
                self.finish_run()
            }
        }
    }

    /// Ends the current run, if any.
    ///
    /// Every node the consumer has been told about is finished, whether or not the engine reported
    /// an outcome for it, and the tree is discarded. Call this when the event stream closes, in
    /// case the engine exited without sending `end`.
    ///
    /// If the reporter went inert during the run, the tree is discarded without writing anything.
    pub fn finish_run(&mut self) -> Result<(), ReportEventError> {
        let Some(run) = self.run.take() else {
            return Ok(());
        };
        if self.inert {
            debug!("discarding run with {} tests: reporter is inert", run.tests.len());
            self.tree.reset();
            return Ok(());
        }

        debug!("ending run with {} tests", run.tests.len());
        let result = self
            .tree
            .finish_if_started(NodeId::ROOT)
            .map_err(|error| ReportEventError::Sweep { error });
        self.tree.reset();
        result
    }

    /// Returns the errors recorded so far, clearing them.
    pub fn take_errors(&mut self) -> Vec<ReportEventError> {
        std::mem::take(&mut self.errors)
    }

    /// Returns the number of errors recorded and not yet taken.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Consumes the reporter, returning the sink.
    pub fn into_sink(self) -> W {
        self.tree.into_sink()
    }

    // ---
    // Helper methods
    // ---

    fn record_error(&mut self, error: ReportEventError) {
        error!("{}", DisplayErrorChain::new(&error));
        self.errors.push(error);
    }

    fn check_protocol(
        &mut self,
        protocol: &str,
        engine: Option<String>,
    ) -> Result<(), ReportEventError> {
        let engine = engine.unwrap_or_else(|| "unknown".to_owned());
        match ProtocolVersion::parse(protocol) {
            Ok(version) => {
                debug!("engine `{engine}` speaks protocol {version}");
                Ok(())
            }
            Err(error) => {
                self.inert = true;
                Err(ReportEventError::UnsupportedProtocol { engine, error })
            }
        }
    }

    fn start_run(&mut self, tests: Option<Vec<EngineTest>>) -> Result<(), ReportEventError> {
        if self.run.is_some() {
            return Err(ReportEventError::RunAlreadyStarted);
        }

        let tests = tests.unwrap_or_else(|| {
            warn!("engine did not provide a test list");
            Vec::new()
        });

        self.tree.reset();
        let preamble = [
            ServiceMessage::new(ENTERED_THE_MATRIX),
            ServiceMessage::new(TEST_COUNT).attr("count", tests.len()),
        ];
        for message in &preamble {
            self.tree
                .write_message(message)
                .map_err(|error| ReportEventError::Preamble { error })?;
        }
        self.run = Some(RunState::default());
        debug!("run started with {} tests", tests.len());

        // Listed tests are always created, so that each suite knows how many children it has
        // to wait for. They are only announced now if registering upfront.
        for test in &tests {
            if let Err(error) = self.add_listed_test(test) {
                self.record_error(error);
            }
        }
        Ok(())
    }

    /// Creates the node for a test listed in the `start` event.
    fn add_listed_test(&mut self, test: &EngineTest) -> Result<NodeId, ReportEventError> {
        let run = self
            .run
            .as_mut()
            .ok_or(ReportEventError::NoRunInProgress { event: "start" })?;
        if run.tests.contains_key(&test.id) {
            return Err(ReportEventError::TestAlreadyAssociated {
                key: test.id,
                title: test.title.clone(),
            });
        }
        create_test_node(&mut self.tree, run, &self.settings, test)
            .map_err(|error| tree_error(test, error))
    }

    /// Returns the node for a test, creating it and its suites if needed.
    fn resolve_test(
        &mut self,
        event: &'static str,
        test: &EngineTest,
    ) -> Result<NodeId, ReportEventError> {
        let run = self
            .run
            .as_mut()
            .ok_or(ReportEventError::NoRunInProgress { event })?;
        if let Some(&id) = run.tests.get(&test.id) {
            return Ok(id);
        }
        create_test_node(&mut self.tree, run, &self.settings, test)
            .map_err(|error| tree_error(test, error))
    }

    fn finish_test(
        &mut self,
        event: &'static str,
        test: EngineTest,
        outcome: TestOutcome,
        failure: Option<EngineFailure>,
    ) -> Result<(), ReportEventError> {
        let id = self.resolve_test(event, &test)?;
        let report = failure
            .as_ref()
            .map(FailureReport::new)
            .unwrap_or_default();
        let result = TestResult::new(outcome)
            .with_duration(test.duration())
            .with_message(report.message)
            .with_details(report.details)
            .with_comparison(report.comparison);

        complete_test(&mut self.tree, id, result).map_err(|error| tree_error(&test, error))
    }
}

/// Starts a test if it isn't running yet, then records its result and finishes it.
fn complete_test<W: MessageSink>(
    tree: &mut Tree<W>,
    id: NodeId,
    result: TestResult,
) -> Result<(), TreeError> {
    tree.start(id)?;
    tree.set_outcome(id, result)?;
    tree.finish(id, true)
}

/// Creates the node for a test under its suites.
///
/// Every node created is registered if the settings ask for upfront registration. Otherwise the
/// nodes stay in `Created` and are announced when they start.
fn create_test_node<W: MessageSink>(
    tree: &mut Tree<W>,
    run: &mut RunState,
    settings: &ReporterSettings,
    test: &EngineTest,
) -> Result<NodeId, TreeError> {
    // Location paths name the node and every suite above it, outermost first.
    let mut path: Vec<&str> = test.suite_path().collect();
    let location_path = |names: &[&str]| settings.location_hints.then(|| join_list(names, '.'));

    let mut cursor = NodeId::ROOT;
    for (depth, &name) in path.iter().enumerate() {
        cursor = match tree.find_child_by_name(cursor, name)? {
            Some(id) => {
                let node = tree.node(id)?;
                if node.as_suite().is_none() {
                    return Err(TreeError::NotASuite {
                        id,
                        name: node.name().to_owned(),
                    });
                }
                id
            }
            None => {
                let id = tree.add_suite_child(
                    cursor,
                    name,
                    Some(settings.suite_node_type.as_str()),
                    location_path(&path[..=depth]),
                )?;
                if settings.register_upfront {
                    tree.register(id)?;
                }
                id
            }
        };
    }

    path.push(&test.title);
    let id = tree.add_test_child(
        cursor,
        test.title.as_str(),
        Some(settings.test_node_type.as_str()),
        location_path(path.as_slice()),
    )?;
    run.tests.insert(test.id, id);
    if settings.register_upfront {
        tree.register(id)?;
    }
    Ok(id)
}

fn tree_error(test: &EngineTest, error: TreeError) -> ReportEventError {
    ReportEventError::Tree {
        key: test.id,
        title: test.title.clone(),
        error,
    }
}
