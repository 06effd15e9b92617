// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use service_messages::{
    TEST_FAILED, TEST_FINISHED, TEST_IGNORED, TEST_STARTED, TEST_SUITE_FINISHED,
    TEST_SUITE_STARTED,
};
use test_case::test_case;
use tree_reporter::{
    config::ReporterSettings,
    errors::ReportEventError,
    reporter::{EngineEvent, EngineTest},
};

#[test]
fn math_suite_with_upfront_registration() {
    let [adds, subtracts] = math_tests();
    let run = run_events(
        ReporterSettings::default(),
        [
            EngineEvent::Start {
                tests: Some(vec![adds.clone(), subtracts.clone()]),
            },
            EngineEvent::Test { test: adds.clone() },
            EngineEvent::Pass {
                test: adds.with_duration(5),
            },
            EngineEvent::Test {
                test: subtracts.clone(),
            },
            EngineEvent::Fail {
                test: subtracts.with_duration(2),
                error: Some(assertion_failure()),
            },
            EngineEvent::End,
        ],
    );

    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);
    assert_eq!(
        run.output,
        indoc! {"
            ##teamcity[enteredTheMatrix]
            ##teamcity[testCount count='2']
            ##teamcity[testSuiteStarted nodeId='1' parentNodeId='0' name='Math' running='false' nodeType='suite' locationHint='suite://Math']
            ##teamcity[testStarted nodeId='2' parentNodeId='1' name='adds' running='false' nodeType='test' locationHint='test://Math.adds']
            ##teamcity[testStarted nodeId='3' parentNodeId='1' name='subtracts' running='false' nodeType='test' locationHint='test://Math.subtracts']
            ##teamcity[testSuiteStarted nodeId='1' running='true']
            ##teamcity[testStarted nodeId='2' running='true']
            ##teamcity[testFinished nodeId='2' duration='5']
            ##teamcity[testStarted nodeId='3' running='true']
            ##teamcity[testFailed nodeId='3' duration='2' message='AssertionError: expected 1 to equal 2' details='    at Context.<anonymous> (test/math.js:9:12)' actual='1' expected='2']
            ##teamcity[testSuiteFinished nodeId='1']
        "}
    );
}

#[test]
fn math_suite_with_lazy_registration() {
    let [adds, subtracts] = math_tests();
    let settings = ReporterSettings {
        register_upfront: false,
        ..Default::default()
    };
    // No `test` events: terminal events start the test themselves. Nodes are announced as they
    // start, and the suite only finishes after its last listed test.
    let run = run_events(
        settings,
        [
            EngineEvent::Start {
                tests: Some(vec![adds.clone(), subtracts.clone()]),
            },
            EngineEvent::Pass {
                test: adds.with_duration(5),
            },
            EngineEvent::Fail {
                test: subtracts,
                error: Some(assertion_failure()),
            },
            EngineEvent::End,
        ],
    );
    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);

    // Check the order of lifecycle events by command and name.
    let messages = run.messages();
    let names = name_by_node_id(&messages);
    let events: Vec<_> = messages
        .iter()
        .skip(2)
        .map(|message| {
            let node_id = message.attribute("nodeId").expect("nodeId is always present");
            let running = message.attribute("running").unwrap_or("-");
            (message.command(), names[node_id].as_str(), running)
        })
        .collect();
    assert_eq!(
        events,
        [
            (TEST_SUITE_STARTED, "Math", "true"),
            (TEST_STARTED, "adds", "true"),
            (TEST_FINISHED, "adds", "-"),
            (TEST_STARTED, "subtracts", "true"),
            (TEST_FAILED, "subtracts", "-"),
            (TEST_SUITE_FINISHED, "Math", "-"),
        ]
    );
}

fn name_by_node_id(
    messages: &[service_messages::ServiceMessage],
) -> std::collections::HashMap<String, String> {
    messages
        .iter()
        .filter_map(|message| Some((message.attribute("nodeId")?, message.attribute("name")?)))
        .map(|(id, name)| (id.to_owned(), name.to_owned()))
        .collect()
}

#[test]
fn reserved_characters_in_titles_are_escaped() {
    let title = "it's a |pipe|\nand [brackets]";
    let test = EngineTest::new(1, title);
    let run = run_events(
        ReporterSettings::default(),
        [
            EngineEvent::Start {
                tests: Some(vec![test.clone()]),
            },
            EngineEvent::Pass { test },
            EngineEvent::End,
        ],
    );

    assert_eq!(run.output.lines().count(), 5, "one message per line");
    assert!(
        run.output
            .lines()
            .all(|line| line.starts_with("##teamcity[") && line.ends_with(']')),
        "every line is a complete message:\n{}",
        run.output
    );
    assert!(run.output.contains(
        "name='it|'s a ||pipe|||nand |[brackets|]' running='false' nodeType='test' \
         locationHint='test://it|'s a ||pipe|||nand |[brackets|]'"
    ));

    let messages = run.messages();
    assert_eq!(messages[2].attribute("name"), Some(title));
}

#[test]
fn end_sweeps_unfinished_tests() {
    let tests = [
        EngineTest::new(1, "runs").with_parents(["S"]),
        EngineTest::new(2, "never runs").with_parents(["S"]),
        EngineTest::new(3, "hangs").with_parents(["S"]),
    ];
    let run = run_events(
        ReporterSettings::default(),
        [
            EngineEvent::Start {
                tests: Some(tests.to_vec()),
            },
            EngineEvent::Pass {
                test: tests[0].clone(),
            },
            EngineEvent::Test {
                test: tests[2].clone(),
            },
            EngineEvent::End,
        ],
    );

    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);
    let tail: Vec<_> = run.output.lines().rev().take(3).collect();
    assert_eq!(
        tail,
        [
            "##teamcity[testSuiteFinished nodeId='1']",
            "##teamcity[testFailed nodeId='4' error='yes' message='Test |'hangs|' did not finish before the run ended']",
            "##teamcity[testIgnored nodeId='3' message='Pending test |'never runs|'']",
        ]
    );
}

#[test_case(true ; "with end event")]
#[test_case(false ; "stream closed early")]
fn every_registered_node_finishes(send_end: bool) {
    let tests: Vec<_> = (1..=4)
        .map(|id| EngineTest::new(id, format!("t{id}")).with_parents(["inner", "outer"]))
        .chain([EngineTest::new(5, "top")])
        .collect();
    let mut events = vec![
        EngineEvent::Start {
            tests: Some(tests.clone()),
        },
        EngineEvent::Test {
            test: tests[1].clone(),
        },
        EngineEvent::Error {
            test: tests[2].clone(),
            error: None,
        },
    ];
    if send_end {
        events.push(EngineEvent::End);
    }
    let run = run_events(ReporterSettings::default(), events);
    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);

    let messages = run.messages();
    let started: Vec<_> = messages
        .iter()
        .filter(|message| message.attribute("parentNodeId").is_some())
        .filter_map(|message| message.attribute("nodeId"))
        .collect();
    let finished: Vec<_> = messages
        .iter()
        .filter(|message| {
            [TEST_SUITE_FINISHED, TEST_FINISHED, TEST_IGNORED, TEST_FAILED]
                .contains(&message.command())
        })
        .filter_map(|message| message.attribute("nodeId"))
        .collect();

    assert_eq!(started.len(), 7, "2 suites and 5 tests were introduced");
    for id in &started {
        let count = finished.iter().filter(|finished| *finished == id).count();
        assert_eq!(count, 1, "node {id} finished exactly once");
    }
}

#[test]
fn malformed_lines_do_not_stop_the_report() {
    let run = run_lines(
        ReporterSettings::default(),
        indoc! {r#"
            {"event":"hello","protocol":"1.0","engine":"mocha"}
            {"event":"start","tests":[{"id":1,"title":"a"},{"id":2,"title":"b"}]}
            {"event":"pass","test":{"id":1,"title":"a","duration":1}}
            {"event":"pass","test":{"title":"b"}}

            {"event":"fail","test":{"id":2,"title":"b"},"error":{"message":"x","actual":null,"expected":false}}
            {"event":"end"}
        "#},
    );

    assert_eq!(run.errors.len(), 1, "errors: {:?}", run.errors);
    assert!(matches!(
        run.errors[0],
        ReportEventError::Decode { line: 4, .. }
    ));
    assert!(run.output.ends_with(indoc! {"
        ##teamcity[testFinished nodeId='1' duration='1']
        ##teamcity[testStarted nodeId='2' running='true']
        ##teamcity[testFailed nodeId='2' message='x' actual='null' expected='false']
    "}));
}

#[test]
fn unsupported_engine_produces_no_output() {
    let run = run_lines(
        ReporterSettings::default(),
        indoc! {r#"
            {"event":"hello","protocol":"7.0","engine":"future"}
            {"event":"start","tests":[{"id":1,"title":"a"}]}
            {"event":"pass","test":{"id":1,"title":"a"}}
            {"event":"end"}
        "#},
    );
    assert_eq!(run.output, "");
    assert_eq!(run.errors.len(), 1, "reported once: {:?}", run.errors);
    assert!(matches!(
        run.errors[0],
        ReportEventError::UnsupportedProtocol { .. }
    ));
}

#[test]
fn lazy_registration_reports_every_sibling() {
    let tests: Vec<_> = ["first", "second", "third", "skipped"]
        .into_iter()
        .zip(1..)
        .map(|(title, id)| EngineTest::new(id, title).with_parents(["Suite"]))
        .collect();
    let settings = ReporterSettings {
        location_hints: false,
        register_upfront: false,
        ..Default::default()
    };
    let run = run_events(
        settings,
        [
            EngineEvent::Start {
                tests: Some(tests.clone()),
            },
            EngineEvent::Pass {
                test: tests[0].clone(),
            },
            EngineEvent::Fail {
                test: tests[1].clone(),
                error: None,
            },
            EngineEvent::Pending {
                test: tests[2].clone(),
            },
            EngineEvent::End,
        ],
    );

    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);
    assert_eq!(
        run.output,
        indoc! {"
            ##teamcity[enteredTheMatrix]
            ##teamcity[testCount count='4']
            ##teamcity[testSuiteStarted nodeId='1' parentNodeId='0' name='Suite' running='true' nodeType='suite']
            ##teamcity[testStarted nodeId='2' parentNodeId='1' name='first' running='true' nodeType='test']
            ##teamcity[testFinished nodeId='2']
            ##teamcity[testStarted nodeId='3' parentNodeId='1' name='second' running='true' nodeType='test']
            ##teamcity[testFailed nodeId='3']
            ##teamcity[testStarted nodeId='4' parentNodeId='1' name='third' running='true' nodeType='test']
            ##teamcity[testIgnored nodeId='4' message='Pending test |'third|'']
            ##teamcity[testSuiteFinished nodeId='1']
        "}
    );
}

#[test_case(true ; "test passes")]
#[test_case(false ; "run ends while test is running")]
fn deeply_nested_suites(passes: bool) {
    let depth = 20_000;
    let test = EngineTest::new(1, "leaf").with_parents((0..depth).map(|level| format!("s{level}")));
    let settings = ReporterSettings {
        location_hints: false,
        ..Default::default()
    };
    let mut events = vec![
        EngineEvent::Start {
            tests: Some(vec![test.clone()]),
        },
        EngineEvent::Test { test: test.clone() },
    ];
    if passes {
        events.push(EngineEvent::Pass { test });
    }
    events.push(EngineEvent::End);
    let run = run_events(settings, events);

    assert!(run.errors.is_empty(), "no errors: {:?}", run.errors);
    // Preamble, then init, start and finish messages for every suite and the test.
    assert_eq!(run.output.lines().count(), 2 + 3 * (depth + 1));
    assert_eq!(
        run.output.lines().last(),
        Some("##teamcity[testSuiteFinished nodeId='1']")
    );
}
