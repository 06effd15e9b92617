// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::events::EngineFailure;
use crate::tree::Comparison;
use tracing::debug;

/// The parts of an [`EngineFailure`] that end up in a finish message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct FailureReport {
    pub(super) message: Option<String>,
    pub(super) details: Option<String>,
    pub(super) comparison: Option<Comparison>,
}

impl FailureReport {
    pub(super) fn new(failure: &EngineFailure) -> Self {
        let (message, details) = split_stack(failure.message.as_deref(), failure.stack.as_deref());
        Self {
            message: Some(message),
            details,
            comparison: comparison(failure),
        }
    }
}

/// Splits a stack trace into the part ending with the message, and the rest.
///
/// Stacks usually start with a header line that includes the message. If the message appears in
/// the stack, everything up to the end of its first occurrence becomes the reported message, and
/// the remainder (less one leading newline) becomes the details.
fn split_stack(message: Option<&str>, stack: Option<&str>) -> (String, Option<String>) {
    let message = message.unwrap_or_default();
    let Some(stack) = stack.filter(|stack| !stack.trim().is_empty()) else {
        return (message.to_owned(), None);
    };
    let Some(index) = stack.find(message) else {
        return (message.to_owned(), None);
    };

    let (head, rest) = stack.split_at(index + message.len());
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    (head.to_owned(), Some(rest.to_owned()))
}

/// Stringifies actual and expected values. Both must be present and stringify successfully.
fn comparison(failure: &EngineFailure) -> Option<Comparison> {
    let (actual, expected) = (failure.actual.as_ref()?, failure.expected.as_ref()?);
    match (
        serde_json::to_string_pretty(actual),
        serde_json::to_string_pretty(expected),
    ) {
        (Ok(actual), Ok(expected)) => Some(Comparison { actual, expected }),
        (Err(error), _) | (_, Err(error)) => {
            debug!("dropping actual/expected values that failed to stringify: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(
        Some("expected 1 to equal 2"),
        Some("AssertionError: expected 1 to equal 2\n    at Context.<anonymous> (test.js:4:12)"),
        "AssertionError: expected 1 to equal 2",
        Some("    at Context.<anonymous> (test.js:4:12)")
        ; "message in stack"
    )]
    #[test_case(
        Some("boom"),
        Some("Error: boom\n\n  at x"),
        "Error: boom",
        Some("\n  at x")
        ; "only one newline stripped"
    )]
    #[test_case(
        Some("boom"),
        Some("Error: something else\n  at x"),
        "boom",
        None
        ; "message not in stack"
    )]
    #[test_case(Some("boom"), Some("  \n "), "boom", None ; "blank stack")]
    #[test_case(Some("boom"), None, "boom", None ; "no stack")]
    #[test_case(None, None, "", None ; "nothing")]
    #[test_case(None, Some("at x\nat y"), "", Some("at x\nat y") ; "no message")]
    fn split(
        message: Option<&str>,
        stack: Option<&str>,
        expected_message: &str,
        expected_details: Option<&str>,
    ) {
        let (message, details) = split_stack(message, stack);
        assert_eq!(message, expected_message);
        assert_eq!(details.as_deref(), expected_details);
    }

    #[test]
    fn comparison_values_are_pretty_printed() {
        let failure = EngineFailure {
            message: Some("deep equal".to_owned()),
            actual: Some(json!({"a": [1, 2]})),
            expected: Some(json!("text")),
            ..Default::default()
        };
        let report = FailureReport::new(&failure);
        assert_eq!(
            report.comparison,
            Some(Comparison {
                actual: indoc! {r#"
                    {
                      "a": [
                        1,
                        2
                      ]
                    }"#}
                .to_owned(),
                expected: r#""text""#.to_owned(),
            })
        );
        assert_eq!(report.message.as_deref(), Some("deep equal"));
        assert_eq!(report.details, None);
    }

    #[test]
    fn comparison_requires_both_values() {
        let failure = EngineFailure {
            actual: Some(serde_json::Value::Null),
            ..Default::default()
        };
        assert_eq!(FailureReport::new(&failure).comparison, None);

        let failure = EngineFailure {
            actual: Some(serde_json::Value::Null),
            expected: Some(json!(0)),
            ..Default::default()
        };
        assert_eq!(
            FailureReport::new(&failure).comparison,
            Some(Comparison {
                actual: "null".to_owned(),
                expected: "0".to_owned(),
            })
        );
    }
}
