// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::ParseMessageError,
    escape::{ESCAPE_CHAR, EscapedValue, unescape_attribute_value},
};
use indexmap::IndexMap;
use std::fmt;

/// The text every service message line starts with.
pub const MESSAGE_PREFIX: &str = "##teamcity[";

/// Announces that the test runner speaks the service message protocol.
pub const ENTERED_THE_MATRIX: &str = "enteredTheMatrix";
/// States the total number of tests in the run.
pub const TEST_COUNT: &str = "testCount";
/// Adds a suite node, or marks an already added suite node as running.
pub const TEST_SUITE_STARTED: &str = "testSuiteStarted";
/// Adds a test node, or marks an already added test node as running.
pub const TEST_STARTED: &str = "testStarted";
/// Marks a suite node as finished.
pub const TEST_SUITE_FINISHED: &str = "testSuiteFinished";
/// Marks a test node as passed.
pub const TEST_FINISHED: &str = "testFinished";
/// Marks a test node as skipped.
pub const TEST_IGNORED: &str = "testIgnored";
/// Marks a test node as failed.
pub const TEST_FAILED: &str = "testFailed";

/// A single service message: a command name and its attributes.
///
/// Attributes keep the order they were added in. Rendering through [`Display`](fmt::Display)
/// produces one line (without a trailing newline) with every attribute value escaped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceMessage {
    command: String,
    attributes: IndexMap<String, String>,
}

impl ServiceMessage {
    /// Creates a new message with no attributes.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Adds an attribute, replacing the value of an existing attribute with the same key.
    pub fn attr(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.attributes.insert(key.into(), value.to_string());
        self
    }

    /// Adds an attribute if `value` is `Some`.
    pub fn attr_opt(self, key: impl Into<String>, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// Returns the command name.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the unescaped value of the attribute `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Iterates over the attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Parses a line produced by rendering a `ServiceMessage`.
    ///
    /// A single trailing newline is tolerated.
    pub fn parse(line: &str) -> Result<Self, ParseMessageError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let body = line
            .strip_prefix(MESSAGE_PREFIX)
            .ok_or(ParseMessageError::MissingPrefix)?;
        let body = body
            .strip_suffix(']')
            .ok_or(ParseMessageError::Unterminated)?;

        let (command, mut rest) = match body.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (body, ""),
        };
        if command.is_empty() {
            return Err(ParseMessageError::MissingCommand);
        }

        let mut message = Self::new(command);
        let mut offset = command.len() + 1;
        loop {
            let trimmed = rest.trim_start_matches(' ');
            offset += rest.len() - trimmed.len();
            rest = trimmed;
            if rest.is_empty() {
                break;
            }

            let malformed = ParseMessageError::MalformedAttribute { offset };
            let (key, after_key) = rest.split_once("='").ok_or(malformed.clone())?;
            if key.is_empty() || key.contains(' ') {
                return Err(malformed);
            }
            let value_len = quoted_value_len(after_key).ok_or(malformed)?;
            let raw_value = &after_key[..value_len];
            let value = unescape_attribute_value(raw_value).map_err(|error| {
                ParseMessageError::InvalidValue {
                    key: key.to_owned(),
                    error,
                }
            })?;
            message.attributes.insert(key.to_owned(), value.into_owned());

            let consumed = key.len() + 2 + value_len + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        Ok(message)
    }
}

/// Returns the length of the escaped value preceding the closing quote.
fn quoted_value_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            ESCAPE_CHAR => {
                chars.next();
            }
            '\'' => return Some(i),
            _ => {}
        }
    }
    None
}

impl fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MESSAGE_PREFIX}{}", self.command)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}='{}'", EscapedValue(value))?;
        }
        f.write_str("]")
    }
}
