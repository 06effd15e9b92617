// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attribute value escaping and list joining.

use crate::errors::UnescapeError;
use std::{borrow::Cow, fmt};

/// The character that introduces an escape sequence in an attribute value.
pub const ESCAPE_CHAR: char = '|';

/// The character that escapes delimiters in [`join_list`].
pub const LIST_ESCAPE_CHAR: char = '\\';

/// Returns the substitute written after [`ESCAPE_CHAR`] for `c`, or `None` if `c` is written as is.
#[inline]
pub const fn escape_substitute(c: char) -> Option<char> {
    match c {
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\u{0085}' => Some('x'),
        '\u{2028}' => Some('l'),
        '\u{2029}' => Some('p'),
        '|' => Some('|'),
        '\'' => Some('\''),
        '[' => Some('['),
        ']' => Some(']'),
        _ => None,
    }
}

#[inline]
const fn unescape_substitute(substitute: char) -> Option<char> {
    match substitute {
        'n' => Some('\n'),
        'r' => Some('\r'),
        'x' => Some('\u{0085}'),
        'l' => Some('\u{2028}'),
        'p' => Some('\u{2029}'),
        '|' => Some('|'),
        '\'' => Some('\''),
        '[' => Some('['),
        ']' => Some(']'),
        _ => None,
    }
}

/// Escapes an attribute value so it can be embedded between single quotes in a service message.
///
/// Values that contain no reserved characters are returned unmodified, without allocating.
pub fn escape_attribute_value(value: &str) -> Cow<'_, str> {
    let Some(start) = value.find(|c| escape_substitute(c).is_some()) else {
        return Cow::Borrowed(value);
    };

    let mut escaped = String::with_capacity(value.len() + 8);
    escaped.push_str(&value[..start]);
    for c in value[start..].chars() {
        match escape_substitute(c) {
            Some(substitute) => {
                escaped.push(ESCAPE_CHAR);
                escaped.push(substitute);
            }
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Reverses [`escape_attribute_value`].
pub fn unescape_attribute_value(value: &str) -> Result<Cow<'_, str>, UnescapeError> {
    if !value.contains(ESCAPE_CHAR) {
        return Ok(Cow::Borrowed(value));
    }

    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c != ESCAPE_CHAR {
            unescaped.push(c);
            continue;
        }
        let Some((_, substitute)) = chars.next() else {
            return Err(UnescapeError::DanglingEscape { offset });
        };
        match unescape_substitute(substitute) {
            Some(original) => unescaped.push(original),
            None => return Err(UnescapeError::UnknownEscape { offset, substitute }),
        }
    }
    Ok(Cow::Owned(unescaped))
}

/// Displays an attribute value escaped, without an intermediate allocation.
#[derive(Clone, Copy, Debug)]
pub struct EscapedValue<'a>(pub &'a str);

impl fmt::Display for EscapedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let mut start = 0;

        for (i, c) in s.char_indices() {
            let Some(substitute) = escape_substitute(c) else {
                continue;
            };
            if start < i {
                f.write_str(&s[start..i])?;
            }
            write!(f, "{ESCAPE_CHAR}{substitute}")?;
            start = i + c.len_utf8();
        }

        if start < s.len() {
            f.write_str(&s[start..])?;
        }
        Ok(())
    }
}

/// Joins `items` with `delimiter`.
///
/// Within each item, occurrences of `delimiter` and of [`LIST_ESCAPE_CHAR`] are preceded by
/// [`LIST_ESCAPE_CHAR`], so that the joined string can be split back into the original items.
pub fn join_list<I>(items: I, delimiter: char) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut joined = String::new();
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            joined.push(delimiter);
        }
        for c in item.as_ref().chars() {
            if c == delimiter || c == LIST_ESCAPE_CHAR {
                joined.push(LIST_ESCAPE_CHAR);
            }
            joined.push(c);
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case("\n", "|n" ; "line feed")]
    #[test_case("\r", "|r" ; "carriage return")]
    #[test_case("\u{0085}", "|x" ; "next line")]
    #[test_case("\u{2028}", "|l" ; "line separator")]
    #[test_case("\u{2029}", "|p" ; "paragraph separator")]
    #[test_case("|", "||" ; "pipe")]
    #[test_case("'", "|'" ; "apostrophe")]
    #[test_case("[", "|[" ; "open bracket")]
    #[test_case("]", "|]" ; "close bracket")]
    #[test_case("it's [a|b]\r\n", "it|'s |[a||b|]|r|n" ; "mixed")]
    #[test_case("tab\tstays", "tab\tstays" ; "other control characters pass through")]
    fn escape_table(input: &str, expected: &str) {
        assert_eq!(escape_attribute_value(input), expected);
        assert_eq!(EscapedValue(input).to_string(), expected);
        assert_eq!(
            unescape_attribute_value(expected).expect("escaped value is valid"),
            input
        );
    }

    #[test]
    fn escape_fast_path_borrows() {
        assert!(matches!(
            escape_attribute_value("plain test name"),
            Cow::Borrowed("plain test name")
        ));
        assert!(matches!(escape_attribute_value("a'b"), Cow::Owned(_)));
    }

    #[test]
    fn unescape_errors() {
        assert_eq!(
            unescape_attribute_value("abc|"),
            Err(UnescapeError::DanglingEscape { offset: 3 })
        );
        assert_eq!(
            unescape_attribute_value("a|qb"),
            Err(UnescapeError::UnknownEscape {
                offset: 1,
                substitute: 'q'
            })
        );
    }

    #[test_case(&[], '.', "" ; "empty list")]
    #[test_case(&["Math"], '.', "Math" ; "single item")]
    #[test_case(&["Math", "adds"], '.', "Math.adds" ; "two items")]
    #[test_case(&["v1.2", "adds"], '.', "v1\\.2.adds" ; "delimiter in item")]
    #[test_case(&["a\\b", "c"], '.', "a\\\\b.c" ; "escape char in item")]
    #[test_case(&["", ""], '/', "/" ; "empty items")]
    fn join_list_cases(items: &[&str], delimiter: char, expected: &str) {
        assert_eq!(join_list(items, delimiter), expected);
    }

    fn arb_plain_string() -> impl Strategy<Value = String> {
        any::<String>().prop_map(|s| {
            s.chars()
                .filter(|c| escape_substitute(*c).is_none())
                .collect()
        })
    }

    fn arb_reserved_heavy_string() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just('\n'),
                Just('\r'),
                Just('\u{0085}'),
                Just('\u{2028}'),
                Just('\u{2029}'),
                Just('|'),
                Just('\''),
                Just('['),
                Just(']'),
                any::<char>(),
            ],
            0..64,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    #[proptest]
    fn escape_is_identity_without_reserved_chars(#[strategy(arb_plain_string())] value: String) {
        prop_assert_eq!(escape_attribute_value(&value), value.as_str());
    }

    #[proptest]
    fn escape_round_trips(#[strategy(arb_reserved_heavy_string())] value: String) {
        let escaped = escape_attribute_value(&value);
        let has_line_break = escaped.contains(['\n', '\r', '\u{0085}', '\u{2028}', '\u{2029}']);
        prop_assert!(!has_line_break, "escaped value {:?} contains a line break", escaped);
        let unescaped = unescape_attribute_value(&escaped).expect("escaped output is valid");
        prop_assert_eq!(unescaped, value.as_str());
    }
}
