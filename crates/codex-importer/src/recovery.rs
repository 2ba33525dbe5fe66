//! Recover a JSON array from imperfect model output
//!
//! The ladder is an ordered list of pure strategies; the first one that
//! yields a JSON array (or object) wins and is reported as the step used.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Candidate `[` positions tried by the bracket scan
const MAX_BRACKET_CANDIDATES: usize = 16;

/// Which rung of the ladder produced the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStep {
    /// The response parsed as-is
    Direct,
    /// Markdown code fences were stripped
    Unfenced,
    /// A truncated array was closed after its last complete element
    TruncatedArray,
    /// A bracketed array was found inside surrounding prose
    BracketScan,
    /// A lone object was found and wrapped in an array
    SingleObject,
}

impl std::fmt::Display for RecoveryStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecoveryStep::Direct => "direct",
            RecoveryStep::Unfenced => "unfenced",
            RecoveryStep::TruncatedArray => "truncated_array",
            RecoveryStep::BracketScan => "bracket_scan",
            RecoveryStep::SingleObject => "single_object",
        };
        f.write_str(name)
    }
}

/// Recovery failure; always soft, scoped to one chunk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// The response held no text
    #[error("empty response from extraction service")]
    EmptyResponse,

    /// No strategy produced a JSON array
    #[error("could not parse a JSON array from the response")]
    NoParseableArray,
}

/// A value recovered from the response, and how
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// An array, or an object from the first two steps
    pub value: Value,

    /// Strategy that succeeded
    pub step: RecoveryStep,
}

/// Input shared by every strategy
struct Attempt<'a> {
    raw: &'a str,
    unfenced: &'a str,
    truncated: bool,
}

type Strategy = fn(&Attempt<'_>) -> Option<Value>;

const LADDER: [(RecoveryStep, Strategy); 5] = [
    (RecoveryStep::Direct, direct),
    (RecoveryStep::Unfenced, unfenced),
    (RecoveryStep::TruncatedArray, truncated_array),
    (RecoveryStep::BracketScan, bracket_scan),
    (RecoveryStep::SingleObject, single_object),
];

/// Run the recovery ladder over a raw response
///
/// `truncated` enables the truncated-array step; it should be set when the
/// service stopped at its output token limit.
pub fn recover(raw: &str, truncated: bool) -> Result<Recovered, RecoveryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecoveryError::EmptyResponse);
    }

    let unfenced = strip_fences(trimmed);
    let attempt = Attempt {
        raw: trimmed,
        unfenced,
        truncated,
    };

    LADDER
        .iter()
        .find_map(|(step, strategy)| {
            strategy(&attempt).map(|value| Recovered { value, step: *step })
        })
        .ok_or(RecoveryError::NoParseableArray)
}

fn direct(attempt: &Attempt<'_>) -> Option<Value> {
    parse_structured(attempt.raw)
}

fn unfenced(attempt: &Attempt<'_>) -> Option<Value> {
    if attempt.unfenced == attempt.raw {
        return None;
    }
    parse_structured(attempt.unfenced)
}

fn truncated_array(attempt: &Attempt<'_>) -> Option<Value> {
    if !attempt.truncated {
        return None;
    }
    let text = attempt.unfenced;
    text.match_indices('[')
        .take(MAX_BRACKET_CANDIDATES)
        .filter(|(start, _)| opens_object_array(&text[*start..]))
        .find_map(|(start, _)| {
            let array = &text[start..];
            let end = last_complete_element_end(array)?;

            let mut candidate = String::with_capacity(end + 1);
            candidate.push_str(&array[..end]);
            candidate.push(']');
            parse_lenient(&candidate).filter(holds_object)
        })
}

/// First bracketed array holding an object; a bare `[]` only when nothing
/// better follows
fn bracket_scan(attempt: &Attempt<'_>) -> Option<Value> {
    let text = attempt.unfenced;
    let mut empty = None;

    for (start, _) in text.match_indices('[').take(MAX_BRACKET_CANDIDATES) {
        let Some(end) = matching_close(text, start) else {
            continue;
        };
        let Some(value) = parse_lenient(&text[start..=end]).filter(Value::is_array) else {
            continue;
        };
        if holds_object(&value) {
            return Some(value);
        }
        if empty.is_none() && value.as_array().is_some_and(Vec::is_empty) {
            empty = Some(value);
        }
    }
    empty
}

fn single_object(attempt: &Attempt<'_>) -> Option<Value> {
    let text = attempt.unfenced;
    let start = text.find('{')?;
    let end = matching_close(text, start)?;
    parse_lenient(&text[start..=end])
        .filter(Value::is_object)
        .map(|object| Value::Array(vec![object]))
}

/// `[` directly followed (after whitespace) by `{`
fn opens_object_array(text: &str) -> bool {
    text[1..].trim_start().starts_with('{')
}

/// An array with at least one object element
fn holds_object(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().any(Value::is_object))
}

/// Parse text, accepting only arrays and objects
fn parse_structured(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| value.is_array() || value.is_object())
}

/// Parse text, retrying once with trailing commas removed
fn parse_lenient(text: &str) -> Option<Value> {
    parse_structured(text).or_else(|| parse_structured(&remove_trailing_commas(text)))
}

/// Content of the first markdown code fence, or the text itself
///
/// A fence with no closing marker (cut off by truncation) runs to the end.
fn strip_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_marker = &text[open + 3..];
    let body = match after_marker.find('\n') {
        Some(newline) => &after_marker[newline + 1..],
        None => after_marker.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// String-aware nesting scanner over JSON-ish text
///
/// Calls `on_close(byte_index, depth_after)` for every closing bracket or
/// brace outside a string; stops when it returns `false`.
fn scan_closings(text: &str, mut on_close: impl FnMut(usize, usize) -> bool) {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if !on_close(i, depth) {
                    return;
                }
            }
            _ => {}
        }
    }
}

/// Byte index of the bracket closing the one opened at `start`
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let mut found = None;
    scan_closings(&text[start..], |i, depth| {
        if depth == 0 {
            found = Some(start + i);
            false
        } else {
            true
        }
    });
    found
}

/// End (exclusive) of the last top-level element of `array` that closed
/// completely; `array` starts at its opening `[`
fn last_complete_element_end(array: &str) -> Option<usize> {
    let mut last = None;
    scan_closings(array, |i, depth| match depth {
        1 => {
            last = Some(i + 1);
            true
        }
        0 => false,
        _ => true,
    });
    last
}

/// Drop commas that directly precede a closing bracket or brace
fn remove_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = text[i + 1..].trim_start().chars().next();
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
