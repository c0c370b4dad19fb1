//! Extraction of per-item judgments from raw LLM text.
//!
//! Models wrap JSON in prose, code fences, or an `{"articles": [...]}`
//! envelope. [`parse_response`] tries a fixed cascade of extraction
//! strategies, each of which is total, and reports [`ParsedResponse::Unparsable`]
//! when none of them yields a JSON array.
//!
//! [`validate_records`] then turns loosely-typed records into [`Judgment`]s,
//! dropping any record whose id cannot address an item in the batch.

use crate::models::Judgment;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

static FENCE_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```\s*json\s*(.*?)```").expect("valid regex"));
static FENCE_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*\n)?(.*?)```").expect("valid regex"));

/// Outcome of running the extraction cascade over one response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Raw judgment records, not yet validated.
    Records(Vec<Value>),
    /// No strategy found a JSON array of records.
    Unparsable,
}

type Strategy = fn(&str) -> Option<Vec<Value>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("whole_response", parse_whole),
    ("code_fence", parse_code_fence),
    ("bracket_span", parse_bracket_span),
    ("brace_object", parse_brace_object),
];

/// Run the extraction cascade; the first strategy that succeeds wins.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let cleaned = raw.trim();
    for (name, strategy) in STRATEGIES {
        if let Some(records) = strategy(cleaned) {
            debug!(strategy = name, records = records.len(), "Parsed classifier response");
            return ParsedResponse::Records(records);
        }
    }
    ParsedResponse::Unparsable
}

/// A top-level array, or an object with an `articles` array.
fn records_from_value(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove("articles") {
            Some(Value::Array(records)) => Some(records),
            _ => None,
        },
        _ => None,
    }
}

fn parse_whole(text: &str) -> Option<Vec<Value>> {
    serde_json::from_str(text).ok().and_then(records_from_value)
}

fn parse_code_fence(text: &str) -> Option<Vec<Value>> {
    if !text.contains("```") {
        return None;
    }
    let captures = FENCE_JSON
        .captures(text)
        .or_else(|| FENCE_ANY.captures(text))?;
    parse_whole(captures.get(1)?.as_str().trim())
}

fn parse_bracket_span(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start >= end {
        return None;
    }
    match serde_json::from_str(&text[start..=end]).ok()? {
        Value::Array(records) => Some(records),
        _ => None,
    }
}

fn parse_brace_object(text: &str) -> Option<Vec<Value>> {
    let start = text.find('{')?;
    let end = matching_brace(text, start)?;
    match serde_json::from_str(&text[start..=end]).ok()? {
        value @ Value::Object(_) => records_from_value(value),
        _ => None,
    }
}

/// Byte offset of the `}` closing the `{` at `open`, skipping braces inside strings.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a record's local id, accepting integers, integral floats, and digit strings.
fn record_id(record: &Value) -> Option<usize> {
    let id = record.get("id").or_else(|| record.get("localId"))?;
    let id = match id {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    usize::try_from(id).ok()
}

fn record_is_duplicate(record: &Value) -> bool {
    match record.get("duplicate") {
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("yes"),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Validated judgments for one batch.
#[derive(Debug, Default, PartialEq)]
pub struct ValidatedJudgments {
    /// One judgment per distinct valid id, ascending by id.
    pub judgments: Vec<Judgment>,
    /// Records skipped for a missing, malformed, or out-of-range id.
    pub invalid: usize,
}

/// Turn raw records into judgments for a batch of `batch_len` items.
///
/// Invalid records are skipped and counted. When an id repeats, the first
/// record for it wins.
pub fn validate_records(records: &[Value], batch_len: usize) -> ValidatedJudgments {
    let mut by_id = BTreeMap::new();
    let mut invalid = 0;

    for record in records {
        match record_id(record).filter(|id| *id < batch_len) {
            Some(local_id) => {
                by_id.entry(local_id).or_insert_with(|| Judgment {
                    local_id,
                    is_duplicate: record_is_duplicate(record),
                });
            }
            None => {
                invalid += 1;
                warn!(record = %record, batch_len, "Skipping judgment with invalid id");
            }
        }
    }

    ValidatedJudgments {
        judgments: by_id.into_values().collect(),
        invalid,
    }
}
