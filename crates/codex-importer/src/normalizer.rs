//! Parse loosely-shaped model records into codex entry drafts

use crate::config::CategoryPolicy;
use codex_domain::{cleanse_title, Category, CodexEntryDraft, Temporal, TemporalKind};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a record was not turned into a draft
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The record is not a JSON object
    #[error("record is not an object")]
    NotAnObject,

    /// No usable `title` value
    #[error("missing title")]
    MissingTitle,

    /// The title was empty once cleansed
    #[error("title is empty after cleansing")]
    EmptyTitle,

    /// No usable `category` value
    #[error("missing category")]
    MissingCategory,

    /// Category outside the known set, under the strict policy
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Output of normalizing one recovered value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Records that parsed into drafts, in order
    pub entries: Vec<CodexEntryDraft>,

    /// Reasons for every dropped record
    pub rejected: Vec<Rejection>,
}

/// Normalize a recovered array (or single object) into drafts
pub fn normalize(value: Value, policy: CategoryPolicy) -> Normalized {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut normalized = Normalized::default();
    for item in items {
        match normalize_entry(item, policy) {
            Ok(entry) => normalized.entries.push(entry),
            Err(rejection) => normalized.rejected.push(rejection),
        }
    }
    normalized
}

/// Parse one record into a draft
pub fn normalize_entry(item: Value, policy: CategoryPolicy) -> Result<CodexEntryDraft, Rejection> {
    let Value::Object(mut record) = item else {
        return Err(Rejection::NotAnObject);
    };

    let raw_title = required_text(&record, "title").ok_or(Rejection::MissingTitle)?;
    let title = cleanse_title(&raw_title);
    if title.is_empty() {
        return Err(Rejection::EmptyTitle);
    }

    let label = required_text(&record, "category")
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .ok_or(Rejection::MissingCategory)?;
    let category = match (Category::parse(&label), policy) {
        (Some(category), _) => category,
        (None, CategoryPolicy::Lenient) => Category::Other(label),
        (None, CategoryPolicy::Strict) => return Err(Rejection::UnknownCategory(label)),
    };

    let fields = match record.remove("fields") {
        Some(Value::Object(fields)) => fields,
        _ => Map::new(),
    };

    Ok(CodexEntryDraft {
        title,
        category,
        summary: optional_text(&record, "summary"),
        fields,
        body: optional_text(&record, "body"),
        tags: record.get("tags").map(tags).unwrap_or_default(),
        temporal: record.get("temporal").and_then(temporal),
    })
}

/// Text form of scalar values; `null` becomes empty
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn required_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => as_text(value),
    }
}

fn optional_text(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(as_text)
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Tags from an array of scalars or one comma-separated string
fn tags(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .filter_map(as_text)
            .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Timeline placement; `None` unless an object with a known `type`
fn temporal(value: &Value) -> Option<Temporal> {
    let object = value.as_object()?;
    let kind = object.get("type")?.as_str().and_then(TemporalKind::parse)?;
    let year = |key: &str| object.get(key).and_then(as_year);

    Some(Temporal {
        kind,
        active_start: year("active_start"),
        active_end: year("active_end"),
        birth_year: year("birth_year"),
        death_year: year("death_year"),
    })
}

/// Year from an integer, an integral float, or a numeric string
fn as_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
