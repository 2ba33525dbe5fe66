//! Entry module - the draft record produced by an import

use crate::category::Category;
use crate::temporal::Temporal;
use crate::title::title_key;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// `@snake_case_identifier` not preceded by a word character (skips emails)
static CROSS_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w@])@([a-z][a-z0-9]*(?:_[a-z0-9]+)*)").expect("valid reference regex")
});

/// A codex entry extracted from source text, not yet persisted
///
/// Drafts have no identity beyond their title. The persistence layer
/// assigns ids and timestamps once the caller stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodexEntryDraft {
    /// Display title, cleansed of markup
    pub title: String,

    /// Entry kind
    pub category: Category,

    /// One or two sentence summary, may be empty
    #[serde(default)]
    pub summary: String,

    /// Category-specific attributes; unrecognised keys pass through
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Long-form text, may contain `@snake_case` cross-references
    #[serde(default)]
    pub body: String,

    /// Ordered free-text labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// Timeline placement, if known
    #[serde(default)]
    pub temporal: Option<Temporal>,
}

impl CodexEntryDraft {
    /// Create a draft with only the required fields set
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            summary: String::new(),
            fields: Map::new(),
            body: String::new(),
            tags: Vec::new(),
            temporal: None,
        }
    }

    /// Lowercase snake-case key of the title, for advisory matching
    pub fn title_key(&self) -> String {
        title_key(&self.title)
    }

    /// Field names set on this draft that the category template does not list
    pub fn extra_fields(&self) -> Vec<&str> {
        let template = self.category.field_template();
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|key| !template.iter().any(|known| known == key))
            .collect()
    }

    /// Identifiers referenced from the body via `@identifier`, in order of
    /// first appearance
    ///
    /// # Examples
    ///
    /// ```
    /// use codex_domain::{Category, CodexEntryDraft};
    ///
    /// let mut draft = CodexEntryDraft::new("The Alduinari", Category::Race);
    /// draft.body = "Shaped by @the_sunfather, rivals of @vel_shari.".to_string();
    /// assert_eq!(draft.cross_references(), vec!["the_sunfather", "vel_shari"]);
    /// ```
    pub fn cross_references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        for captures in CROSS_REFERENCE.captures_iter(&self.body) {
            if let Some(m) = captures.get(1) {
                if !refs.contains(&m.as_str()) {
                    refs.push(m.as_str());
                }
            }
        }
        refs
    }
}
