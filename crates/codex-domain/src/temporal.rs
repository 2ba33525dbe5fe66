//! Temporal module - placement of entries on the setting's timeline

use serde::{Deserialize, Serialize};

/// How an entry exists in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    /// Exists indefinitely (deities, primordial forces)
    Immortal,

    /// Born and dies (characters)
    Mortal,

    /// Happens over a bounded span
    Event,

    /// Abstract, active for a period (laws, magic schools)
    Concept,

    /// A people, active from emergence to extinction
    Race,
}

impl TemporalKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalKind::Immortal => "immortal",
            TemporalKind::Mortal => "mortal",
            TemporalKind::Event => "event",
            TemporalKind::Concept => "concept",
            TemporalKind::Race => "race",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "immortal" => Some(TemporalKind::Immortal),
            "mortal" => Some(TemporalKind::Mortal),
            "event" => Some(TemporalKind::Event),
            "concept" => Some(TemporalKind::Concept),
            "race" => Some(TemporalKind::Race),
            _ => None,
        }
    }
}

/// Timeline placement of an entry
///
/// Years are in the setting's own calendar and may be negative. Any bound
/// may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temporal {
    /// How the entry exists in time
    #[serde(rename = "type")]
    pub kind: TemporalKind,

    /// First year the entry is active
    pub active_start: Option<i64>,

    /// Last year the entry is active
    pub active_end: Option<i64>,

    /// Year of birth (mortals)
    pub birth_year: Option<i64>,

    /// Year of death (mortals)
    pub death_year: Option<i64>,
}

impl Temporal {
    /// Create a temporal record with all years unknown
    pub fn new(kind: TemporalKind) -> Self {
        Self {
            kind,
            active_start: None,
            active_end: None,
            birth_year: None,
            death_year: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_type_key_and_nulls() {
        let temporal = Temporal {
            active_start: Some(-1200),
            ..Temporal::new(TemporalKind::Race)
        };
        let json = serde_json::to_value(&temporal).unwrap();
        assert_eq!(json["type"], "race");
        assert_eq!(json["active_start"], -1200);
        assert!(json["death_year"].is_null());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TemporalKind::parse("Mortal"), Some(TemporalKind::Mortal));
        assert_eq!(TemporalKind::parse("eternal"), None);
    }
}
