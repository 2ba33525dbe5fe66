//! Category module - the kinds of entry a codex can hold

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of codex entry
///
/// The eleven known categories each carry a fixed attribute template (see
/// [`Category::field_template`]). Labels outside the known set are kept as
/// [`Category::Other`] so that a lenient import can still hand them to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Gods, demigods and other divine beings
    Deity,

    /// Peoples and species
    Race,

    /// Individual persons
    Character,

    /// Battles, founding moments, catastrophes
    Event,

    /// Places of any scale
    Location,

    /// Guilds, orders, kingdoms, cults
    Organization,

    /// Artifacts and notable objects
    Item,

    /// Magic systems, schools and spells
    Magic,

    /// Spoken and written languages
    Language,

    /// Plants and creatures
    FloraFauna,

    /// Laws, traditions and customs
    LawsCustoms,

    /// Unrecognised label, carried verbatim
    Other(String),
}

impl Category {
    /// All known categories in canonical order
    pub const KNOWN: [Category; 11] = [
        Category::Deity,
        Category::Race,
        Category::Character,
        Category::Event,
        Category::Location,
        Category::Organization,
        Category::Item,
        Category::Magic,
        Category::Language,
        Category::FloraFauna,
        Category::LawsCustoms,
    ];

    /// Get the category label as a string
    pub fn as_str(&self) -> &str {
        match self {
            Category::Deity => "deity",
            Category::Race => "race",
            Category::Character => "character",
            Category::Event => "event",
            Category::Location => "location",
            Category::Organization => "organization",
            Category::Item => "item",
            Category::Magic => "magic",
            Category::Language => "language",
            Category::FloraFauna => "flora_fauna",
            Category::LawsCustoms => "laws_customs",
            Category::Other(label) => label,
        }
    }

    /// Parse a known category, tolerating case, separators and a few
    /// common synonyms
    ///
    /// # Examples
    ///
    /// ```
    /// use codex_domain::Category;
    ///
    /// assert_eq!(Category::parse("Flora & Fauna"), Some(Category::FloraFauna));
    /// assert_eq!(Category::parse("god"), Some(Category::Deity));
    /// assert_eq!(Category::parse("spaceship"), None);
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        let category = match normalized.as_str() {
            "deity" | "deities" | "god" | "goddess" | "gods" => Category::Deity,
            "race" | "races" | "species" | "people" | "peoples" => Category::Race,
            "character" | "characters" | "person" | "npc" => Category::Character,
            "event" | "events" | "history" => Category::Event,
            "location" | "locations" | "place" | "places" | "region" => Category::Location,
            "organization" | "organizations" | "organisation" | "faction" | "guild" => {
                Category::Organization
            }
            "item" | "items" | "artifact" | "artefact" | "object" => Category::Item,
            "magic" | "spell" | "spells" | "magic_system" => Category::Magic,
            "language" | "languages" | "tongue" => Category::Language,
            "flora_fauna" | "flora_and_fauna" | "flora" | "fauna" | "creature" | "creatures" => {
                Category::FloraFauna
            }
            "laws_customs" | "laws_and_customs" | "law" | "laws" | "custom" | "customs" => {
                Category::LawsCustoms
            }
            _ => return None,
        };
        Some(category)
    }

    /// Parse a category, keeping unrecognised labels as [`Category::Other`]
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|| Category::Other(label.trim().to_string()))
    }

    /// Whether this is one of the eleven known categories
    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    /// Recognised attribute names for entries of this category
    ///
    /// Unrecognised keys are still accepted on a draft; the template only
    /// tells the extraction service what to look for.
    pub fn field_template(&self) -> &'static [&'static str] {
        match self {
            Category::Deity => &[
                "domains",
                "alignment",
                "symbols",
                "pantheon",
                "worshippers",
                "holy_sites",
            ],
            Category::Race => &[
                "creators",
                "lifespan",
                "population",
                "magic_affinity",
                "homeland",
                "capital",
                "physical_characteristics",
            ],
            Category::Character => &[
                "race",
                "affiliation",
                "role",
                "titles",
                "homeland",
                "abilities",
            ],
            Category::Event => &["date", "location", "participants", "outcome", "significance"],
            Category::Location => &["region", "kind", "population", "ruler", "notable_features"],
            Category::Organization => &["leader", "founded", "headquarters", "purpose", "members"],
            Category::Item => &["kind", "creator", "owner", "powers", "origin"],
            Category::Magic => &["source", "practitioners", "limitations", "effects"],
            Category::Language => &["speakers", "script", "origin", "sample_phrases"],
            Category::FloraFauna => &["habitat", "diet", "appearance", "uses", "rarity"],
            Category::LawsCustoms => &["region", "enforced_by", "origin", "penalties"],
            Category::Other(_) => &[],
        }
    }
}

/// Lowercase and fold separators (`space`, `-`, `/`, `&`) into single
/// underscores
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Category::from_label(&label))
    }
}
