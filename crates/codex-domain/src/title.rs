//! Title cleansing and matching keys
//!
//! Lore documents converted from word processors carry structural markup in
//! their headings: pandoc-style attribute blocks (`{#the-sunfather}`,
//! `{.unnumbered}`, `{-}`), heading hashes and emphasis markers. The
//! extraction service tends to copy those into titles verbatim.

use std::sync::LazyLock;

use regex::Regex;

/// `{#anchor}`, `{.class}`, `{-}` and combinations such as `{#id .unnumbered}`
static ATTRIBUTE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*[#.\-][^{}]*\}").expect("valid attribute regex"));

/// Leading markdown heading hashes
static HEADING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s*").expect("valid heading regex"));

/// A bare "(unnumbered)" / "[unnumbered]" marker
static UNNUMBERED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\(\[]\s*unnumbered\s*[\)\]]").expect("valid unnumbered regex")
});

const EMPHASIS_MARKERS: [&str; 4] = ["**", "__", "*", "_"];

/// Strip structural markup artifacts from a title
///
/// Cleansing runs to a fixed point, so it is idempotent: cleansing an
/// already-clean title returns it unchanged.
///
/// # Examples
///
/// ```
/// use codex_domain::cleanse_title;
///
/// assert_eq!(cleanse_title("## The Sunfather {#the-sunfather .unnumbered}"), "The Sunfather");
/// assert_eq!(cleanse_title("**The Alduinari**"), "The Alduinari");
/// assert_eq!(cleanse_title("The Alduinari"), "The Alduinari");
/// ```
pub fn cleanse_title(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = cleanse_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn cleanse_once(input: &str) -> String {
    let without_blocks = ATTRIBUTE_BLOCK.replace_all(input, " ");
    let without_markers = UNNUMBERED_MARKER.replace_all(&without_blocks, " ");
    let collapsed = without_markers.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_hashes = HEADING_HASHES.replace(&collapsed, "");
    let unwrapped = strip_wrapping(without_hashes.trim());
    unwrapped.trim().to_string()
}

/// Remove one layer of emphasis or bracket wrapping around the whole title
fn strip_wrapping(title: &str) -> &str {
    for marker in EMPHASIS_MARKERS {
        if title.len() > marker.len() * 2
            && title.starts_with(marker)
            && title.ends_with(marker)
        {
            return &title[marker.len()..title.len() - marker.len()];
        }
    }
    if title.len() > 2 && title.starts_with('[') && title.ends_with(']') {
        let inner = &title[1..title.len() - 1];
        if !inner.contains('[') && !inner.contains(']') {
            return inner;
        }
    }
    title
}

/// Lowercase snake-case key used for advisory title matching
///
/// `"The Sunfather"` and `"the_sunfather"` share the key `the_sunfather`.
pub fn title_key(title: &str) -> String {
    let mut key = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_anchor_and_unnumbered() {
        assert_eq!(cleanse_title("The Sunfather {#the-sunfather}"), "The Sunfather");
        assert_eq!(cleanse_title("Prologue {.unnumbered}"), "Prologue");
        assert_eq!(cleanse_title("Prologue {-}"), "Prologue");
        assert_eq!(cleanse_title("Appendix (unnumbered)"), "Appendix");
    }

    #[test]
    fn test_strips_heading_and_emphasis() {
        assert_eq!(cleanse_title("### *Saint Ilvra*"), "Saint Ilvra");
        assert_eq!(cleanse_title("__**Ashen Court**__"), "Ashen Court");
        assert_eq!(cleanse_title("[The Drowned Tongue]{.underline}"), "The Drowned Tongue");
    }

    #[test]
    fn test_keeps_inner_punctuation() {
        assert_eq!(cleanse_title("Vel'Shari, the Twice-Born"), "Vel'Shari, the Twice-Born");
        assert_eq!(cleanse_title("snake_case_title"), "snake_case_title");
    }

    #[test]
    fn test_markup_only_title_becomes_empty() {
        assert_eq!(cleanse_title("{#anchor}"), "");
        assert_eq!(cleanse_title("   "), "");
    }

    #[test]
    fn test_title_key() {
        assert_eq!(title_key("The Sunfather"), "the_sunfather");
        assert_eq!(title_key("the_sunfather"), "the_sunfather");
        assert_eq!(title_key("  Vel'Shari, the Twice-Born "), "vel_shari_the_twice_born");
    }

    proptest! {
        #[test]
        fn prop_cleansing_is_idempotent(raw in "[#*_ \\[\\]{}.\\-a-zA-Z]{0,40}") {
            let once = cleanse_title(&raw);
            let twice = cleanse_title(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_clean_titles_unchanged(words in proptest::collection::vec("[A-Za-z]{1,10}", 1..5)) {
            let title = words.join(" ");
            prop_assert_eq!(cleanse_title(&title), title);
        }
    }
}
