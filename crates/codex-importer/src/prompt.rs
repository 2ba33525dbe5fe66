//! LLM prompt engineering for codex entry extraction

use codex_domain::{Category, CompletionRequest};

/// Builds extraction requests for one chunk of a document
pub struct PromptBuilder {
    text: String,
    filename: String,
    chunk_index: usize,
    total_chunks: usize,
    known_titles: Vec<String>,
    max_tokens: u32,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: filename.into(),
            chunk_index: 0,
            total_chunks: 1,
            known_titles: Vec::new(),
            max_tokens: 8_192,
        }
    }

    /// Set the position of this chunk within the document
    pub fn with_position(mut self, chunk_index: usize, total_chunks: usize) -> Self {
        self.chunk_index = chunk_index;
        self.total_chunks = total_chunks.max(1);
        self
    }

    /// Titles already extracted, which must not be extracted again
    pub fn with_known_titles(mut self, titles: Vec<String>) -> Self {
        self.known_titles = titles;
        self
    }

    /// Output token bound for the request
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the complete extraction request
    pub fn build(&self) -> CompletionRequest {
        CompletionRequest {
            system: system_instructions(),
            user: self.user_message(),
            max_tokens: self.max_tokens,
        }
    }

    fn user_message(&self) -> String {
        let mut prompt = String::new();

        // 1. Document context
        prompt.push_str(&format!("Document: {}\n", self.filename));
        if self.total_chunks > 1 {
            prompt.push_str(&format!(
                "This is section {} of {} of the document.\n",
                self.chunk_index + 1,
                self.total_chunks
            ));
        }
        prompt.push('\n');

        // 2. Deduplication hints (if any)
        if !self.known_titles.is_empty() {
            prompt.push_str(
                "The following entries were already extracted. Do NOT extract these again:\n",
            );
            for title in &self.known_titles {
                prompt.push_str(&format!("- {}\n", title));
            }
            prompt.push('\n');
        }

        // 3. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        // 4. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Fixed instruction set, with the per-category field templates spelled out
fn system_instructions() -> String {
    let mut instructions = String::from(EXTRACTION_INSTRUCTIONS);
    instructions.push_str("\n\nCategories and their fields:\n");
    for category in Category::KNOWN.iter() {
        instructions.push_str(&format!(
            "- {}: {}\n",
            category,
            category.field_template().join(", ")
        ));
    }
    instructions.push('\n');
    instructions.push_str(ENTRY_SCHEMA);
    instructions
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are an expert archivist for a fantasy worldbuilding codex.
Read the supplied lore text and extract every distinct entity it describes as a codex entry.

Rules:
- One entry per distinct entity (deity, race, character, event, location, organization, item, magic system, language, creature or plant, law or custom)
- Use the entity's proper name as the title, without heading markers, numbering or formatting
- Choose exactly one category from the list below
- Fill the category's fields when the text states them; omit fields the text does not support
- Keep the summary to one or two sentences; put the full description in body
- When body mentions another entity, write it as @snake_case_name (e.g. @the_sunfather)
- Do not invent facts that are not in the text"#;

const ENTRY_SCHEMA: &str = r#"Each entry has this shape:

{
  "title": "Proper Name",
  "category": "one of the categories above",
  "summary": "short description",
  "fields": { "field_name": "value" },
  "body": "full description with @cross_references",
  "tags": ["tag", "tag"],
  "temporal": {
    "type": "immortal | mortal | event | concept | race",
    "active_start": 0,
    "active_end": null,
    "birth_year": null,
    "death_year": null
  }
}

temporal is optional; years are integers on the setting's calendar, null when unknown."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  { "title": "...", "category": "...", "summary": "...", "fields": {}, "body": "...", "tags": [] }
]

Remember: Return ONLY a valid JSON array, no markdown code blocks, no explanations. Return [] if the text describes no entities."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_filename_and_text() {
        let request = PromptBuilder::new("The Sunfather kindled the dawn.", "lore.txt").build();
        assert!(request.user.contains("Document: lore.txt"));
        assert!(request.user.contains("The Sunfather kindled the dawn."));
    }

    #[test]
    fn test_single_chunk_has_no_position_note() {
        let request = PromptBuilder::new("Text", "lore.txt").build();
        assert!(!request.user.contains("section"));
    }

    #[test]
    fn test_position_note_is_one_based() {
        let request = PromptBuilder::new("Text", "lore.txt")
            .with_position(1, 3)
            .build();
        assert!(request.user.contains("section 2 of 3"));
    }

    #[test]
    fn test_known_titles_are_listed() {
        let request = PromptBuilder::new("Text", "lore.txt")
            .with_known_titles(vec!["the_sunfather".to_string(), "The Alduinari".to_string()])
            .build();
        assert!(request.user.contains("Do NOT extract these again"));
        assert!(request.user.contains("- the_sunfather\n"));
        assert!(request.user.contains("- The Alduinari\n"));
    }

    #[test]
    fn test_no_known_titles_section_when_empty() {
        let request = PromptBuilder::new("Text", "lore.txt").build();
        assert!(!request.user.contains("Do NOT extract"));
    }

    #[test]
    fn test_system_lists_every_category_template() {
        let request = PromptBuilder::new("Text", "lore.txt").build();
        for category in Category::KNOWN.iter() {
            assert!(request.system.contains(&format!("- {}:", category)));
        }
        assert!(request.system.contains("domains, alignment, symbols"));
        assert!(request.system.contains("@snake_case_name"));
        assert!(request.user.contains("JSON array only"));
    }

    #[test]
    fn test_max_tokens_is_carried() {
        let request = PromptBuilder::new("Text", "lore.txt")
            .with_max_tokens(1234)
            .build();
        assert_eq!(request.max_tokens, 1234);
    }
}
