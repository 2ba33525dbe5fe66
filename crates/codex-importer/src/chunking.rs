//! Text chunking for large documents
//!
//! Chunks are contiguous slices of the source: concatenating them in order
//! reproduces the document exactly, and no chunk exceeds the configured
//! number of characters.

use crate::config::ChunkStrategy;
use serde::Serialize;

/// One bounded slice of the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Zero-based position of this chunk
    pub index: usize,

    /// Number of chunks the document was split into
    pub total: usize,

    /// Byte offset of the chunk in the source text
    pub offset: usize,

    /// The chunk text
    pub text: String,
}

impl Chunk {
    /// Length of the chunk in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Kinds of natural break, from most to least preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Heading,
    Paragraph,
    Line,
    Sentence,
    Whitespace,
}

impl ChunkStrategy {
    fn boundaries(&self) -> &'static [Boundary] {
        match self {
            ChunkStrategy::BySection => &[
                Boundary::Heading,
                Boundary::Paragraph,
                Boundary::Line,
                Boundary::Sentence,
                Boundary::Whitespace,
            ],
            ChunkStrategy::ByParagraph => &[
                Boundary::Paragraph,
                Boundary::Line,
                Boundary::Sentence,
                Boundary::Whitespace,
            ],
            ChunkStrategy::ByCharacterCount => &[Boundary::Whitespace],
        }
    }
}

/// Chunks text according to the specified strategy
pub struct TextChunker {
    strategy: ChunkStrategy,
    max_chunk_size: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(strategy: ChunkStrategy, max_chunk_size: usize) -> Self {
        Self {
            strategy,
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    /// Chunk the given text
    ///
    /// Text within the bound (including empty text) yields exactly one chunk.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut pieces: Vec<(usize, &str)> = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let rest = &text[start..];
            let window_end = match rest.char_indices().nth(self.max_chunk_size) {
                Some((byte_idx, _)) => byte_idx,
                None => {
                    pieces.push((start, rest));
                    break;
                }
            };

            let window = &rest[..window_end];
            let cut = self.find_break(window).unwrap_or(window_end);
            pieces.push((start, &rest[..cut]));
            start += cut;
        }

        if pieces.is_empty() {
            pieces.push((0, text));
        }

        let total = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(index, (offset, piece))| Chunk {
                index,
                total,
                offset,
                text: piece.to_string(),
            })
            .collect()
    }

    /// Byte position to cut the window at, preferring natural breaks in the
    /// back half of the window
    fn find_break(&self, window: &str) -> Option<usize> {
        let min = (window.len() / 2).max(1);
        self.strategy
            .boundaries()
            .iter()
            .filter_map(|boundary| last_boundary(window, *boundary))
            .find(|&cut| cut >= min)
    }
}

/// Cut position just past the last break of the given kind
fn last_boundary(window: &str, boundary: Boundary) -> Option<usize> {
    match boundary {
        Boundary::Heading => window
            .match_indices('\n')
            .rev()
            .map(|(i, _)| i + 1)
            .find(|&p| p < window.len() && is_heading_line(&window[p..])),
        Boundary::Paragraph => window.rfind("\n\n").map(|i| i + 2),
        Boundary::Line => window.rfind('\n').map(|i| i + 1),
        Boundary::Sentence => [". ", "! ", "? ", ".\n", "!\n", "?\n"]
            .iter()
            .filter_map(|end| window.rfind(end).map(|i| i + end.len()))
            .max(),
        Boundary::Whitespace => window
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8()),
    }
}

/// Markdown heading (`# Title`) or short numbered heading (`3. The Exile`)
fn is_heading_line(text: &str) -> bool {
    let line = text.lines().next().unwrap_or("");
    if line.starts_with('#') {
        return true;
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || line.chars().count() > 80 {
        return false;
    }
    let mut rest = line[digits..].chars();
    matches!(rest.next(), Some('.') | Some(')'))
        && matches!(rest.next(), Some(' '))
        && rest.next().is_some_and(|c| !c.is_whitespace())
}
