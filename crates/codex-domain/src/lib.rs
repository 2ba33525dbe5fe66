//! Codex Domain Layer
//!
//! Core data model for the worldbuilding codex import pipeline. Every other
//! crate in the workspace depends on the types defined here.
//!
//! ## Key Concepts
//!
//! - **Entry draft**: one structured codex record extracted from source text,
//!   not yet persisted and without identity beyond its title
//! - **Category**: the fixed set of entry kinds (deity, race, character, ...)
//!   each with its own attribute template
//! - **Temporal**: optional placement of an entry on the setting's timeline
//! - **Completion provider**: the boundary to the language-model service
//!
//! ## Architecture
//!
//! This crate holds no I/O. Provider implementations live in `codex-llm`,
//! the pipeline itself lives in `codex-importer`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod entry;
pub mod temporal;
pub mod title;
pub mod traits;

// Re-exports for convenience
pub use category::Category;
pub use entry::CodexEntryDraft;
pub use temporal::{Temporal, TemporalKind};
pub use title::{cleanse_title, title_key};
pub use traits::{Completion, CompletionProvider, CompletionRequest, StopReason};
