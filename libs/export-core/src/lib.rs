//! Markdown card export for an Obsidian-style vault.
//!
//! Provides:
//! - Front:/Back: template parser
//! - Markdown to Anki field HTML transform
//! - Stable per-file identity (front matter `id` or path hash)
//! - Image lookup and upload
//! - Sync orchestrator over a [`CardStore`]

pub mod assets;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod identity;
pub mod markup;
pub mod parser;
pub mod source;
pub mod store;
pub mod sync;
pub mod types;

pub use config::ExportConfig;
pub use error::{AssetError, Result, StoreError, SyncError, TemplateError};
pub use identity::derive_identity;
pub use markup::{render, render_card, ResolvedAssets};
pub use parser::parse_template;
pub use store::{CardStore, NewNote, NoteFields};
pub use sync::{DeckStatus, SyncOrchestrator};
pub use types::{
    DocumentReport, Identity, NoteId, ParsedTemplate, PlannedChange, PresentationCard, RunSummary,
    SkipReason, SourceDocument, SyncOutcome,
};
