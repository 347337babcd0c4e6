//! Remote card store contract.
//!
//! Mirrors the subset of AnkiConnect the exporter needs. The HTTP client
//! lives in the binary; the orchestrator only sees this trait.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{Identity, NoteId};

/// Note type used for created notes.
pub const BASIC_MODEL: &str = "Basic";

/// Front/Back field values of a Basic note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    #[serde(rename = "Front")]
    pub front: String,
    #[serde(rename = "Back")]
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

/// A note to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub tags: Vec<String>,
    pub options: NoteOptions,
}

impl NewNote {
    /// A Basic note that may duplicate existing content; the identity tag is
    /// the de-duplication key.
    pub fn basic(deck: &str, fields: NoteFields, tags: Vec<String>) -> Self {
        Self {
            deck_name: deck.to_string(),
            model_name: BASIC_MODEL.to_string(),
            fields,
            tags,
            options: NoteOptions {
                allow_duplicate: true,
            },
        }
    }
}

/// Operations the exporter performs against the flashcard application.
#[allow(async_fn_in_trait)]
pub trait CardStore {
    /// API version, used as a connectivity check.
    async fn version(&self) -> Result<u32, StoreError>;

    async fn deck_names(&self) -> Result<Vec<String>, StoreError>;

    /// Create a deck; a no-op when it already exists.
    async fn create_deck(&self, deck: &str) -> Result<(), StoreError>;

    /// Store base64 data under `filename`, overwriting. Returns the stored name.
    async fn store_media_file(&self, filename: &str, data: &str) -> Result<String, StoreError>;

    /// Note ids matching an Anki search query.
    async fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, StoreError>;

    async fn update_note_fields(&self, note: NoteId, fields: &NoteFields) -> Result<(), StoreError>;

    /// Replace the tags of a note.
    async fn update_note_tags(&self, note: NoteId, tags: &[String]) -> Result<(), StoreError>;

    async fn clear_unused_tags(&self) -> Result<(), StoreError>;

    async fn add_note(&self, note: &NewNote) -> Result<NoteId, StoreError>;
}

/// Anki search for notes carrying the identity tag.
///
/// `_` and `*` are wildcards in Anki searches and get escaped.
pub fn identity_query(identity: &Identity) -> String {
    let mut escaped = String::new();
    for c in identity.tag().chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("\"tag:{}\"", escaped)
}
