//! Error types for vault-anki-core.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a document is not a usable Front:/Back: template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no Front: marker found")]
    MissingFront,

    #[error("no Back: marker found")]
    MissingBack,

    #[error("Front: section is empty")]
    EmptyFront,

    #[error("Back: section is empty")]
    EmptyBack,
}

impl TemplateError {
    /// True when the document has no template markers at all.
    pub fn is_missing_marker(&self) -> bool {
        matches!(self, Self::MissingFront | Self::MissingBack)
    }
}

/// Errors raised while resolving or uploading an image reference.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not upload {filename}: {source}")]
    Upload {
        filename: String,
        #[source]
        source: StoreError,
    },
}

/// Errors returned by a remote card store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Remote(String),

    #[error("unexpected response: {0}")]
    Protocol(String),
}

/// Fatal errors that stop a run before any document is processed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(
        "cards folder does not exist: {}\nCreate it or point --vault/--cards-folder at the right place.",
        .0.display()
    )]
    SourceFolderMissing(PathBuf),

    #[error(
        "cannot connect to AnkiConnect: {0}\nMake sure Anki is running with the AnkiConnect add-on \
         installed (Tools > Add-ons > Get Add-ons > code 2055492159) and that --url is correct."
    )]
    Connectivity(StoreError),

    #[error("cannot confirm deck '{deck}': {source}")]
    Deck {
        deck: String,
        #[source]
        source: StoreError,
    },

    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for run-level operations.
pub type Result<T> = std::result::Result<T, SyncError>;
