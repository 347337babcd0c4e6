//! Export configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CARDS_FOLDER: &str = "anki";
pub const DEFAULT_MEDIA_FOLDER: &str = "media";
pub const DEFAULT_DECK: &str = "Obsidian Notes";
pub const DEFAULT_TAG: &str = "obsidian";

/// Where to read cards from and where to put them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub vault_root: PathBuf,
    /// Folder under the vault root holding card templates.
    pub cards_folder: String,
    /// Folder under the vault root searched first for images.
    pub media_folder: String,
    /// Target deck.
    pub deck: String,
    /// Tags added to every note besides its identity and front matter tags.
    pub default_tags: Vec<String>,
}

impl ExportConfig {
    /// Defaults for everything but the vault root.
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            ..Self::default()
        }
    }

    pub fn cards_dir(&self) -> PathBuf {
        self.vault_root.join(&self.cards_folder)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            cards_folder: DEFAULT_CARDS_FOLDER.to_string(),
            media_folder: DEFAULT_MEDIA_FOLDER.to_string(),
            deck: DEFAULT_DECK.to_string(),
            default_tags: vec![DEFAULT_TAG.to_string()],
        }
    }
}
