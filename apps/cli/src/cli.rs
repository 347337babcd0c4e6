use std::path::PathBuf;

use clap::Parser;

use vault_anki_core::config::{
    DEFAULT_CARDS_FOLDER, DEFAULT_DECK, DEFAULT_MEDIA_FOLDER, DEFAULT_TAG,
};
use vault_anki_core::ExportConfig;

use crate::anki::DEFAULT_URL;

/// Export Front:/Back: flashcards from an Obsidian vault into Anki.
#[derive(Debug, Parser)]
#[command(name = "vault-anki", version, about)]
pub struct Args {
    /// Path to the Obsidian vault
    #[arg(long, env = "VAULT_PATH")]
    pub vault: PathBuf,

    /// Folder inside the vault holding card files
    #[arg(long, env = "VAULT_ANKI_FOLDER", default_value = DEFAULT_CARDS_FOLDER)]
    pub cards_folder: String,

    /// Folder inside the vault searched first for images
    #[arg(long, env = "VAULT_MEDIA_FOLDER", default_value = DEFAULT_MEDIA_FOLDER)]
    pub media_folder: String,

    /// Target Anki deck
    #[arg(long, env = "ANKI_DECK", default_value = DEFAULT_DECK)]
    pub deck: String,

    /// AnkiConnect endpoint
    #[arg(long, env = "ANKI_CONNECT_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Tag added to every note (repeatable)
    #[arg(long = "tag", default_values_t = [DEFAULT_TAG.to_string()])]
    pub tags: Vec<String>,

    /// Report what would change without writing to Anki
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            vault_root: self.vault.clone(),
            cards_folder: self.cards_folder.clone(),
            media_folder: self.media_folder.clone(),
            deck: self.deck.clone(),
            default_tags: self.tags.clone(),
        }
    }

    /// Whether the user has to confirm before anything is written.
    pub fn needs_confirmation(&self) -> bool {
        !(self.yes || self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "vault-anki",
            "--vault",
            "/notes",
            "--cards-folder",
            "cards",
            "--deck",
            "Biology",
            "--tag",
            "bio",
            "--tag",
            "exam",
            "--dry-run",
        ])
        .unwrap();

        let config = args.export_config();
        assert_eq!(config.cards_dir(), PathBuf::from("/notes/cards"));
        assert_eq!(config.deck, "Biology");
        assert_eq!(config.default_tags, vec!["bio", "exam"]);
        assert!(args.dry_run);
        assert!(!args.needs_confirmation());
    }

    #[test]
    fn yes_skips_confirmation() {
        let args = Args::try_parse_from(["vault-anki", "--vault", "/notes", "-y"]).unwrap();
        assert!(!args.needs_confirmation());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["vault-anki", "--vault", "/notes", "--bogus"]).is_err());
    }
}
