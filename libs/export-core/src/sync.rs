//! Sync orchestrator.
//!
//! One run walks the cards folder and, per document:
//! parse template → derive identity → render fields (uploading images) →
//! look up the identity tag → update the match or create a new note.
//!
//! Per-document failures become a [`SyncOutcome`] and the run moves on.
//! Only a missing cards folder, an unreachable store or an unusable deck
//! stop the run, and they do so before any document is touched.

use std::path::Path;
use tracing::{info, warn};

use crate::assets::resolve_assets;
use crate::config::ExportConfig;
use crate::error::{Result, SyncError, TemplateError};
use crate::frontmatter::FrontMatter;
use crate::identity::{derive_identity, relative_path};
use crate::markup::{image_references, render_card};
use crate::parser::parse_template;
use crate::source::{collect_documents, read_document};
use crate::store::{identity_query, CardStore, NewNote, NoteFields};
use crate::types::{
    DocumentReport, Identity, NoteId, PlannedChange, PresentationCard, RunSummary, SkipReason,
    SourceDocument, SyncOutcome,
};

/// State of the target deck after the start-of-run check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckStatus {
    Existing,
    Created,
    /// Dry run against a store that lacks the deck.
    WouldCreate,
}

/// Drives a one-way export from the vault into a [`CardStore`].
pub struct SyncOrchestrator<S> {
    store: S,
    config: ExportConfig,
}

impl<S: CardStore> SyncOrchestrator<S> {
    pub fn new(store: S, config: ExportConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check the cards folder exists.
    pub fn check_source(&self) -> Result<()> {
        let cards_dir = self.config.cards_dir();
        if !cards_dir.is_dir() {
            return Err(SyncError::SourceFolderMissing(cards_dir));
        }
        Ok(())
    }

    /// Check the store answers. Returns its API version.
    pub async fn check_connection(&self) -> Result<u32> {
        self.store.version().await.map_err(SyncError::Connectivity)
    }

    /// Make sure the target deck exists, creating it unless `dry_run`.
    pub async fn ensure_deck(&self, dry_run: bool) -> Result<DeckStatus> {
        let deck = &self.config.deck;
        let deck_error = |source| SyncError::Deck {
            deck: deck.clone(),
            source,
        };

        let decks = self.store.deck_names().await.map_err(deck_error)?;
        if decks.iter().any(|d| d == deck) {
            info!(deck = %deck, "using existing deck");
            return Ok(DeckStatus::Existing);
        }
        if dry_run {
            info!(deck = %deck, "deck does not exist and would be created");
            return Ok(DeckStatus::WouldCreate);
        }

        self.store.create_deck(deck).await.map_err(deck_error)?;
        info!(deck = %deck, "created deck");
        Ok(DeckStatus::Created)
    }

    /// Export every card file under the cards folder.
    ///
    /// With `dry_run` set only read-only calls are made and outcomes are
    /// reported as [`SyncOutcome::Planned`].
    pub async fn run(&self, dry_run: bool) -> Result<RunSummary> {
        self.check_source()?;
        let cards_dir = self.config.cards_dir();

        let version = self.check_connection().await?;
        info!(version, "connected to AnkiConnect");

        self.ensure_deck(dry_run).await?;

        let paths = collect_documents(&cards_dir)?;
        info!(count = paths.len(), dir = %cards_dir.display(), "scanning cards folder");

        let mut summary = RunSummary::new(&self.config.deck, dry_run);
        for path in paths {
            let report = self.sync_path(&path, dry_run).await;
            summary.record(report);
        }
        summary.finish();

        Ok(summary)
    }

    async fn sync_path(&self, path: &Path, dry_run: bool) -> DocumentReport {
        match read_document(&self.config.vault_root, path) {
            Ok(document) => self.sync_document(&document, dry_run).await,
            Err(e) => {
                let path = relative_path(&self.config.vault_root, path);
                warn!(path = %path, "could not read file: {}", e);
                DocumentReport {
                    path,
                    identity: None,
                    assets: vec![],
                    outcome: SyncOutcome::Errored(format!("could not read file: {}", e)),
                }
            }
        }
    }

    /// Export a single document.
    pub async fn sync_document(&self, document: &SourceDocument, dry_run: bool) -> DocumentReport {
        let mut report = DocumentReport {
            path: document.relative_path.clone(),
            identity: None,
            assets: vec![],
            outcome: SyncOutcome::Skipped(SkipReason::NoTemplate),
        };

        let template = match parse_template(&document.content) {
            Ok(template) => template,
            Err(e) => {
                info!(path = %report.path, "skipped: {}", e);
                report.outcome = SyncOutcome::Skipped(skip_reason(&e));
                return report;
            }
        };

        let identity = derive_identity(&document.content, &document.relative_path);
        if identity.is_empty() {
            warn!(path = %report.path, "skipped: could not derive an identity");
            report.outcome = SyncOutcome::Skipped(SkipReason::NoIdentity);
            return report;
        }
        report.identity = Some(identity.clone());

        let mut references = image_references(&template.front);
        for reference in image_references(&template.back) {
            if !references.contains(&reference) {
                references.push(reference);
            }
        }
        let resolved = resolve_assets(
            &self.store,
            &references,
            &self.config.vault_root,
            &self.config.media_folder,
            !dry_run,
        )
        .await;
        let card = render_card(&template, Some(&resolved));
        report.assets = card.assets.clone();

        let tags = self.note_tags(document, &identity);
        report.outcome = self.push(&report.path, &identity, card, tags, dry_run).await;

        match &report.outcome {
            SyncOutcome::Created(id) => info!(path = %report.path, note_id = id, "created note"),
            SyncOutcome::Updated(id) => info!(path = %report.path, note_id = id, "updated note"),
            SyncOutcome::Planned(change) => info!(path = %report.path, ?change, "planned"),
            SyncOutcome::Errored(reason) => warn!(path = %report.path, "error: {}", reason),
            SyncOutcome::Skipped(_) => {}
        }
        report
    }

    /// Look the identity up and update or create.
    async fn push(
        &self,
        path: &str,
        identity: &Identity,
        card: PresentationCard,
        tags: Vec<String>,
        dry_run: bool,
    ) -> SyncOutcome {
        let existing = match self.find_existing(path, identity).await {
            Ok(existing) => existing,
            Err(reason) => return SyncOutcome::Errored(reason),
        };

        let fields = NoteFields {
            front: card.front,
            back: card.back,
        };

        match (existing, dry_run) {
            (Some(id), true) => SyncOutcome::Planned(PlannedChange::Update(id)),
            (None, true) => SyncOutcome::Planned(PlannedChange::Create),
            (Some(id), false) => match self.update(id, &fields, &tags).await {
                Ok(()) => SyncOutcome::Updated(id),
                Err(reason) => SyncOutcome::Errored(reason),
            },
            (None, false) => {
                let note = NewNote::basic(&self.config.deck, fields, tags);
                match self.store.add_note(&note).await {
                    Ok(id) => SyncOutcome::Created(id),
                    Err(e) => SyncOutcome::Errored(format!("create failed: {}", e)),
                }
            }
        }
    }

    /// First note carrying the identity tag.
    ///
    /// More than one match means an earlier run broke the one-note-per-identity
    /// rule; the first id returned is used and the rest are reported.
    async fn find_existing(
        &self,
        path: &str,
        identity: &Identity,
    ) -> std::result::Result<Option<NoteId>, String> {
        let ids = self
            .store
            .find_notes(&identity_query(identity))
            .await
            .map_err(|e| format!("search failed: {}", e))?;

        if ids.len() > 1 {
            warn!(
                path = %path,
                tag = %identity.tag(),
                ?ids,
                "several notes carry the same identity tag, updating the first"
            );
        }
        Ok(ids.first().copied())
    }

    async fn update(
        &self,
        id: NoteId,
        fields: &NoteFields,
        tags: &[String],
    ) -> std::result::Result<(), String> {
        self.store
            .update_note_fields(id, fields)
            .await
            .map_err(|e| format!("update failed: {}", e))?;
        self.store
            .update_note_tags(id, tags)
            .await
            .map_err(|e| format!("tag update failed: {}", e))?;
        if let Err(e) = self.store.clear_unused_tags().await {
            warn!("could not clear unused tags: {}", e);
        }
        Ok(())
    }

    /// Configured tags, then front matter tags, then the identity tag.
    fn note_tags(&self, document: &SourceDocument, identity: &Identity) -> Vec<String> {
        let front_matter = FrontMatter::from_document(&document.content).unwrap_or_default();
        let mut tags: Vec<String> = Vec::new();
        let candidates = self
            .config
            .default_tags
            .iter()
            .cloned()
            .chain(front_matter.tags().iter().cloned())
            .chain(std::iter::once(identity.tag()));
        for tag in candidates {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

fn skip_reason(error: &TemplateError) -> SkipReason {
    if error.is_missing_marker() {
        SkipReason::NoTemplate
    } else {
        SkipReason::EmptySection
    }
}
