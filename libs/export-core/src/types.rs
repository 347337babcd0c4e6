//! Core types for the export pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Anki note id.
pub type NoteId = i64;

/// Prefix of the tag that carries a document's identity.
pub const IDENTITY_TAG_PREFIX: &str = "obsidian-id-";

/// A markdown file read from the cards folder.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// Path relative to the vault root, `/`-separated.
    pub relative_path: String,
    pub content: String,
}

/// Stable key tying one source document to at most one Anki note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The tag stored on the remote note, e.g. `obsidian-id-3f2a...`.
    ///
    /// Anki splits tags on whitespace, so any whitespace in an explicit id
    /// becomes `_`.
    pub fn tag(&self) -> String {
        let sanitized: String = self
            .0
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("{}{}", IDENTITY_TAG_PREFIX, sanitized)
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(16) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw front and back text extracted from a template document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub front: String,
    pub back: String,
}

/// A template rendered to Anki field HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationCard {
    pub front: String,
    pub back: String,
    /// Media filenames substituted into the fields, in reference order.
    /// In a dry run these were located but not uploaded.
    pub assets: Vec<String>,
}

/// Why a document was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No Front:/Back: markers.
    NoTemplate,
    /// Markers present but one side is empty.
    EmptySection,
    /// Identity could not be derived.
    NoIdentity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTemplate => f.write_str("no Front:/Back: template found"),
            Self::EmptySection => f.write_str("Front: or Back: section is empty"),
            Self::NoIdentity => f.write_str("could not derive an identity"),
        }
    }
}

/// Change a dry run would have made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "note_id", rename_all = "snake_case")]
pub enum PlannedChange {
    Create,
    Update(NoteId),
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created(NoteId),
    Updated(NoteId),
    Skipped(SkipReason),
    Errored(String),
    Planned(PlannedChange),
}

/// One entry of the processed-files log.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// See [`PresentationCard::assets`].
    pub assets: Vec<String>,
    pub outcome: SyncOutcome,
}

/// Aggregated result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub deck: String,
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
    pub planned_creates: usize,
    pub planned_updates: usize,
    pub documents: Vec<DocumentReport>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(deck: impl Into<String>, dry_run: bool) -> Self {
        Self {
            deck: deck.into(),
            dry_run,
            created: 0,
            updated: 0,
            skipped: 0,
            errored: 0,
            planned_creates: 0,
            planned_updates: 0,
            documents: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append a document's outcome and bump the matching counter.
    pub fn record(&mut self, report: DocumentReport) {
        match report.outcome {
            SyncOutcome::Created(_) => self.created += 1,
            SyncOutcome::Updated(_) => self.updated += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Errored(_) => self.errored += 1,
            SyncOutcome::Planned(PlannedChange::Create) => self.planned_creates += 1,
            SyncOutcome::Planned(PlannedChange::Update(_)) => self.planned_updates += 1,
        }
        self.documents.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Notes created or updated.
    pub fn synced(&self) -> usize {
        self.created + self.updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: SyncOutcome) -> DocumentReport {
        DocumentReport {
            path: "anki/card.md".to_string(),
            identity: None,
            assets: vec![],
            outcome,
        }
    }

    #[test]
    fn identity_tag_has_prefix() {
        let id = Identity::new("abc123");
        assert_eq!(id.tag(), "obsidian-id-abc123");
    }

    #[test]
    fn identity_tag_replaces_whitespace() {
        let id = Identity::new("my card id");
        assert_eq!(id.tag(), "obsidian-id-my_card_id");
    }

    #[test]
    fn identity_short_truncates() {
        let id = Identity::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789abcdef");
        assert_eq!(Identity::new("abc").short(), "abc");
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = RunSummary::new("Deck", false);
        summary.record(report(SyncOutcome::Created(1)));
        summary.record(report(SyncOutcome::Updated(2)));
        summary.record(report(SyncOutcome::Updated(3)));
        summary.record(report(SyncOutcome::Skipped(SkipReason::NoTemplate)));
        summary.record(report(SyncOutcome::Errored("boom".into())));
        summary.record(report(SyncOutcome::Planned(PlannedChange::Create)));

        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.planned_creates, 1);
        assert_eq!(summary.synced(), 3);
        assert_eq!(summary.documents.len(), 6);
    }
}
