//! Human-readable run summary.

use std::fmt::Write as _;

use vault_anki_core::{RunSummary, SyncOutcome};

pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    if summary.dry_run {
        let _ = writeln!(out, "Dry run for deck \"{}\" (nothing was written)", summary.deck);
        let _ = writeln!(out, "  would create: {}", summary.planned_creates);
        let _ = writeln!(out, "  would update: {}", summary.planned_updates);
    } else {
        let _ = writeln!(out, "Synced {} notes to deck \"{}\"", summary.synced(), summary.deck);
        let _ = writeln!(out, "  created: {}", summary.created);
        let _ = writeln!(out, "  updated: {}", summary.updated);
    }
    let _ = writeln!(out, "  skipped: {}", summary.skipped);
    let _ = writeln!(out, "  errors:  {}", summary.errored);

    let problems: Vec<_> = summary
        .documents
        .iter()
        .filter_map(|doc| match &doc.outcome {
            SyncOutcome::Skipped(reason) => Some((&doc.path, "skipped", reason.to_string())),
            SyncOutcome::Errored(message) => Some((&doc.path, "error", message.clone())),
            _ => None,
        })
        .collect();

    if !problems.is_empty() {
        out.push('\n');
        for (path, kind, detail) in problems {
            let _ = writeln!(out, "  [{}] {}: {}", kind, path, detail);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vault_anki_core::{DocumentReport, PlannedChange, SkipReason};

    fn doc(path: &str, outcome: SyncOutcome) -> DocumentReport {
        DocumentReport {
            path: path.to_string(),
            identity: None,
            assets: vec![],
            outcome,
        }
    }

    #[test]
    fn live_run_lists_problems() {
        let mut summary = RunSummary::new("Obsidian Notes", false);
        summary.record(doc("anki/a.md", SyncOutcome::Created(1)));
        summary.record(doc("anki/b.md", SyncOutcome::Updated(2)));
        summary.record(doc("anki/c.md", SyncOutcome::Skipped(SkipReason::NoTemplate)));
        summary.record(doc("anki/d.md", SyncOutcome::Errored("deck missing".into())));

        assert_eq!(
            format_summary(&summary),
            "Synced 2 notes to deck \"Obsidian Notes\"\n\
             \x20 created: 1\n\
             \x20 updated: 1\n\
             \x20 skipped: 1\n\
             \x20 errors:  1\n\
             \n\
             \x20 [skipped] anki/c.md: no Front:/Back: template found\n\
             \x20 [error] anki/d.md: deck missing\n"
        );
    }

    #[test]
    fn dry_run_reports_planned_counts() {
        let mut summary = RunSummary::new("Deck", true);
        summary.record(doc("anki/a.md", SyncOutcome::Planned(PlannedChange::Create)));
        summary.record(doc("anki/b.md", SyncOutcome::Planned(PlannedChange::Update(7))));

        let text = format_summary(&summary);
        assert!(text.starts_with("Dry run for deck \"Deck\""));
        assert!(text.contains("would create: 1"));
        assert!(text.contains("would update: 1"));
        assert!(!text.contains('['));
    }
}
