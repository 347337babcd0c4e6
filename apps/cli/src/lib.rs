pub mod anki;
pub mod cli;
pub mod report;

use clap::Parser;
use dialoguer::Confirm;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_anki_core::{CardStore, SyncOrchestrator};

use crate::anki::AnkiConnect;
use crate::cli::Args;

/// Checks made before the user is asked to confirm: the cards folder first,
/// then the AnkiConnect connection. Returns the API version.
pub async fn preflight<S: CardStore>(orchestrator: &SyncOrchestrator<S>) -> vault_anki_core::Result<u32> {
    orchestrator.check_source()?;
    orchestrator.check_connection().await
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.export_config();

    tracing::info!(url = %args.url, "connecting to AnkiConnect...");
    let orchestrator = SyncOrchestrator::new(AnkiConnect::new(&args.url), config);
    let version = preflight(&orchestrator).await?;
    tracing::debug!(version, "AnkiConnect is reachable");

    if args.needs_confirmation() {
        let prompt = format!(
            "Export cards from {} to deck \"{}\"?",
            orchestrator.config().cards_dir().display(),
            orchestrator.config().deck
        );
        let proceed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;
        if !proceed {
            println!("Sync cancelled.");
            return Ok(());
        }
    }

    let summary = orchestrator.run(args.dry_run).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report::format_summary(&summary));
    }

    Ok(())
}
