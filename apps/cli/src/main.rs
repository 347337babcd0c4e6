#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vault_anki_cli::run().await
}
