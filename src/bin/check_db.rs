//! Connects to `DATABASE_URL`, runs one query and exits.

use anyhow::Context;
use portfolio_auth::db::Database;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => {
            tracing::info!("database reachable");
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = ?e, "database check failed");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not defined")?;
    let db = Database::new(url, 1);
    db.ping().await?;
    db.close().await;
    Ok(())
}
