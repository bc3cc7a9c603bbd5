//! Web server and migration commands.

use anyhow::Result;
use clap::Args;
use trade_journal_core::AppConfig;
use trade_journal_web_api::{ApiServer, AppState};

use super::open_database;

/// Arguments for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address; defaults to `server.host:server.port` from config
    #[arg(short, long)]
    pub addr: Option<String>,
}

/// Connects, migrates, and serves the HTTP API until the process is stopped.
///
/// # Errors
/// Returns an error if the database cannot be opened or the address cannot be bound.
pub async fn run_serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let addr = args.addr.unwrap_or_else(|| config.server.addr());

    if config.auth.token_secret == AppConfig::default().auth.token_secret {
        tracing::warn!("auth.token_secret is the built-in default; set APP_AUTH__TOKEN_SECRET");
    }

    let db = open_database(&config).await?;
    let state = AppState::new(db, config);
    if state.repos.users.count().await? == 0 {
        tracing::warn!("No accounts yet; bootstrap one with `trade-journal create-user --admin`");
    }

    tracing::info!("Starting web API server on {}", addr);
    ApiServer::new(state).serve(&addr).await
}

/// Applies pending migrations and exits. Opening the database runs them.
///
/// # Errors
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn run_migrate(config: AppConfig) -> Result<()> {
    let db = open_database(&config).await?;
    println!("Migrations applied to {}", config.database.url);
    db.close().await;
    Ok(())
}
