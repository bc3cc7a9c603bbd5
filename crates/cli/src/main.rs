use anyhow::Context;
use clap::{Parser, Subcommand};
use trade_journal_core::{AppConfig, ConfigLoader};

mod commands;

use commands::{
    CreateUserArgs, ImportOptionsArgs, MarginInterestArgs, PerformanceArgs, ResetPasswordArgs,
    ServeArgs,
};

#[derive(Parser)]
#[command(name = "trade-journal")]
#[command(about = "Multi-tenant trade journal: web API and maintenance tools", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web API server
    Serve(ServeArgs),
    /// Apply database migrations
    Migrate,
    /// Create a user account
    CreateUser(CreateUserArgs),
    /// Overwrite a user's password
    ResetPassword(ResetPasswordArgs),
    /// Import option trades from CSV for a user
    ImportOptions(ImportOptionsArgs),
    /// Print a user's time-weighted return report
    Performance(PerformanceArgs),
    /// Estimate margin interest on a loan over a date range
    MarginInterest(MarginInterestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Migrate => commands::run_migrate(config).await?,
        Commands::CreateUser(args) => commands::run_create_user(args, config).await?,
        Commands::ResetPassword(args) => commands::run_reset_password(args, config).await?,
        Commands::ImportOptions(args) => commands::run_import_options(args, config).await?,
        Commands::Performance(args) => commands::run_performance(args, config).await?,
        Commands::MarginInterest(args) => commands::run_margin_interest(args, config).await?,
    }

    Ok(())
}

/// Loads configuration. A missing file leaves the built-in defaults in place;
/// a file that fails to parse is an error.
fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    let config = ConfigLoader::load_from(path)
        .with_context(|| format!("Failed to load configuration from {path}"))?;
    tracing::debug!(path, "Loaded configuration");
    Ok(config)
}
