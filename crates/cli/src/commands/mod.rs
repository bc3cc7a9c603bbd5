//! CLI commands for the trade journal.

pub mod import_options;
pub mod reports;
pub mod serve;
pub mod users;

pub use import_options::{run_import_options, ImportOptionsArgs};
pub use reports::{run_margin_interest, run_performance, MarginInterestArgs, PerformanceArgs};
pub use serve::{run_migrate, run_serve, ServeArgs};
pub use users::{run_create_user, run_reset_password, CreateUserArgs, ResetPasswordArgs};

use anyhow::{anyhow, Result};
use trade_journal_core::AppConfig;
use trade_journal_data::{Database, Repositories, UserRecord};

/// Opens the configured database; migrations run as part of connecting.
pub(crate) async fn open_database(config: &AppConfig) -> Result<Database> {
    Database::connect(&config.database.url, config.database.max_connections).await
}

pub(crate) async fn find_user(repos: &Repositories, email: &str) -> Result<UserRecord> {
    repos
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| anyhow!("No user with email {}", email.trim()))
}
