//! Import option trades from a broker CSV export.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use trade_journal_core::AppConfig;
use trade_journal_data::{ImportSummary, OptionCsvImporter, Repositories};

use super::{find_user, open_database};

/// Arguments for the import-options command.
#[derive(Args, Debug, Clone)]
pub struct ImportOptionsArgs {
    /// Owner of the imported trades
    #[arg(long)]
    pub email: String,

    /// CSV file with an `underlying,option_type,side,...` header
    #[arg(short, long)]
    pub file: PathBuf,
}

/// Parses the CSV and imports each row for the user, skipping duplicates.
///
/// # Errors
/// Returns an error if the user is unknown or the file cannot be read.
pub async fn run_import_options(args: ImportOptionsArgs, config: AppConfig) -> Result<()> {
    let parsed = OptionCsvImporter::parse_file(&args.file)?;
    tracing::info!(
        file = %args.file.display(),
        rows = parsed.rows.len(),
        rejected = parsed.rejected.len(),
        "Parsed option CSV"
    );

    let db = open_database(&config).await?;
    let repos = Repositories::new(db.pool().clone());
    let user = find_user(&repos, &args.email).await?;

    let mut summary = repos.options.import(user.id, parsed.rows).await?;
    summary.record_rejected(parsed.rejected);

    print_summary(&summary, &user.email);

    db.close().await;
    Ok(())
}

fn print_summary(summary: &ImportSummary, email: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("OPTION IMPORT FOR {email}");
    println!("{}", "=".repeat(60));
    println!("  Imported: {:>8}", summary.imported);
    println!("  Skipped:  {:>8}  (already recorded)", summary.skipped);
    println!("  Failed:   {:>8}", summary.failed);

    if !summary.errors.is_empty() {
        println!("{}", "-".repeat(60));
        for error in &summary.errors {
            println!("  {error}");
        }
    }
    println!("{}", "=".repeat(60));
}
