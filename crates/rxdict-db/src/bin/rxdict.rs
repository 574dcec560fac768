//! # rxdict Command-Line Tool
//!
//! Maintenance commands against a local drug dictionary database.
//!
//! ## Usage
//! ```bash
//! # Import a spreadsheet exported as CSV
//! cargo run -p rxdict-db --bin rxdict -- import drugs.csv
//!
//! # Export everything
//! cargo run -p rxdict-db --bin rxdict -- export -o dictionary.csv
//!
//! # Aggregates over the last week
//! cargo run -p rxdict-db --bin rxdict -- stats --since-days 7
//!
//! # Map a medicine name to its generic name
//! cargo run -p rxdict-db --bin rxdict -- resolve lipitor
//!
//! # Pick a database file (or set DATABASE_PATH)
//! cargo run -p rxdict-db --bin rxdict -- --db ./data/dict.db search amox
//! ```

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rxdict_core::{BatchReport, NormalizeRules, RowOutcome, DEFAULT_MAX_FIELD_LENGTH};
use rxdict_db::import::{import_rows, ProgressLogger};
use rxdict_db::query::{self, DEFAULT_STATS_PERIOD_DAYS};
use rxdict_db::{export, tabular, Database, DbConfig};

#[derive(Parser)]
#[command(name = "rxdict")]
#[command(about = "Drug dictionary maintenance tool")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "./drug_dictionary.db")]
    db: PathBuf,

    /// Maximum characters per field
    #[arg(long, env = "RXDICT_MAX_FIELD_LENGTH", default_value_t = DEFAULT_MAX_FIELD_LENGTH)]
    max_field_length: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import drugs from a CSV file with a header row
    Import {
        /// CSV file to read
        file: PathBuf,

        /// Log progress every N rows
        #[arg(long, default_value = "100")]
        progress_every: usize,
    },

    /// Export all drugs as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show aggregate counts
    Stats {
        /// Look-back window for "recently added"
        #[arg(long, default_value_t = DEFAULT_STATS_PERIOD_DAYS)]
        since_days: u32,
    },

    /// Search brand names and manufacturers
    Search {
        term: String,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Resolve a brand or generic name to dictionary entries
    Resolve { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let db = Database::new(DbConfig::new(&cli.db))
        .await
        .with_context(|| format!("opening database {}", cli.db.display()))?;

    let rules = NormalizeRules::new(cli.max_field_length);
    let result = match cli.command {
        Commands::Import {
            file,
            progress_every,
        } => handle_import(&db, &file, &rules, progress_every).await,
        Commands::Export { output } => handle_export(&db, output).await,
        Commands::Stats { since_days } => handle_stats(&db, since_days).await,
        Commands::Search { term, limit } => handle_search(&db, &term, limit).await,
        Commands::Resolve { name } => handle_resolve(&db, &name).await,
    };

    db.close().await;
    result
}

async fn handle_import(
    db: &Database,
    path: &Path,
    rules: &NormalizeRules,
    progress_every: usize,
) -> Result<ExitCode> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = tabular::read_csv(file).with_context(|| format!("reading {}", path.display()))?;

    println!("Importing {} rows from {}", rows.len(), path.display());

    let start = Instant::now();
    let observer = ProgressLogger::new(progress_every, rows.len());
    let report = import_rows(&db.drugs(), &rows, rules, &observer).await;

    for outcome in report.failures() {
        if let RowOutcome::Failed { row, reason } = outcome {
            eprintln!("  row {row}: {reason}");
        }
    }

    println!();
    println!("Total rows:  {}", report.total_rows);
    println!("Inserted:    {}", report.inserted_count);
    println!("Duplicates:  {}", report.skipped_count);
    println!("Failed:      {}", report.failed_count);
    println!("Elapsed:     {:?}", start.elapsed());

    if import_failed(&report) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// A batch fails when rows were rejected and none made it in. Re-imports
/// where every row is a duplicate succeed.
fn import_failed(report: &BatchReport) -> bool {
    report.failed_count > 0 && report.inserted_count == 0
}

async fn handle_export(db: &Database, output: Option<PathBuf>) -> Result<ExitCode> {
    let written = match output {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let written = export::write_csv(&db.drugs(), BufWriter::new(file)).await?;
            eprintln!("Wrote {} drugs to {}", written, path.display());
            written
        }
        None => export::write_csv(&db.drugs(), io::stdout().lock()).await?,
    };

    tracing::debug!(written, "Export finished");
    Ok(ExitCode::SUCCESS)
}

async fn handle_stats(db: &Database, since_days: u32) -> Result<ExitCode> {
    let stats = query::stats(&db.drugs(), query::period_start(since_days)).await?;

    println!("Total records:          {}", stats.total_records);
    println!("Distinct manufacturers: {}", stats.distinct_manufacturers);
    println!(
        "Added in last {} days:   {}",
        since_days, stats.records_added_since
    );
    for (title, counts) in [("By form:", &stats.forms), ("By category:", &stats.categories)] {
        if counts.is_empty() {
            continue;
        }
        println!("{title}");
        for (value, count) in counts {
            println!("  {value:<22}{count}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_search(db: &Database, term: &str, limit: Option<u32>) -> Result<ExitCode> {
    let results = query::search(&db.drugs(), term, limit).await?;

    for drug in &results {
        println!(
            "{}  {} ({}){}",
            drug.id,
            drug.brand_name,
            drug.manufacturer,
            drug.generic_name
                .as_deref()
                .map(|g| format!(" - {g}"))
                .unwrap_or_default()
        );
    }
    println!("{} result(s)", results.len());
    Ok(ExitCode::SUCCESS)
}

async fn handle_resolve(db: &Database, name: &str) -> Result<ExitCode> {
    let resolution = query::resolve_name(&db.drugs(), name).await?;

    let Some(best) = &resolution.best_match else {
        println!("No matching drug found for {:?}", resolution.original_name);
        return Ok(ExitCode::FAILURE);
    };

    println!("Best match: {best}");
    for candidate in &resolution.matches {
        println!(
            "  {}  {} -> {}",
            candidate.id, candidate.brand_name, candidate.resolved_name
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(inserted: usize, skipped: usize, failed: usize) -> BatchReport {
        BatchReport {
            total_rows: inserted + skipped + failed,
            inserted_count: inserted,
            skipped_count: skipped,
            failed_count: failed,
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn test_import_failed() {
        assert!(!import_failed(&report(0, 0, 0)));
        assert!(!import_failed(&report(0, 3, 0)));
        assert!(!import_failed(&report(2, 0, 1)));
        assert!(import_failed(&report(0, 1, 2)));
    }

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::try_parse_from(["rxdict", "--db", "x.db", "resolve", "lipitor"]).unwrap();
        assert!(matches!(cli.command, Commands::Resolve { name } if name == "lipitor"));
    }
}
