//! fxload CLI — historical FX pair history loader.
//!
//! Commands:
//! - `load` — pull full daily history for every catalog pair from the
//!   provider and merge it into per-pair CSV datasets
//! - `status` — report per-pair dataset coverage on disk

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fxload_core::{
    ingest_symbols, save_summary, Catalog, DatasetStore, EarliestDates, HistoryProvider,
    IngestSettings, QuotaGovernor, StdoutProgress, TwelveDataProvider,
};

#[derive(Parser)]
#[command(name = "fxload", about = "fxload — historical FX pair history loader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull daily history for every catalog pair into per-pair CSV datasets.
    Load {
        /// Catalog TOML file. Defaults to the built-in pair set.
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Dataset directory.
        #[arg(long, default_value = "data/pairs")]
        data_dir: PathBuf,

        /// Metadata directory (earliest-date cache).
        #[arg(long, default_value = "data/metadata")]
        metadata_dir: PathBuf,

        /// Directory for run summary reports.
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,

        /// Working requests-per-minute budget.
        #[arg(long, default_value_t = 7)]
        rpm: usize,

        /// Maximum daily bars per provider call.
        #[arg(long, default_value_t = 5000)]
        max_points: u32,

        /// Load history up to this date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Report per-pair dataset coverage.
    Status {
        /// Dataset directory.
        #[arg(long, default_value = "data/pairs")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Load {
            catalog,
            data_dir,
            metadata_dir,
            reports_dir,
            rpm,
            max_points,
            as_of,
        } => run_load(
            catalog,
            data_dir,
            metadata_dir,
            reports_dir,
            rpm,
            max_points,
            as_of,
        ),
        Commands::Status { data_dir } => run_status(&data_dir),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_load(
    catalog: Option<PathBuf>,
    data_dir: PathBuf,
    metadata_dir: PathBuf,
    reports_dir: PathBuf,
    rpm: usize,
    max_points: u32,
    as_of: Option<String>,
) -> Result<()> {
    // Startup conditions are the only fatal ones; per-pair failures land in
    // the summary and never change the exit code.
    let api_key = std::env::var("TWELVE_DATA_API_KEY")
        .context("TWELVE_DATA_API_KEY is not set (export it or add it to a .env file)")?;

    let catalog = match catalog {
        Some(path) => Catalog::from_file(&path).map_err(|e| anyhow::anyhow!(e))?,
        None => Catalog::default_fx(),
    };
    let symbols = catalog.all_symbols();
    if symbols.is_empty() {
        bail!("the pair catalog is empty");
    }

    let as_of_date = as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let settings = IngestSettings {
        requests_per_minute: rpm,
        max_points_per_request: max_points,
        ..IngestSettings::default()
    };

    let governor = Arc::new(QuotaGovernor::per_minute(settings.requests_per_minute));
    let provider = TwelveDataProvider::new(api_key, governor);
    let earliest_cache = EarliestDates::new(metadata_dir.join("earliest_dates.json"));
    let store = DatasetStore::new(&data_dir);

    println!(
        "Loading {} pairs through {} as of {as_of_date} ({} req/min, {}-point windows)",
        symbols.len(),
        provider.name(),
        settings.requests_per_minute,
        settings.max_points_per_request,
    );

    let summary = ingest_symbols(
        &provider,
        &earliest_cache,
        &store,
        &symbols,
        as_of_date,
        &settings,
        &StdoutProgress,
    );

    let report_path = save_summary(&summary, &reports_dir)?;
    println!("Summary saved to: {}", report_path.display());

    Ok(())
}

fn run_status(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        println!("Dataset directory does not exist: {}", data_dir.display());
        return Ok(());
    }

    let store = DatasetStore::new(data_dir);
    let mut rows: Vec<(String, usize, String)> = Vec::new();

    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(pair) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match store.load(pair) {
            Ok(records) if !records.is_empty() => {
                let range = format!(
                    "{} to {}",
                    records.first().unwrap().date,
                    records.last().unwrap().date
                );
                rows.push((pair.to_string(), records.len(), range));
            }
            Ok(_) => rows.push((pair.to_string(), 0, "(empty)".into())),
            Err(e) => rows.push((pair.to_string(), 0, format!("(unreadable: {e})"))),
        }
    }

    if rows.is_empty() {
        println!("No datasets in {}", data_dir.display());
        return Ok(());
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{:<10} {:>8}  {}", "Pair", "Rows", "Date Range");
    println!("{}", "-".repeat(48));
    for (pair, count, range) in &rows {
        println!("{:<10} {:>8}  {}", pair, count, range);
    }

    Ok(())
}
