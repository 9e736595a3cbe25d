//! Ingestion orchestrator.
//!
//! Drives the pipeline for a catalog of symbols, strictly sequentially:
//! resolve the earliest date, plan request windows, fetch each window
//! through the shared throttle, merge into the on-disk dataset. A failed
//! window costs its points but not the symbol; a symbol fails only when the
//! whole span produced nothing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chunks::plan_chunks;
use crate::dataset::DatasetStore;
use crate::earliest::{resolve_earliest, EarliestDates};
use crate::provider::{HistoryProvider, RawPoint};

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Working requests-per-minute budget, kept below the plan's hard limit.
    pub requests_per_minute: usize,
    /// Maximum daily bars the provider returns per call.
    pub max_points_per_request: u32,
    /// Spacing sleep between a symbol's request windows.
    pub chunk_pause: Duration,
    /// Spacing sleep between symbols.
    pub symbol_pause: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: 7,
            max_points_per_request: 5000,
            chunk_pause: Duration::from_millis(500),
            symbol_pause: Duration::from_secs(1),
        }
    }
}

/// Per-symbol result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Success { points_written: usize },
    Failure { reason: String },
}

/// Progress callbacks for a run.
pub trait IngestProgress {
    /// Called when starting a symbol.
    fn on_symbol_start(&self, symbol: &str, index: usize, total: usize);

    /// Called after each successfully fetched request window.
    fn on_chunk_fetched(&self, symbol: &str, chunk: usize, total_chunks: usize, points: usize);

    /// Called when a symbol finishes, either way.
    fn on_symbol_complete(&self, symbol: &str, index: usize, total: usize, outcome: &LoadOutcome);

    /// Called once after the last symbol.
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl IngestProgress for StdoutProgress {
    fn on_symbol_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Loading {symbol}...", index + 1, total);
    }

    fn on_chunk_fetched(&self, symbol: &str, chunk: usize, total_chunks: usize, points: usize) {
        println!("  {symbol}: window {chunk}/{total_chunks}, {points} points");
    }

    fn on_symbol_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        outcome: &LoadOutcome,
    ) {
        match outcome {
            LoadOutcome::Success { points_written } => {
                println!("  OK: {symbol} ({points_written} points written)");
            }
            LoadOutcome::Failure { reason } => println!("  FAIL: {symbol}: {reason}"),
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!(
            "\nLoad complete: {}/{} succeeded, {} failed",
            summary.succeeded, summary.total_symbols, summary.failed
        );
        if !summary.failed_symbols.is_empty() {
            println!("Failed: {}", summary.failed_symbols.join(", "));
        }
    }
}

/// Settings block echoed into the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedSettings {
    pub requests_per_minute: usize,
    pub max_points_per_request: u32,
    pub interval: String,
}

/// Aggregate result of one run, written once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub total_symbols: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_symbols: Vec<String>,
    pub settings: ReportedSettings,
}

/// Run the pipeline for every symbol, in catalog order.
pub fn ingest_symbols(
    provider: &dyn HistoryProvider,
    earliest_cache: &EarliestDates,
    store: &DatasetStore,
    symbols: &[&str],
    as_of: NaiveDate,
    settings: &IngestSettings,
    progress: &dyn IngestProgress,
) -> RunSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed_symbols: Vec<String> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_symbol_start(symbol, i, total);

        let outcome = load_symbol(
            provider,
            earliest_cache,
            store,
            symbol,
            as_of,
            settings,
            progress,
        );
        match &outcome {
            LoadOutcome::Success { .. } => succeeded += 1,
            LoadOutcome::Failure { .. } => failed_symbols.push(symbol.to_string()),
        }
        progress.on_symbol_complete(symbol, i, total, &outcome);

        if i + 1 < total {
            std::thread::sleep(settings.symbol_pause);
        }
    }

    let summary = RunSummary {
        timestamp: chrono::Local::now().to_rfc3339(),
        total_symbols: total,
        succeeded,
        failed: failed_symbols.len(),
        failed_symbols,
        settings: ReportedSettings {
            requests_per_minute: settings.requests_per_minute,
            max_points_per_request: settings.max_points_per_request,
            interval: crate::twelve_data::INTERVAL.to_string(),
        },
    };

    progress.on_run_complete(&summary);
    summary
}

/// One symbol: resolve earliest → plan windows → fetch → merge.
fn load_symbol(
    provider: &dyn HistoryProvider,
    earliest_cache: &EarliestDates,
    store: &DatasetStore,
    symbol: &str,
    as_of: NaiveDate,
    settings: &IngestSettings,
    progress: &dyn IngestProgress,
) -> LoadOutcome {
    let earliest = resolve_earliest(earliest_cache, provider, symbol);
    let plan = plan_chunks(earliest, as_of, settings.max_points_per_request);
    let total_chunks = plan.total();

    let mut collected: Vec<RawPoint> = Vec::new();
    for (ci, window) in plan.enumerate() {
        match provider.time_series(symbol, window) {
            Ok(points) => {
                progress.on_chunk_fetched(symbol, ci + 1, total_chunks, points.len());
                collected.extend(points);
            }
            Err(e) => {
                eprintln!(
                    "WARNING: window {}/{total_chunks} failed for {symbol}: {e}",
                    ci + 1
                );
            }
        }

        if ci + 1 < total_chunks {
            std::thread::sleep(settings.chunk_pause);
        }
    }

    if collected.is_empty() {
        return LoadOutcome::Failure {
            reason: "no data in any request window".into(),
        };
    }

    match store.merge(symbol, &collected) {
        Ok(report) => LoadOutcome::Success {
            points_written: report.written(),
        },
        Err(e) => LoadOutcome::Failure {
            reason: e.to_string(),
        },
    }
}

/// Write the run summary as `load_summary_{YYYYmmdd_HHMM}.json`.
pub fn save_summary(summary: &RunSummary, reports_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M");
    let path = reports_dir.join(format!("load_summary_{stamp}.json"));
    let json = serde_json::to_string_pretty(summary).expect("summary serialization failed");

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}
