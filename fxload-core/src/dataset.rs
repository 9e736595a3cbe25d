//! Per-pair CSV datasets.
//!
//! One file per symbol, header `date,open,high,low,close`, ascending by
//! date, no duplicate dates. A merge never appends in place: the union of
//! old and new rows is rewritten through a temp file and renamed into place,
//! so a killed process leaves the previous committed file intact. A file
//! that exists but cannot be parsed is renamed to a timestamped backup and
//! rebuilt from the incoming points — corruption never aborts a run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::RawPoint;

/// One validated dataset row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("dataset for '{symbol}' cannot be parsed: {reason}")]
    Corrupt { symbol: String, reason: String },

    #[error("no dataset on disk for '{symbol}'")]
    Missing { symbol: String },
}

/// What one merge call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Dates not previously in the dataset.
    pub added: usize,
    /// Dates that existed and were overwritten.
    pub updated: usize,
    /// Rows in the file after the merge.
    pub total: usize,
}

impl MergeReport {
    /// Points added-or-updated by this call — not the file size.
    pub fn written(&self) -> usize {
        self.added + self.updated
    }
}

/// CSV dataset store rooted at one directory.
pub struct DatasetStore {
    data_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Dataset path for a symbol: `EUR/USD` → `{data_dir}/EURUSD.csv`.
    pub fn dataset_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol.replace('/', "")))
    }

    /// Merge freshly fetched points into the on-disk dataset for `symbol`.
    ///
    /// Points whose date or prices do not parse are discarded with a
    /// warning, never a failure. Where old and new share a date, the new
    /// record wins. Re-merging the same points is a byte-for-byte no-op.
    pub fn merge(&self, symbol: &str, new_points: &[RawPoint]) -> Result<MergeReport, StoreError> {
        let mut incoming: BTreeMap<NaiveDate, PriceRecord> = BTreeMap::new();
        for point in new_points {
            match validate_point(point) {
                Some(record) => {
                    incoming.insert(record.date, record);
                }
                None => eprintln!(
                    "WARNING: discarding malformed point '{}' for {symbol}",
                    point.datetime
                ),
            }
        }

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::Io(format!("create {}: {e}", self.data_dir.display())))?;

        let path = self.dataset_path(symbol);
        let existing = load_or_quarantine(&path);

        let mut merged: BTreeMap<NaiveDate, PriceRecord> =
            existing.iter().map(|r| (r.date, *r)).collect();

        let mut added = 0;
        let mut updated = 0;
        for (date, record) in incoming {
            match merged.insert(date, record) {
                Some(_) => updated += 1,
                None => added += 1,
            }
        }

        write_rows(&path, merged.values())?;

        Ok(MergeReport {
            added,
            updated,
            total: merged.len(),
        })
    }

    /// Load a symbol's dataset, ascending by date.
    pub fn load(&self, symbol: &str) -> Result<Vec<PriceRecord>, StoreError> {
        let path = self.dataset_path(symbol);
        if !path.exists() {
            return Err(StoreError::Missing {
                symbol: symbol.to_string(),
            });
        }
        read_rows(&path).map_err(|reason| StoreError::Corrupt {
            symbol: symbol.to_string(),
            reason,
        })
    }
}

/// Parse one wire point into a typed row. `None` when the date or any price
/// fails to parse.
fn validate_point(point: &RawPoint) -> Option<PriceRecord> {
    let date = NaiveDate::parse_from_str(&point.datetime, "%Y-%m-%d").ok()?;
    Some(PriceRecord {
        date,
        open: point.open.parse().ok()?,
        high: point.high.parse().ok()?,
        low: point.low.parse().ok()?,
        close: point.close.parse().ok()?,
    })
}

/// Existing rows for a dataset path. An unparseable file is moved to a
/// timestamped backup and treated as absent.
fn load_or_quarantine(path: &Path) -> Vec<PriceRecord> {
    if !path.exists() {
        return Vec::new();
    }
    match read_rows(path) {
        Ok(rows) => rows,
        Err(reason) => {
            let backup = backup_path(path);
            eprintln!(
                "WARNING: quarantining unparseable dataset {}: {reason}",
                path.display()
            );
            if let Err(e) = fs::rename(path, &backup) {
                eprintln!("WARNING: could not move {} aside: {e}", path.display());
            }
            Vec::new()
        }
    }
}

fn read_rows(path: &Path) -> Result<Vec<PriceRecord>, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: PriceRecord = record.map_err(|e| e.to_string())?;
        rows.push(row);
    }
    Ok(rows)
}

/// Atomic rewrite: serialize to `.tmp`, rename into place.
fn write_rows<'a>(
    path: &Path,
    rows: impl Iterator<Item = &'a PriceRecord>,
) -> Result<(), StoreError> {
    let tmp = path.with_extension("csv.tmp");

    let mut writer =
        csv::Writer::from_path(&tmp).map_err(|e| StoreError::Csv(format!("open temp: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| StoreError::Csv(format!("write row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| StoreError::Io(format!("flush temp: {e}")))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(format!("atomic rename failed: {e}"))
    })
}

/// Backup name for a quarantined file: `EURUSD.csv.backup_20240131_0905`.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.backup_{stamp}"))
}
