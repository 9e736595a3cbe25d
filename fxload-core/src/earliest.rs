//! Earliest-available-date cache and resolver.
//!
//! The provider knows how far back each symbol's history goes, but asking
//! costs a quota ticket, so answers are cached in one shared JSON document
//! and treated as append-only truth once written. A resolution failure falls
//! back to a conservative sentinel instead of failing the symbol: planning
//! then simply issues some windows that come back empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::dataset::backup_path;
use crate::provider::HistoryProvider;

/// Start bound used when the earliest-timestamp endpoint cannot be reached.
pub fn fallback_earliest() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

/// Persistent symbol → earliest-date cache, one JSON document shared across
/// all symbols.
pub struct EarliestDates {
    path: PathBuf,
}

impl EarliestDates {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached earliest date for a symbol, if any.
    pub fn get(&self, symbol: &str) -> Option<NaiveDate> {
        self.read_map().get(symbol).copied()
    }

    /// Record a symbol's earliest date, preserving every other entry.
    ///
    /// The whole document is read, modified, and atomically rewritten.
    pub fn insert(&self, symbol: &str, date: NaiveDate) -> std::io::Result<()> {
        let mut map = self.read_map();
        map.insert(symbol.to_string(), date);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&map).expect("date map serialization failed");
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }

    /// Full cache content. An unparseable file is moved to a timestamped
    /// backup and treated as empty.
    fn read_map(&self) -> BTreeMap<String, NaiveDate> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                eprintln!(
                    "WARNING: quarantining unparseable earliest-date cache {}: {e}",
                    self.path.display()
                );
                let _ = fs::rename(&self.path, backup_path(&self.path));
                BTreeMap::new()
            }
        }
    }
}

/// Resolve the first date the provider has data for `symbol`.
///
/// Cache hit → no network call. Miss → ask the provider and cache the
/// answer. Fetch failure → [`fallback_earliest`], deliberately not cached so
/// a later run retries the endpoint.
pub fn resolve_earliest(
    cache: &EarliestDates,
    provider: &dyn HistoryProvider,
    symbol: &str,
) -> NaiveDate {
    if let Some(date) = cache.get(symbol) {
        return date;
    }

    match provider.earliest_available(symbol) {
        Ok(date) => {
            if let Err(e) = cache.insert(symbol, date) {
                eprintln!("WARNING: could not update earliest-date cache: {e}");
            }
            date
        }
        Err(e) => {
            eprintln!(
                "WARNING: earliest date for {symbol} unavailable ({e}); assuming {}",
                fallback_earliest()
            );
            fallback_earliest()
        }
    }
}
