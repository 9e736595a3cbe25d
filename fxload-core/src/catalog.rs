//! Pair catalog — grouped lists of tradable FX symbols.
//!
//! The catalog is a TOML file of named groups (Major, Minor, ...) and their
//! member pairs. Groups iterate in name order and pairs keep their file
//! order, so the run order over a given catalog is always the same.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The complete pair catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read catalog file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse catalog TOML: {e}"))
    }

    /// Every pair across all groups, in stable order.
    pub fn all_symbols(&self) -> Vec<&str> {
        self.groups
            .values()
            .flat_map(|pairs| pairs.iter().map(|p| p.as_str()))
            .collect()
    }

    /// Names of the groups in the catalog.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(|g| g.as_str()).collect()
    }

    /// Total number of pairs.
    pub fn symbol_count(&self) -> usize {
        self.groups.values().map(|v| v.len()).sum()
    }

    /// Built-in default: the major pairs plus a spread of minors.
    pub fn default_fx() -> Self {
        let mut groups = BTreeMap::new();

        groups.insert(
            "Major".into(),
            vec![
                "EUR/USD", "GBP/USD", "USD/JPY", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        groups.insert(
            "Minor".into(),
            vec![
                "EUR/GBP", "EUR/JPY", "EUR/CHF", "GBP/JPY", "AUD/JPY", "CHF/JPY", "AUD/NZD",
                "USD/RUB",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        Self { groups }
    }

    /// Serialize the catalog to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize catalog: {e}"))
    }
}
