//! Provider trait and wire-level types.
//!
//! The `HistoryProvider` trait abstracts over the remote data source so the
//! resolver and orchestrator can run against mocks in tests. The concrete
//! Twelve Data client lives in [`crate::twelve_data`].

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::chunks::DateRange;

/// One raw daily record exactly as the provider sends it.
///
/// The wire format encodes every field as a string, prices included;
/// validation and typing happen in the dataset merger.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPoint {
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

/// Structured error types for remote fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider rejected the request: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Trait for daily-history providers.
///
/// Implementations own throttling and retries; callers see only the final
/// outcome of a logical request.
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// First calendar date for which the provider has data for `symbol`.
    fn earliest_available(&self, symbol: &str) -> Result<NaiveDate, FetchError>;

    /// Daily records for `symbol` over an inclusive date range, ascending.
    fn time_series(&self, symbol: &str, range: DateRange) -> Result<Vec<RawPoint>, FetchError>;
}
