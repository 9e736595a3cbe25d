//! fxload core — historical FX pair ingestion engine.
//!
//! Everything between the provider's HTTP surface and the on-disk datasets:
//! - Sliding-window quota governor shared by every remote call
//! - Twelve Data fetch client with an explicit retry policy
//! - Earliest-available-date resolver backed by a persistent cache
//! - Request-window (chunk) planner
//! - Per-pair CSV dataset store with idempotent merge and corruption quarantine
//! - Sequential ingestion orchestrator and per-run summaries

pub mod catalog;
pub mod chunks;
pub mod dataset;
pub mod earliest;
pub mod ingest;
pub mod provider;
pub mod throttle;
pub mod twelve_data;

pub use catalog::Catalog;
pub use chunks::{plan_chunks, ChunkPlan, DateRange};
pub use dataset::{DatasetStore, MergeReport, PriceRecord, StoreError};
pub use earliest::{fallback_earliest, resolve_earliest, EarliestDates};
pub use ingest::{
    ingest_symbols, save_summary, IngestProgress, IngestSettings, LoadOutcome, RunSummary,
    StdoutProgress,
};
pub use provider::{FetchError, HistoryProvider, RawPoint};
pub use throttle::QuotaGovernor;
pub use twelve_data::{RetryPolicy, TwelveDataProvider, INTERVAL};
