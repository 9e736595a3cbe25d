//! Property tests for the dataset merger and the chunk planner.
//!
//! Uses proptest to verify:
//! 1. Merge idempotence — re-merging the same points is a byte-for-byte no-op
//! 2. No duplicate dates — every merged dataset is strictly ascending
//! 3. Chunk coverage — planned windows tile `[earliest, as_of]` exactly

use chrono::{Duration, NaiveDate};
use fxload_core::{plan_chunks, DatasetStore, RawPoint};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

/// A raw point somewhere in a ten-year span, with a four-decimal price.
fn arb_point() -> impl Strategy<Value = RawPoint> {
    (0i64..3650, 9_000u32..15_000).prop_map(|(offset, price_paise)| {
        let date = base_date() + Duration::days(offset);
        let price = format!("{:.4}", f64::from(price_paise) / 10_000.0);
        RawPoint {
            datetime: date.to_string(),
            open: price.clone(),
            high: price.clone(),
            low: price.clone(),
            close: price,
        }
    })
}

fn arb_points() -> impl Strategy<Value = Vec<RawPoint>> {
    prop::collection::vec(arb_point(), 0..25)
}

// ── 1 + 2. Merge idempotence and uniqueness ──────────────────────────

proptest! {
    /// For any prior dataset D and fetched set P, merging P twice leaves the
    /// same file as merging it once.
    #[test]
    fn merge_is_idempotent(existing in arb_points(), fetched in arb_points()) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        store.merge("EUR/USD", &existing).unwrap();
        store.merge("EUR/USD", &fetched).unwrap();
        let once = std::fs::read_to_string(store.dataset_path("EUR/USD")).unwrap();

        store.merge("EUR/USD", &fetched).unwrap();
        let twice = std::fs::read_to_string(store.dataset_path("EUR/USD")).unwrap();

        prop_assert_eq!(once, twice);
    }

    /// After any sequence of merges, no two rows share a date and rows are
    /// strictly ascending.
    #[test]
    fn merged_dataset_has_unique_ascending_dates(
        first in arb_points(),
        second in arb_points(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        store.merge("GBP/USD", &first).unwrap();
        store.merge("GBP/USD", &second).unwrap();

        let rows = match store.load("GBP/USD") {
            Ok(rows) => rows,
            // Both inputs may have been empty.
            Err(_) => return Ok(()),
        };
        for pair in rows.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    /// Into an empty store, the reported write count is exactly the number
    /// of distinct dates supplied.
    #[test]
    fn written_count_matches_distinct_dates(fetched in arb_points()) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());

        let distinct: std::collections::BTreeSet<&str> =
            fetched.iter().map(|p| p.datetime.as_str()).collect();

        let report = store.merge("USD/JPY", &fetched).unwrap();
        prop_assert_eq!(report.written(), distinct.len());
        prop_assert_eq!(report.total, distinct.len());
    }
}

// ── 3. Chunk coverage ────────────────────────────────────────────────

proptest! {
    /// Planned windows tile `[earliest, as_of]` with no gaps and no
    /// overlaps, each within the points-per-call bound.
    #[test]
    fn chunks_tile_the_span_exactly(
        start_offset in 0i64..5000,
        span in 0i64..6000,
        max_points in 1u32..400,
    ) {
        let earliest = base_date() + Duration::days(start_offset);
        let as_of = earliest + Duration::days(span);

        let plan = plan_chunks(earliest, as_of, max_points);
        prop_assert_eq!(plan.total(), plan.clone().count());

        let windows: Vec<_> = plan.collect();
        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows.first().unwrap().start, earliest);
        prop_assert_eq!(windows.last().unwrap().end, as_of);

        for w in &windows {
            prop_assert!(w.start <= w.end);
            prop_assert!(w.days() <= i64::from(max_points));
        }
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }
    }
}
