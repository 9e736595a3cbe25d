//! Request-window planning.
//!
//! The provider caps one call at a fixed number of daily bars, so a symbol's
//! full span is split into contiguous inclusive windows of at most that many
//! calendar days. A plan is a plain iterator value with no external state:
//! the same inputs always produce the same windows, which is what lets an
//! interrupted run re-plan and re-fetch safely.

use chrono::{Duration, NaiveDate};

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Invariant: `start <= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Calendar days covered, inclusive of both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Plan the request windows covering `[earliest, as_of]`.
///
/// Each window spans at most `max_points` calendar days; windows are
/// ascending, contiguous, and non-overlapping, with the final window clipped
/// to `as_of`. `earliest > as_of` yields an empty plan.
pub fn plan_chunks(earliest: NaiveDate, as_of: NaiveDate, max_points: u32) -> ChunkPlan {
    assert!(max_points > 0, "max_points must be positive");
    ChunkPlan {
        cursor: earliest,
        end: as_of,
        span_days: i64::from(max_points),
    }
}

/// Lazy, finite sequence of request windows.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    cursor: NaiveDate,
    end: NaiveDate,
    span_days: i64,
}

impl ChunkPlan {
    /// Number of windows remaining, without consuming the iterator.
    pub fn total(&self) -> usize {
        if self.cursor > self.end {
            return 0;
        }
        let days = (self.end - self.cursor).num_days() + 1;
        ((days + self.span_days - 1) / self.span_days) as usize
    }
}

impl Iterator for ChunkPlan {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        if self.cursor > self.end {
            return None;
        }
        let window_end = (self.cursor + Duration::days(self.span_days - 1)).min(self.end);
        let window = DateRange::new(self.cursor, window_end);
        self.cursor = window_end + Duration::days(1);
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn covers_span_exactly() {
        let windows: Vec<_> = plan_chunks(d("2020-01-01"), d("2020-03-15"), 30).collect();

        assert_eq!(windows.first().unwrap().start, d("2020-01-01"));
        assert_eq!(windows.last().unwrap().end, d("2020-03-15"));
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }
        for w in &windows {
            assert!(w.days() <= 30);
        }
    }

    #[test]
    fn single_window_when_span_fits() {
        let windows: Vec<_> = plan_chunks(d("2024-01-01"), d("2024-01-20"), 5000).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], DateRange::new(d("2024-01-01"), d("2024-01-20")));
    }

    #[test]
    fn single_day_span() {
        let windows: Vec<_> = plan_chunks(d("2024-06-01"), d("2024-06-01"), 5000).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].days(), 1);
    }

    #[test]
    fn empty_when_earliest_after_as_of() {
        let plan = plan_chunks(d("2024-06-02"), d("2024-06-01"), 5000);
        assert_eq!(plan.total(), 0);
        assert_eq!(plan.count(), 0);
    }

    #[test]
    fn final_window_clipped_to_as_of() {
        // 10 days split into windows of 7: [1..7], [8..10]
        let windows: Vec<_> = plan_chunks(d("2024-01-01"), d("2024-01-10"), 7).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].days(), 7);
        assert_eq!(windows[1], DateRange::new(d("2024-01-08"), d("2024-01-10")));
    }

    #[test]
    fn total_matches_iteration() {
        for (earliest, as_of, max) in [
            ("2000-01-01", "2024-12-31", 5000),
            ("2024-01-01", "2024-01-10", 7),
            ("2024-01-01", "2024-01-01", 1),
            ("2020-02-28", "2020-03-01", 2),
        ] {
            let plan = plan_chunks(d(earliest), d(as_of), max);
            assert_eq!(plan.total(), plan.clone().count());
        }
    }

    #[test]
    fn replanning_is_deterministic() {
        let a: Vec<_> = plan_chunks(d("2010-05-17"), d("2024-11-30"), 5000).collect();
        let b: Vec<_> = plan_chunks(d("2010-05-17"), d("2024-11-30"), 5000).collect();
        assert_eq!(a, b);
    }
}
