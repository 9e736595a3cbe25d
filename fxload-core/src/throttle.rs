//! Sliding-window request throttle.
//!
//! The provider enforces a requests-per-minute quota across all endpoints,
//! so every HTTP call site shares one governor. `admit` blocks until one
//! more call stays within the limit, then records the call. There is no
//! error outcome; the worst case is a bounded sleep.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Slack added to every throttle sleep.
const WAKE_MARGIN: Duration = Duration::from_millis(10);

/// Sliding-window throttle: at most `max_calls` admissions in any trailing
/// `window`.
///
/// Interior state sits behind a `Mutex` so the governor can be `Arc`-shared
/// by every call site; the pipeline itself stays single-threaded.
#[derive(Debug)]
pub struct QuotaGovernor {
    max_calls: usize,
    window: Duration,
    stamps: Mutex<Vec<Instant>>,
}

impl QuotaGovernor {
    /// Governor over the provider's standard one-minute window.
    pub fn per_minute(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    pub fn new(max_calls: usize, window: Duration) -> Self {
        assert!(max_calls > 0, "quota must allow at least one call");
        Self {
            max_calls,
            window,
            stamps: Mutex::new(Vec::new()),
        }
    }

    /// Block until one more call fits in the trailing window, then record it.
    pub fn admit(&self) {
        loop {
            let wait = {
                let mut stamps = self.stamps.lock().unwrap();
                stamps.retain(|t| t.elapsed() < self.window);
                if stamps.len() < self.max_calls {
                    stamps.push(Instant::now());
                    return;
                }
                // The oldest stamp decides when the next slot opens.
                self.window.saturating_sub(stamps[0].elapsed())
            };
            std::thread::sleep(wait + WAKE_MARGIN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_without_blocking() {
        let governor = QuotaGovernor::new(3, Duration::from_millis(200));
        let start = Instant::now();
        for _ in 0..3 {
            governor.admit();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn no_trailing_window_exceeds_the_quota() {
        // 7 admissions per (scaled) window, 10 rapid calls: every run of 8
        // consecutive admissions must span more than one window.
        let window = Duration::from_millis(250);
        let governor = QuotaGovernor::new(7, window);

        let mut times = Vec::new();
        for _ in 0..10 {
            governor.admit();
            times.push(Instant::now());
        }

        for i in 0..times.len() - 7 {
            assert!(
                times[i + 7] - times[i] >= window,
                "admissions {i}..{} landed inside one window",
                i + 7
            );
        }
    }

    #[test]
    fn stale_stamps_are_pruned() {
        let governor = QuotaGovernor::new(2, Duration::from_millis(50));
        governor.admit();
        governor.admit();

        std::thread::sleep(Duration::from_millis(80));

        // Both stamps have aged out; these must not block.
        let start = Instant::now();
        governor.admit();
        governor.admit();
        assert!(start.elapsed() < Duration::from_millis(40));
    }

    #[test]
    fn blocks_when_window_is_full() {
        let window = Duration::from_millis(100);
        let governor = QuotaGovernor::new(1, window);
        governor.admit();

        let start = Instant::now();
        governor.admit();
        assert!(start.elapsed() >= window);
    }
}
