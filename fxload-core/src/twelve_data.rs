//! Twelve Data fetch client.
//!
//! Blocking client for the Twelve Data daily-history endpoints. Every HTTP
//! attempt first takes a ticket from the shared quota governor; retry
//! behavior is an explicit [`RetryPolicy`] value so backoff is testable
//! away from the inline loop.
//!
//! The provider signals quota exhaustion with HTTP 429, and request
//! rejection (bad symbol, auth failure, malformed request) with an HTTP 200
//! body of `{"status": "error", ...}`. The two get opposite treatment:
//! cooldown-and-retry versus fail-fast.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::chunks::DateRange;
use crate::provider::{FetchError, HistoryProvider, RawPoint};
use crate::throttle::QuotaGovernor;

const BASE_URL: &str = "https://api.twelvedata.com";

/// Bar interval requested from the provider. Daily bars are the only
/// interval the pipeline understands.
pub const INTERVAL: &str = "1day";

/// Retry behavior for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before giving up. Rate-limit cooldowns and network retries
    /// both consume one attempt.
    pub max_attempts: u32,
    /// Sleep after a network-level failure or timeout.
    pub network_delay: Duration,
    /// Sleep after the provider reports quota exhaustion (HTTP 429).
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            network_delay: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

// ── Response envelopes ──────────────────────────────────────────────

/// Error envelope the API returns with HTTP 200 on rejected requests.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EarliestTimestampResponse {
    datetime: String,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    values: Option<Vec<RawPoint>>,
}

/// Twelve Data provider.
pub struct TwelveDataProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    governor: Arc<QuotaGovernor>,
    retry: RetryPolicy,
}

impl TwelveDataProvider {
    pub fn new(api_key: impl Into<String>, governor: Arc<QuotaGovernor>) -> Self {
        Self::with_retry(api_key, governor, RetryPolicy::default())
    }

    pub fn with_retry(
        api_key: impl Into<String>,
        governor: Arc<QuotaGovernor>,
        retry: RetryPolicy,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            governor,
            retry,
        }
    }

    /// One logical GET: quota admission, bounded retries, envelope checks.
    fn request<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{BASE_URL}{path}");
        let mut last_error = FetchError::Network("no attempts were made".into());

        for _ in 0..self.retry.max_attempts {
            self.governor.admit();

            let response = match self
                .client
                .get(&url)
                .query(params)
                .query(&[("apikey", self.api_key.as_str())])
                .send()
            {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("WARNING: network error for {path}: {e}");
                    last_error = FetchError::Network(e.to_string());
                    std::thread::sleep(self.retry.network_delay);
                    continue;
                }
            };

            // Observational only; never gates behavior.
            if let Some(credits) = response
                .headers()
                .get("api-credits-left")
                .and_then(|v| v.to_str().ok())
            {
                println!("api credits left: {credits}");
            }

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                eprintln!(
                    "WARNING: provider rate limit hit, cooling down {}s",
                    self.retry.rate_limit_cooldown.as_secs()
                );
                last_error = FetchError::Http {
                    status: status.as_u16(),
                    body: "rate limited".into(),
                };
                std::thread::sleep(self.retry.rate_limit_cooldown);
                continue;
            }

            let body = match response.text() {
                Ok(b) => b,
                Err(e) => {
                    last_error = FetchError::Network(e.to_string());
                    std::thread::sleep(self.retry.network_delay);
                    continue;
                }
            };

            if !status.is_success() {
                return Err(FetchError::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            // Rejections arrive as HTTP 200 with an error envelope.
            if let Ok(envelope) = serde_json::from_str::<ApiStatus>(&body) {
                if envelope.status.as_deref() == Some("error") {
                    return Err(FetchError::Api(
                        envelope
                            .message
                            .unwrap_or_else(|| "unspecified provider error".into()),
                    ));
                }
            }

            return serde_json::from_str::<T>(&body)
                .map_err(|e| FetchError::Decode(format!("{path}: {e}")));
        }

        Err(FetchError::Exhausted {
            attempts: self.retry.max_attempts,
            last: last_error.to_string(),
        })
    }
}

impl HistoryProvider for TwelveDataProvider {
    fn name(&self) -> &str {
        "twelve_data"
    }

    fn earliest_available(&self, symbol: &str) -> Result<NaiveDate, FetchError> {
        let resp: EarliestTimestampResponse = self.request(
            "/earliest_timestamp",
            &[("symbol", symbol), ("interval", INTERVAL)],
        )?;
        parse_earliest_date(&resp.datetime)
    }

    fn time_series(&self, symbol: &str, range: DateRange) -> Result<Vec<RawPoint>, FetchError> {
        let start = range.start.to_string();
        let end = range.end.to_string();
        let resp: TimeSeriesResponse = self.request(
            "/time_series",
            &[
                ("symbol", symbol),
                ("interval", INTERVAL),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("order", "asc"),
            ],
        )?;

        let mut values = resp
            .values
            .ok_or_else(|| FetchError::Decode(format!("no values for {symbol}")))?;
        ensure_ascending(&mut values);
        Ok(values)
    }
}

/// The earliest-timestamp endpoint may return a bare date or a full
/// `YYYY-MM-DD HH:MM:SS` datetime; only the date component matters.
fn parse_earliest_date(datetime: &str) -> Result<NaiveDate, FetchError> {
    let date_part = datetime.split_whitespace().next().unwrap_or(datetime);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| FetchError::Decode(format!("earliest date '{datetime}': {e}")))
}

/// Ascending order is requested, but a descending payload is reversed rather
/// than trusted. ISO dates compare lexicographically.
fn ensure_ascending(values: &mut [RawPoint]) {
    if values.len() >= 2 && values.first().unwrap().datetime > values.last().unwrap().datetime {
        values.reverse();
    }
}
