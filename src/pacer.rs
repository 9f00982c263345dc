//! Request pacing driven by Favro's rate-limit headers.
//!
//! Favro reports the remaining request quota and the time the quota window
//! resets on every response. Once the quota is exhausted the next request
//! must wait for the reset; the pacer remembers that wait between the
//! response that announced it and the request that has to honour it.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderMap;

/// Remaining requests in the current rate-limit window (`X-RateLimit-Remaining`).
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// ISO 8601 timestamp at which the rate-limit window resets (`X-RateLimit-Reset`).
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Tracks the wait owed before the next request.
#[derive(Debug, Default, Clone)]
pub struct RequestPacer {
    pending: Option<Duration>,
}

impl RequestPacer {
    /// Create a pacer with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// The wait the next request must honour, if any.
    pub fn pending(&self) -> Option<Duration> {
        self.pending
    }

    /// Update the pending wait from a response's headers.
    pub fn observe(&mut self, headers: &HeaderMap) {
        self.observe_at(headers, Utc::now());
    }

    /// Update the pending wait from a response's headers, relative to `now`.
    ///
    /// The latest response always wins: a response without an exhausted
    /// quota clears any wait left by an earlier one. Only a reset that lies
    /// in the future produces a wait; a reset in the past or at `now`
    /// (clock skew, stale header) records nothing.
    pub fn observe_at(&mut self, headers: &HeaderMap, now: DateTime<Utc>) {
        self.pending = exhausted_until(headers).and_then(|reset| (reset - now).to_std().ok());

        if let Some(wait) = self.pending.filter(|w| w.is_zero()) {
            tracing::debug!(?wait, "rate limit reset already reached");
            self.pending = None;
        }
    }

    /// Sleep for the pending wait, if positive, and clear it.
    ///
    /// Returns the duration slept. A second call without an intervening
    /// [`observe`](Self::observe) returns `None` immediately.
    pub async fn wait_if_needed(&mut self) -> Option<Duration> {
        let wait = self.pending.take()?;

        let resume_at =
            Utc::now() + chrono::Duration::from_std(wait).unwrap_or_else(|_| chrono::Duration::zero());
        tracing::info!(
            wait_ms = wait.as_millis() as u64,
            %resume_at,
            "rate limit exhausted, waiting before the next request"
        );
        tokio::time::sleep(wait).await;

        Some(wait)
    }
}

/// Reset timestamp if the response says the quota is used up.
fn exhausted_until(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let remaining = header_str(headers, REMAINING_HEADER)?;
    let remaining: i64 = match remaining.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::debug!(value = remaining, "ignoring unparseable remaining-quota header");
            return None;
        }
    };

    if remaining >= 1 {
        return None;
    }

    let reset = header_str(headers, RESET_HEADER)?;
    let parsed = parse_reset(reset);
    if parsed.is_none() {
        tracing::debug!(value = reset, "ignoring unparseable rate-limit reset header");
    }
    parsed
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
}

/// Parse an ISO 8601 reset timestamp.
///
/// Accepts RFC 3339 with an offset, and naive timestamps which are taken
/// to be UTC.
pub fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn headers(remaining: Option<&str>, reset: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(r) = remaining {
            map.insert(REMAINING_HEADER, HeaderValue::from_str(r).unwrap());
        }
        if let Some(r) = reset {
            map.insert(RESET_HEADER, HeaderValue::from_str(r).unwrap());
        }
        map
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_exhausted_quota_with_future_reset_waits() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("0"), Some("2024-05-01T12:00:30.000Z")), now());
        assert_eq!(pacer.pending(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_past_reset_records_nothing() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("0"), Some("2024-05-01T11:59:00Z")), now());
        assert_eq!(pacer.pending(), None);

        pacer.observe_at(&headers(Some("0"), Some("2024-05-01T12:00:00Z")), now());
        assert_eq!(pacer.pending(), None);
    }

    #[test]
    fn test_remaining_quota_means_no_wait() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("12"), Some("2024-05-01T12:05:00Z")), now());
        assert_eq!(pacer.pending(), None);
    }

    #[test]
    fn test_missing_headers_clear_previous_wait() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("0"), Some("2024-05-01T12:01:00Z")), now());
        assert!(pacer.pending().is_some());

        pacer.observe_at(&HeaderMap::new(), now());
        assert_eq!(pacer.pending(), None);
    }

    #[test]
    fn test_garbage_headers_are_ignored() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("lots"), Some("2024-05-01T12:01:00Z")), now());
        assert_eq!(pacer.pending(), None);

        pacer.observe_at(&headers(Some("0"), Some("tomorrow")), now());
        assert_eq!(pacer.pending(), None);

        pacer.observe_at(&headers(Some("0"), None), now());
        assert_eq!(pacer.pending(), None);
    }

    #[test]
    fn test_parse_reset_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap();
        assert_eq!(parse_reset("2024-05-01T12:00:30Z"), Some(expected));
        assert_eq!(parse_reset("2024-05-01T14:00:30+02:00"), Some(expected));
        assert_eq!(parse_reset("2024-05-01T12:00:30"), Some(expected));
        assert_eq!(parse_reset("2024-05-01T12:00:30.000"), Some(expected));
        assert_eq!(parse_reset("05/01/2024"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_consumed_once() {
        let mut pacer = RequestPacer::new();
        pacer.observe_at(&headers(Some("0"), Some("2024-05-01T12:00:05Z")), now());

        let start = tokio::time::Instant::now();
        assert_eq!(pacer.wait_if_needed().await, Some(Duration::from_secs(5)));
        assert!(start.elapsed() >= Duration::from_secs(5));

        let second = tokio::time::Instant::now();
        assert_eq!(pacer.wait_if_needed().await, None);
        assert_eq!(second.elapsed(), Duration::ZERO);
        assert_eq!(pacer.pending(), None);
    }

    #[tokio::test]
    async fn test_no_wait_returns_immediately() {
        let mut pacer = RequestPacer::new();
        assert_eq!(pacer.wait_if_needed().await, None);
    }
}
