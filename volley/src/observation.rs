use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status recorded in place of an HTTP status when a request never produced
/// a response. Real HTTP statuses are in `100..=599`, so `0` can't collide.
pub const TRANSPORT_ERROR_STATUS: u16 = 0;

/// One measured request attempt.
///
/// Observations are created by a worker when an attempt completes and are
/// never mutated afterwards; the store only ever appends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Target URL, constant across a run.
    pub endpoint: String,
    /// Wall-clock time from send to status receipt, truncated to whole milliseconds.
    pub latency_ms: u64,
    /// HTTP status, or [`TRANSPORT_ERROR_STATUS`] for a transport failure.
    pub status_code: u16,
    /// UTC instant at which the attempt completed.
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(endpoint: impl Into<String>, latency_ms: u64, status_code: u16) -> Self {
        Self {
            endpoint: endpoint.into(),
            latency_ms,
            status_code,
            timestamp: Utc::now(),
        }
    }

    pub fn is_transport_error(&self) -> bool {
        self.status_code == TRANSPORT_ERROR_STATUS
    }

    /// Transport failures and 4xx/5xx responses.
    pub fn is_error(&self) -> bool {
        self.is_transport_error() || self.status_code >= 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_outside_http_range() {
        assert!(!(100..=599).contains(&TRANSPORT_ERROR_STATUS));
    }

    #[test]
    fn classifies_errors() {
        assert!(!Observation::new("http://x", 3, 200).is_error());
        assert!(!Observation::new("http://x", 3, 302).is_error());
        assert!(Observation::new("http://x", 3, 404).is_error());
        assert!(Observation::new("http://x", 3, 503).is_error());

        let failed = Observation::new("http://x", 3, TRANSPORT_ERROR_STATUS);
        assert!(failed.is_transport_error());
        assert!(failed.is_error());
    }
}
