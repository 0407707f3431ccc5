//! Stateless retry policy, grounded on `original_source`'s
//! `core/utils/retry_strategy.py` (`RetryStrategy`) and the defaults in the
//! distilled spec's §4.2 component design.

use crate::error::IngestError;
use std::time::Duration;

const RETRYABLE_KEYWORDS: &[&str] = &[
    "timeout",
    "connection refused",
    "connection reset",
    "connection aborted",
    "temporarily",
    "unavailable",
    "try again",
];

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// `true` for network timeouts, connection reset/refused/aborted and
    /// HTTP 5xx; `false` for permission denied, disk-full and validation
    /// errors, which never improve by retrying.
    pub fn is_retryable(&self, error: &IngestError) -> bool {
        match error {
            IngestError::PathPermissionError(_)
            | IngestError::DiskFullError(_)
            | IngestError::InvalidFirstYear(_)
            | IngestError::InvalidLastYear(_)
            | IngestError::InvalidDocName(_)
            | IngestError::InvalidAssetsName(_)
            | IngestError::EmptyAssetList
            | IngestError::InvalidDestinationPath(_)
            | IngestError::PathIsNotDirectory(_)
            | IngestError::SecurityError(_) => false,
            IngestError::NetworkError(_) | IngestError::TimeoutError(_) => true,
            _ => {
                let message = error.to_string().to_lowercase();
                RETRYABLE_KEYWORDS.iter().any(|kw| message.contains(kw))
            }
        }
    }

    /// `is_retryable` for a raw HTTP status code (5xx only).
    pub fn is_retryable_status(&self, status: u16) -> bool {
        (500..600).contains(&status)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let scaled = self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max_backoff.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_and_timeout_errors_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&IngestError::NetworkError("refused".into())));
        assert!(policy.is_retryable(&IngestError::TimeoutError("slow".into())));
    }

    #[test]
    fn test_permission_and_disk_errors_are_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&IngestError::PathPermissionError("/root".into())));
        assert!(!policy.is_retryable(&IngestError::DiskFullError("/data".into())));
    }

    #[test]
    fn test_validation_errors_are_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&IngestError::EmptyAssetList));
        assert!(!policy.is_retryable(&IngestError::SecurityError("escape".into())));
    }

    #[test]
    fn test_5xx_status_is_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(404));
    }

    #[test]
    fn test_backoff_doubles_until_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(60));
    }
}
