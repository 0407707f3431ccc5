//! Error taxonomy for the ingestion pipeline.
//!
//! Validation and security errors are fatal for the containing use-case and
//! must escape to the caller unwrapped; network/protocol/integrity/resource
//! errors are captured per-job by the scheduler and aggregator and recorded
//! as result-aggregate entries, never surfaced as raw stack traces.

use thiserror::Error;

/// Core error type for the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid first year: {0}")]
    InvalidFirstYear(String),

    #[error("invalid last year: {0}")]
    InvalidLastYear(String),

    #[error("invalid document name: {0}")]
    InvalidDocName(String),

    #[error("invalid asset class name: {0}")]
    InvalidAssetsName(String),

    #[error("asset list cannot be empty")]
    EmptyAssetList,

    #[error("invalid destination path: {0}")]
    InvalidDestinationPath(String),

    #[error("path is not a directory: {0}")]
    PathIsNotDirectory(String),

    #[error("permission denied for path: {0}")]
    PathPermissionError(String),

    #[error("security error: {0}")]
    SecurityError(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("timeout error: {0}")]
    TimeoutError(String),

    #[error("disk full: {0}")]
    DiskFullError(String),

    #[error("corrupted zip archive: {0}")]
    CorruptedZipError(String),

    #[error("extraction error: {0}")]
    ExtractionError(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Fatal validation/security errors that must escape to the caller
    /// unwrapped, rather than being recorded per-job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::InvalidFirstYear(_)
                | IngestError::InvalidLastYear(_)
                | IngestError::InvalidDocName(_)
                | IngestError::InvalidAssetsName(_)
                | IngestError::EmptyAssetList
                | IngestError::InvalidDestinationPath(_)
                | IngestError::PathIsNotDirectory(_)
                | IngestError::SecurityError(_)
        )
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = anyhow::Result<T>;
