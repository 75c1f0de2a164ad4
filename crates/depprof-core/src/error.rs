//! Error types for depprof

use thiserror::Error;

/// Main error type for depprof operations
#[derive(Debug, Error)]
pub enum DepProfError {
    /// Filter was constructed with an unsupported parameter combination
    #[error("Invalid filter configuration: {0}")]
    InvalidFilterConfig(String),

    /// Region is malformed (empty body, no exit path)
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Error while building an instrumentation schedule
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for depprof operations
pub type Result<T> = std::result::Result<T, DepProfError>;
