//! Trimrank error types

/// Trimrank error types
#[derive(Debug, thiserror::Error)]
pub enum TrimrankError {
    // Configuration errors — fail fast at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    // Enrichment-boundary errors. The ranking engine downgrades these to a
    // zero analysis; they only surface to direct callers of an analyzer.
    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("analysis timed out")]
    AnalysisTimeout,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for trimrank operations
pub type Result<T> = std::result::Result<T, TrimrankError>;
