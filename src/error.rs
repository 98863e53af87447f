//! Error types for the attack-window analyzer.

use thiserror::Error;

/// Analyzer error types.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Trace capture file could not be read
    #[error("cannot read trace file '{path}': {source}")]
    TraceIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A data row of the trace failed to parse
    #[error("malformed trace row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Configuration file could not be read
    #[error("cannot read config file '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file failed to deserialize
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration rejected at registry construction
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal invariant violated; indicates a scheduling bug, not bad input
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// Report destination could not be written
    #[error("cannot write report '{path}': {source}")]
    ReportIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
