use thiserror::Error;

/// Validation and contract errors exposed by `harkonnen-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of fine, daily, 2m, 1d")]
    InvalidInterval { value: String },
    #[error("invalid source '{value}', expected one of yahoo, fixture")]
    InvalidSource { value: String },

    #[error("timestamp is missing")]
    MissingTimestamp,
    #[error("timestamp must be RFC3339 or ISO-8601 without offset: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("window start {start} must be before end {end}")]
    EmptyWindow { start: String, end: String },

    #[error("sentiment component '{field}' must be within [0, 1], got {value}")]
    SentimentOutOfRange { field: &'static str, value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
}

/// Top-level error type for core operations that touch I/O.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
