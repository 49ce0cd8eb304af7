//! Error types for Symbol Forecast.

use thiserror::Error;

/// Result type alias for Symbol Forecast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Symbol Forecast.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("invalid symbol {value}: must be in [0, {max})", max = crate::SYMBOL_COUNT)]
    InvalidSymbol { value: i64 },

    #[error("expected exactly {expected} outcome digits, got {found}")]
    MalformedBatchInput { expected: usize, found: usize },

    // Persistence errors (20-29)
    #[error("failed to read statistics snapshot: {0}")]
    PersistenceRead(String),

    #[error("failed to write statistics snapshot: {0}")]
    PersistenceWrite(String),

    // State errors (30-39)
    #[error("statistics state lock poisoned by a panicked writer")]
    StatePoisoned,

    #[error("counter {counter} is saturated; reset statistics to continue recording")]
    CounterOverflow { counter: &'static str },

    // Serialization errors (60-69)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidSymbol { .. } => 10,
            Error::MalformedBatchInput { .. } => 11,
            Error::PersistenceRead(_) => 20,
            Error::PersistenceWrite(_) => 21,
            Error::StatePoisoned => 30,
            Error::CounterOverflow { .. } => 31,
            Error::Json(_) => 61,
        }
    }
}
