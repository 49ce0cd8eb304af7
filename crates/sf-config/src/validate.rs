//! Semantic validation of configuration values.

use sf_common::SYMBOL_COUNT;
use thiserror::Error;

use crate::config::Config;

/// Largest accepted sliding-window length.
pub const MAX_WINDOW_SIZE: usize = 1000;

/// Smallest accepted sliding-window length. A batch needs at least two symbols.
pub const MIN_WINDOW_SIZE: usize = 2;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check every field of `config` against its allowed range.
pub fn validate_config(config: &Config) -> ValidationResult<()> {
    if !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&config.window_size) {
        return Err(ValidationError::InvalidValue {
            field: "windowSize",
            reason: format!(
                "must be in [{MIN_WINDOW_SIZE}, {MAX_WINDOW_SIZE}], got {}",
                config.window_size
            ),
        });
    }

    if let Some(k) = config.top_k {
        if !(1..=SYMBOL_COUNT).contains(&k) {
            return Err(ValidationError::InvalidValue {
                field: "topK",
                reason: format!("must be in [1, {SYMBOL_COUNT}], got {k}"),
            });
        }
    }

    let alpha = config.smoothing.alpha();
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "smoothing",
            reason: format!("must be a positive finite number, got {alpha}"),
        });
    }

    Ok(())
}
