//! Typed configuration for the prediction engine.
//!
//! Every field is optional in `config.json`; missing fields take their
//! defaults. Fields whose default depends on the prediction model are kept
//! as `Option` and resolved through the accessor methods.

use serde::{Deserialize, Serialize};
use sf_math::AdditiveSmoothing;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Default sliding-window length.
pub const DEFAULT_WINDOW_SIZE: usize = 29;

/// Which distribution drives predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredictionModel {
    /// Rank by symbol frequency inside the recent window.
    WindowFrequency,
    /// Rank by first-order transitions out of the last observed symbol.
    #[default]
    MarkovChain,
}

impl PredictionModel {
    /// Number of ranked symbols shown when no explicit `topK` is configured.
    pub fn default_top_k(self) -> usize {
        match self {
            PredictionModel::WindowFrequency => 4,
            PredictionModel::MarkovChain => 3,
        }
    }

    /// Whether players may wipe the shared statistics by default.
    pub fn default_allow_reset(self) -> bool {
        matches!(self, PredictionModel::WindowFrequency)
    }
}

impl fmt::Display for PredictionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionModel::WindowFrequency => write!(f, "window_frequency"),
            PredictionModel::MarkovChain => write!(f, "markov_chain"),
        }
    }
}

impl FromStr for PredictionModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "window_frequency" | "window" | "legacy" => Ok(PredictionModel::WindowFrequency),
            "markov_chain" | "markov" => Ok(PredictionModel::MarkovChain),
            other => Err(format!(
                "unknown prediction model '{other}' (expected window_frequency or markov_chain)"
            )),
        }
    }
}

/// Engine and session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Distribution used to rank predictions.
    pub model: PredictionModel,

    /// Maximum number of symbols kept in the recent window.
    pub window_size: usize,

    /// Number of ranked symbols offered per prediction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    /// Pseudo-count for additive smoothing.
    pub smoothing: AdditiveSmoothing,

    /// Path of the persisted statistics snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Whether the reset command is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reset: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: PredictionModel::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            top_k: None,
            smoothing: AdditiveSmoothing::default(),
            data_file: None,
            allow_reset: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ValidationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_json(&content)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Effective number of ranked symbols per prediction.
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or_else(|| self.model.default_top_k())
    }

    /// Effective reset permission.
    pub fn allow_reset(&self) -> bool {
        self.allow_reset
            .unwrap_or_else(|| self.model.default_allow_reset())
    }
}
