//! Symbol Forecast configuration loading and validation.
//!
//! This crate provides:
//! - The typed `Config` struct backing `config.json`
//! - The `PredictionModel` selector (window frequency vs. Markov chain)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod config;
pub mod resolve;
pub mod validate;

pub use config::{Config, PredictionModel};
pub use resolve::{resolve_config, ConfigOverrides, ConfigPaths};
pub use validate::{ValidationError, ValidationResult};

/// Directory name used under the XDG config and data roots.
pub const APP_DIR_NAME: &str = "symbol_forecast";
