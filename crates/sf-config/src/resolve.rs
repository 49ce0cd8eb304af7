//! Configuration resolution: CLI → environment → XDG config file → defaults.

use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, PredictionModel};
use crate::validate::{ValidationError, ValidationResult};
use crate::APP_DIR_NAME;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "SF_CONFIG";

/// Environment variable overriding the snapshot path.
pub const ENV_DATA_FILE: &str = "SF_DATA_FILE";

/// Environment variable overriding the prediction model.
pub const ENV_MODEL: &str = "SF_MODEL";

/// Config file name inside the XDG config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Snapshot file name inside the XDG data directory.
const DATA_FILE_NAME: &str = "shared_data.json";

/// Values supplied on the command line. `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub model: Option<PredictionModel>,
    pub top_k: Option<usize>,
    pub window_size: Option<usize>,
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Config file that was loaded, if any.
    pub config_file: Option<PathBuf>,
    /// Snapshot file the engine should persist to.
    pub data_file: PathBuf,
}

/// Default config file location (`$XDG_CONFIG_HOME/symbol_forecast/config.json`).
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Default snapshot location (`$XDG_DATA_HOME/symbol_forecast/shared_data.json`).
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DATA_FILE_NAME)
}

/// Resolve configuration using the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> ValidationResult<(Config, ConfigPaths)> {
    resolve_config_with_env(overrides, |key| std::env::var(key).ok())
}

/// Resolve configuration with an injectable environment lookup.
pub fn resolve_config_with_env<F>(
    overrides: &ConfigOverrides,
    env: F,
) -> ValidationResult<(Config, ConfigPaths)>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = overrides
        .config_path
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from));

    let config_file = match explicit {
        // An explicitly named file must exist.
        Some(path) => Some(path),
        None => default_config_file().filter(|p| p.exists()),
    };

    let mut config = match &config_file {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    if let Some(raw) = env(ENV_MODEL) {
        config.model = raw
            .parse()
            .map_err(|reason| ValidationError::InvalidValue {
                field: "SF_MODEL",
                reason,
            })?;
    }
    if let Some(raw) = env(ENV_DATA_FILE) {
        config.data_file = Some(PathBuf::from(raw));
    }

    if let Some(model) = overrides.model {
        config.model = model;
    }
    if let Some(path) = &overrides.data_file {
        config.data_file = Some(path.clone());
    }
    if let Some(k) = overrides.top_k {
        config.top_k = Some(k);
    }
    if let Some(size) = overrides.window_size {
        config.window_size = size;
    }

    config.validate()?;

    let data_file = config.data_file.clone().unwrap_or_else(default_data_file);
    config.data_file = Some(data_file.clone());

    Ok((
        config,
        ConfigPaths {
            config_file,
            data_file,
        },
    ))
}
