use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use super::error::Error;
use common::weights::DEFAULT_TOLERANCE;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub symbols: Vec<String>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub interval_ms: u64,
    pub rate_fluctuation_bps: f64,
    pub total_ticks: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// Default location of the configuration file, relative to the workspace root.
pub fn default_config_path() -> Result<PathBuf, Error> {
    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    Ok(base_path
        .join("crates")
        .join("executor")
        .join("Config.toml"))
}

/// Loads configuration from a file and `EXECUTOR_*` environment variables.
///
/// Nested keys use a double underscore, e.g. `EXECUTOR_PIPELINE__BUFFER_SIZE=64`.
pub fn load_config(config_file_path: &Path) -> Result<Config, Error> {
    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path).required(true))
        .add_source(
            Environment::with_prefix("EXECUTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    if app_config.engine.symbols.is_empty() {
        return Err(Error::ConfigLoadError(
            "engine.symbols must list at least one BASE-QUOTE pair".to_string(),
        ));
    }

    if app_config.pipeline.buffer_size == 0 {
        return Err(Error::ConfigLoadError(
            "pipeline.buffer_size must be greater than zero".to_string(),
        ));
    }

    Ok(app_config)
}
