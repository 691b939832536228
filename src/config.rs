//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a partial (or empty) file is valid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::store::TickerPolicy;
use crate::types::ForecastParams;

/// Default config path when `FORECASTER_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub forecast: ForecastParams,
    pub tickers: TickersConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TickersConfig {
    /// Symbols forecast on every run.
    pub symbols: Vec<String>,
    pub max_len: usize,
    pub uppercase_only: bool,
}

impl Default for TickersConfig {
    fn default() -> Self {
        let policy = TickerPolicy::default();
        Self {
            symbols: Vec::new(),
            max_len: policy.max_len,
            uppercase_only: policy.uppercase_only,
        }
    }
}

impl TickersConfig {
    pub fn policy(&self) -> TickerPolicy {
        TickerPolicy {
            max_len: self.max_len,
            uppercase_only: self.uppercase_only,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of `<TICKER>.json` forecast files.
    pub forecast_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            forecast_dir: PathBuf::from("data/forecasts"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// When set, computed records are written here as JSON.
    pub report_dir: Option<PathBuf>,
    /// Print the full per-period history, not just the actions.
    pub show_history: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Config path from `FORECASTER_CONFIG`, falling back to the default.
    pub fn path_from_env() -> String {
        std::env::var("FORECASTER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}
