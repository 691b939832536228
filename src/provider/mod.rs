//! Forecast providers.
//!
//! Defines the `ForecastProvider` trait, the seam to whatever produces
//! price forecasts (a statistical model, a market-data vendor, a file
//! drop), and provides implementations for:
//! - `StaticProvider`: fixed in-memory forecasts
//! - `JsonFileProvider`: one JSON file per ticker in a directory

pub mod json_file;

pub use json_file::JsonFileProvider;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Forecast, ForecastParams};

/// Abstraction over forecast sources.
///
/// Implementors own any I/O, model fitting, retries and timeouts; the
/// scanning core only ever sees the finished `Forecast`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Produce a forecast for `ticker` under `params`.
    async fn fetch_forecast(&self, ticker: &str, params: &ForecastParams) -> Result<Forecast>;

    /// Provider name for logging and identification.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Static provider
// ---------------------------------------------------------------------------

const STATIC_NAME: &str = "static";

/// Serves pre-built forecasts from memory, ignoring `params`.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    forecasts: HashMap<String, Forecast>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the forecast served for `ticker`.
    pub fn with_forecast(mut self, ticker: impl Into<String>, forecast: Forecast) -> Self {
        self.insert(ticker, forecast);
        self
    }

    pub fn insert(&mut self, ticker: impl Into<String>, forecast: Forecast) {
        self.forecasts.insert(ticker.into(), forecast);
    }
}

#[async_trait]
impl ForecastProvider for StaticProvider {
    async fn fetch_forecast(&self, ticker: &str, _params: &ForecastParams) -> Result<Forecast> {
        debug!(ticker, "Serving static forecast");
        self.forecasts
            .get(ticker)
            .cloned()
            .ok_or_else(|| anyhow!("No forecast available from {STATIC_NAME} provider for {ticker}"))
    }

    fn name(&self) -> &'static str {
        STATIC_NAME
    }
}
