//! File-backed forecast provider.
//!
//! Reads `<dir>/<TICKER>.json`, written by an offline forecasting job:
//!
//! ```json
//! {
//!   "model": "SARIMA(0,1,1)x(2,1,0,52)",
//!   "interval": "weekly",
//!   "aic": 812.4,
//!   "history":  [{ "date": "2024-01-01", "price": 471.2 }],
//!   "forecast": [{ "date": "2024-01-08", "price": 474.9 }]
//! }
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ForecastProvider;
use crate::types::{
    Forecast, ForecastMetadata, ForecastParams, Interval, Period, PricePoint, PriceSeries,
};

const PROVIDER_NAME: &str = "json_file";

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ForecastFile {
    #[serde(default)]
    model: Option<String>,
    interval: Interval,
    #[serde(default)]
    aic: Option<f64>,
    #[serde(default)]
    history: Vec<DatedPrice>,
    forecast: Vec<DatedPrice>,
}

#[derive(Debug, Deserialize)]
struct DatedPrice {
    date: NaiveDate,
    price: f64,
}

fn to_series(rows: &[DatedPrice], interval: Interval) -> Result<PriceSeries> {
    let points = rows
        .iter()
        .map(|r| PricePoint::new(Period::new(r.date, interval), r.price))
        .collect();
    Ok(PriceSeries::new(points)?)
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Serves forecasts from JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.json"))
    }

    fn parse(&self, ticker: &str, json: &str, params: &ForecastParams) -> Result<Forecast> {
        let file: ForecastFile = serde_json::from_str(json)
            .with_context(|| format!("Failed to parse forecast file for {ticker}"))?;

        if file.interval != params.interval {
            bail!(
                "Forecast file for {ticker} is {} but {} was requested",
                file.interval,
                params.interval
            );
        }

        let history = to_series(&file.history, file.interval)
            .with_context(|| format!("Bad history series for {ticker}"))?;
        let forecast = to_series(&file.forecast, file.interval)
            .with_context(|| format!("Bad forecast series for {ticker}"))?;

        if forecast.len() != params.horizon() {
            warn!(
                ticker,
                periods = forecast.len(),
                horizon = params.horizon(),
                "Forecast length differs from requested horizon"
            );
        }

        Ok(Forecast {
            history,
            forecast,
            metadata: ForecastMetadata {
                model: file.model.unwrap_or_else(|| PROVIDER_NAME.to_string()),
                params: params.clone(),
                aic: file.aic,
                generated_at: Utc::now(),
            },
        })
    }
}

#[async_trait]
impl ForecastProvider for JsonFileProvider {
    async fn fetch_forecast(&self, ticker: &str, params: &ForecastParams) -> Result<Forecast> {
        let path = self.path_for(ticker);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read forecast file: {}", path.display()))?;

        let forecast = self.parse(ticker, &json, params)?;
        debug!(
            ticker,
            path = %path.display(),
            history = forecast.history.len(),
            forecast = forecast.forecast.len(),
            "Forecast loaded"
        );
        Ok(forecast)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
