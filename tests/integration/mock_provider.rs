//! Mock provider for integration testing.
//!
//! Deterministic `ForecastProvider` serving known series from memory,
//! with call counting and forced failures controllable from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use forecaster::provider::ForecastProvider;
use forecaster::types::*;

/// Example A: best pair is buy 8 / sell 15.
pub const SWING: [f64; 5] = [10.0, 12.0, 8.0, 15.0, 9.0];
/// Example B: two closed upswings and an open trailing rise.
pub const LADDER: [f64; 6] = [5.0, 7.0, 6.0, 9.0, 4.0, 10.0];

pub fn first_period() -> Period {
    Period::weekly(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
}

pub fn forecast_of(prices: &[f64]) -> Forecast {
    Forecast {
        history: PriceSeries::from_prices(first_period().offset(-2), &[9.0, 9.5]).unwrap(),
        forecast: PriceSeries::from_prices(first_period(), prices).unwrap(),
        metadata: ForecastMetadata::new("mock", ForecastParams::default()),
    }
}

/// All state is shared behind `Arc<Mutex<_>>` so clones observe the same
/// counters and errors.
#[derive(Clone)]
pub struct MockProvider {
    forecasts: Arc<Mutex<HashMap<String, Forecast>>>,
    calls: Arc<Mutex<Vec<String>>>,
    /// If set, every fetch returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Serves `SWING` for SPY and `LADDER` for QQQ.
    pub fn new() -> Self {
        let mut forecasts = HashMap::new();
        forecasts.insert("SPY".to_string(), forecast_of(&SWING));
        forecasts.insert("QQQ".to_string(), forecast_of(&LADDER));
        Self {
            forecasts: Arc::new(Mutex::new(forecasts)),
            calls: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_forecast(&self, ticker: &str, prices: &[f64]) {
        self.forecasts
            .lock()
            .unwrap()
            .insert(ticker.to_string(), forecast_of(prices));
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// Tickers fetched so far, sorted.
    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl ForecastProvider for MockProvider {
    async fn fetch_forecast(&self, ticker: &str, _params: &ForecastParams) -> Result<Forecast> {
        self.calls.lock().unwrap().push(ticker.to_string());
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        self.forecasts
            .lock()
            .unwrap()
            .get(ticker)
            .cloned()
            .ok_or_else(|| anyhow!("mock has no forecast for {ticker}"))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
