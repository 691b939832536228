//! Forecaster: runs forecasts and scans for a set of tickers.
//!
//! Fetches forecasts from the provider, stores them, and runs the
//! max-profit and sequential scanners over the stored series. Each
//! ticker's record is replaced as a whole, so readers never observe a
//! ledger computed from a different forecast than the one next to it.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument, Span};

use super::max_profit::MaxProfitScanner;
use super::sequential::SequentialTradeScanner;
use crate::provider::ForecastProvider;
use crate::store::{TickerRecord, TickerStore};
use crate::types::{ForecastError, ForecastParams};

// ---------------------------------------------------------------------------
// Forecast report
// ---------------------------------------------------------------------------

/// A ticker whose forecast could not be produced or stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedForecast {
    pub ticker: String,
    pub reason: String,
}

/// Outcome of a batch of forecasts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedForecast>,
}

impl ForecastReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Forecaster
// ---------------------------------------------------------------------------

pub struct Forecaster {
    provider: Box<dyn ForecastProvider>,
    store: Arc<TickerStore>,
    params: ForecastParams,
    max_profit: MaxProfitScanner,
    sequential: SequentialTradeScanner,
    span: Span,
}

impl Forecaster {
    pub fn new(
        provider: Box<dyn ForecastProvider>,
        store: Arc<TickerStore>,
        params: ForecastParams,
    ) -> Self {
        Self::with_span(provider, store, params, info_span!("forecaster"))
    }

    /// Forecaster whose scanners log as children of `span`.
    pub fn with_span(
        provider: Box<dyn ForecastProvider>,
        store: Arc<TickerStore>,
        params: ForecastParams,
        span: Span,
    ) -> Self {
        Self {
            provider,
            store,
            params,
            max_profit: MaxProfitScanner::with_span(info_span!(parent: &span, "max_profit")),
            sequential: SequentialTradeScanner::with_span(info_span!(
                parent: &span,
                "sequential_trades"
            )),
            span,
        }
    }

    pub fn store(&self) -> &Arc<TickerStore> {
        &self.store
    }

    /// Default parameters passed to the provider.
    pub fn params(&self) -> &ForecastParams {
        &self.params
    }

    /// Register symbols for later forecasting. Symbols the store's policy
    /// rejects are logged and returned; they do not stop the rest.
    pub fn add_tickers<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<String> {
        let _enter = self.span.enter();
        let mut rejected = Vec::new();
        let mut added = 0usize;

        for symbol in symbols {
            let symbol = symbol.as_ref();
            match self.store.register(symbol) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(ticker = symbol, error = %e, "Invalid ticker skipped");
                    rejected.push(symbol.to_string());
                }
            }
        }

        info!(added, rejected = rejected.len(), "Tickers added");
        rejected
    }

    /// Explicit lookup of a ticker's record.
    pub fn ticker(&self, ticker: &str) -> Result<Arc<TickerRecord>, ForecastError> {
        self.store.get(ticker)
    }

    /// Forecast `tickers` (every registered ticker when empty) with the
    /// default parameters.
    pub async fn forecast<S: AsRef<str>>(&self, tickers: &[S]) -> ForecastReport {
        self.forecast_with(tickers, &self.params).await
    }

    /// Forecast `tickers` with explicit parameters.
    ///
    /// Provider calls run concurrently. Each success replaces the ticker's
    /// record; failures are collected rather than aborting the batch.
    pub async fn forecast_with<S: AsRef<str>>(
        &self,
        tickers: &[S],
        params: &ForecastParams,
    ) -> ForecastReport {
        let targets = self.targets(tickers);
        info!(parent: &self.span, count = targets.len(), %params, "Forecasting");

        let fetches = targets.iter().map(|ticker| async move {
            let result = self.provider.fetch_forecast(ticker, params).await;
            (ticker, result)
        });
        let results = join_all(fetches).instrument(self.span.clone()).await;

        let _enter = self.span.enter();
        let mut report = ForecastReport::default();
        for (ticker, result) in results {
            let stored = result.and_then(|forecast| {
                self.store
                    .put_forecast(ticker, forecast)
                    .map_err(anyhow::Error::from)
            });
            match stored {
                Ok(record) => {
                    let periods = record.forecast.as_ref().map_or(0, |f| f.forecast.len());
                    info!(ticker = %ticker, periods, "Forecast stored");
                    report.succeeded.push(ticker.clone());
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Forecast failed");
                    report.failed.push(FailedForecast {
                        ticker: ticker.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        report
    }

    /// Compute and store the max-profit ledger for `tickers` (every known
    /// ticker when empty). Stops at the first ticker without a forecast.
    pub fn find_max_profit<S: AsRef<str>>(&self, tickers: &[S]) -> Result<(), ForecastError> {
        for ticker in self.targets(tickers) {
            self.store.update(&ticker, |record| {
                let ledger = self.max_profit.scan(record.forecast_series()?);
                Ok(TickerRecord {
                    max_profit: Some(ledger),
                    ..record.clone()
                })
            })?;
        }
        Ok(())
    }

    /// Compute and store the sequential-trades ledger for `tickers` (every
    /// known ticker when empty). Stops at the first ticker without a forecast.
    pub fn find_best_trades<S: AsRef<str>>(&self, tickers: &[S]) -> Result<(), ForecastError> {
        for ticker in self.targets(tickers) {
            self.store.update(&ticker, |record| {
                let ledger = self.sequential.scan(record.forecast_series()?);
                Ok(TickerRecord {
                    sequential: Some(ledger),
                    ..record.clone()
                })
            })?;
        }
        Ok(())
    }

    fn targets<S: AsRef<str>>(&self, tickers: &[S]) -> Vec<String> {
        if tickers.is_empty() {
            self.store.tickers()
        } else {
            tickers.iter().map(|t| t.as_ref().to_string()).collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
