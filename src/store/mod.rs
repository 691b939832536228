//! Ticker store.
//!
//! Maps a ticker symbol to its forecast and computed ledgers. Readers get
//! an `Arc` snapshot of a record; writers build a complete replacement and
//! swap it in under that ticker's lock, so a half-updated record is never
//! visible and writes to one ticker never block another.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, info_span, Span};

use crate::ledger::TradeLedger;
use crate::types::{Forecast, ForecastError, PriceSeries};

// ---------------------------------------------------------------------------
// Ticker policy
// ---------------------------------------------------------------------------

/// Accepted shape of a ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerPolicy {
    pub max_len: usize,
    /// Reject symbols containing lowercase letters.
    pub uppercase_only: bool,
}

impl Default for TickerPolicy {
    fn default() -> Self {
        Self {
            max_len: 4,
            uppercase_only: true,
        }
    }
}

impl TickerPolicy {
    /// Accept any non-blank symbol without whitespace.
    pub fn relaxed() -> Self {
        Self {
            max_len: usize::MAX,
            uppercase_only: false,
        }
    }

    pub fn validate(&self, ticker: &str) -> Result<(), ForecastError> {
        let invalid = |reason: &str| ForecastError::Validation {
            ticker: ticker.to_string(),
            reason: reason.to_string(),
        };

        if ticker.is_empty() {
            return Err(invalid("empty symbol"));
        }
        if ticker.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        if ticker.chars().count() > self.max_len {
            return Err(invalid(&format!("longer than {} characters", self.max_len)));
        }
        if self.uppercase_only
            && (ticker.chars().any(char::is_lowercase) || !ticker.chars().any(char::is_alphabetic))
        {
            return Err(invalid("must be uppercase"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Everything known about one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub ticker: String,
    /// `None` until the forecasting collaborator has produced a result.
    pub forecast: Option<Forecast>,
    pub max_profit: Option<TradeLedger>,
    pub sequential: Option<TradeLedger>,
}

impl TickerRecord {
    /// A registered ticker with nothing computed yet.
    pub fn pending(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            forecast: None,
            max_profit: None,
            sequential: None,
        }
    }

    pub fn with_forecast(ticker: impl Into<String>, forecast: Forecast) -> Self {
        Self {
            forecast: Some(forecast),
            ..Self::pending(ticker)
        }
    }

    /// The forecast price series, or a data error if none was produced.
    pub fn forecast_series(&self) -> Result<&PriceSeries, ForecastError> {
        self.forecast
            .as_ref()
            .map(|f| &f.forecast)
            .ok_or_else(|| ForecastError::Data {
                ticker: self.ticker.clone(),
            })
    }

    /// The max-profit ledger, or a data error if it was never computed.
    pub fn max_profit_ledger(&self) -> Result<&TradeLedger, ForecastError> {
        self.max_profit.as_ref().ok_or_else(|| ForecastError::Data {
            ticker: self.ticker.clone(),
        })
    }

    /// The sequential ledger, or a data error if it was never computed.
    pub fn sequential_ledger(&self) -> Result<&TradeLedger, ForecastError> {
        self.sequential.as_ref().ok_or_else(|| ForecastError::Data {
            ticker: self.ticker.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

type Slot = Arc<RwLock<Arc<TickerRecord>>>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared ticker → record cache.
pub struct TickerStore {
    policy: TickerPolicy,
    slots: RwLock<BTreeMap<String, Slot>>,
    span: Span,
}

impl Default for TickerStore {
    fn default() -> Self {
        Self::new(TickerPolicy::default())
    }
}

impl TickerStore {
    pub fn new(policy: TickerPolicy) -> Self {
        Self::with_span(policy, info_span!("ticker_store"))
    }

    /// Store that logs inside the given span.
    pub fn with_span(policy: TickerPolicy, span: Span) -> Self {
        Self {
            policy,
            slots: RwLock::new(BTreeMap::new()),
            span,
        }
    }

    pub fn policy(&self) -> &TickerPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        read(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.slots).is_empty()
    }

    /// All known tickers, sorted.
    pub fn tickers(&self) -> Vec<String> {
        read(&self.slots).keys().cloned().collect()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        read(&self.slots).contains_key(ticker)
    }

    /// Register a ticker with an empty record. Returns `false` if it was
    /// already present, in which case its record is left alone.
    pub fn register(&self, ticker: &str) -> Result<bool, ForecastError> {
        self.policy.validate(ticker)?;
        let _enter = self.span.enter();

        let mut slots = write(&self.slots);
        if slots.contains_key(ticker) {
            return Ok(false);
        }
        slots.insert(
            ticker.to_string(),
            Arc::new(RwLock::new(Arc::new(TickerRecord::pending(ticker)))),
        );
        info!(ticker, "Ticker registered");
        Ok(true)
    }

    /// Replace a ticker's whole record with a fresh forecast. Previously
    /// computed ledgers are dropped.
    pub fn put_forecast(
        &self,
        ticker: &str,
        forecast: Forecast,
    ) -> Result<Arc<TickerRecord>, ForecastError> {
        self.policy.validate(ticker)?;
        let _enter = self.span.enter();

        let record = Arc::new(TickerRecord::with_forecast(ticker, forecast));
        let slot = {
            let mut slots = write(&self.slots);
            slots
                .entry(ticker.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(Arc::clone(&record))))
                .clone()
        };
        *write(&slot) = Arc::clone(&record);

        debug!(ticker, "Forecast stored");
        Ok(record)
    }

    /// Snapshot of a ticker's current record.
    pub fn get(&self, ticker: &str) -> Result<Arc<TickerRecord>, ForecastError> {
        let slot = self.slot(ticker)?;
        let record = Arc::clone(&read(&slot));
        Ok(record)
    }

    /// Build a replacement record from the current one and swap it in.
    ///
    /// Runs with the ticker's write lock held, so concurrent updates to the
    /// same ticker are serialized. If `f` fails the record is untouched.
    pub fn update<F>(&self, ticker: &str, f: F) -> Result<Arc<TickerRecord>, ForecastError>
    where
        F: FnOnce(&TickerRecord) -> Result<TickerRecord, ForecastError>,
    {
        let slot = self.slot(ticker)?;
        let _enter = self.span.enter();

        let mut current = write(&slot);
        let next = Arc::new(f(&current)?);
        *current = Arc::clone(&next);

        debug!(ticker, "Record replaced");
        Ok(next)
    }

    /// Drop a ticker and return its last record.
    pub fn remove(&self, ticker: &str) -> Result<Arc<TickerRecord>, ForecastError> {
        self.policy.validate(ticker)?;
        let slot = write(&self.slots)
            .remove(ticker)
            .ok_or_else(|| ForecastError::UnknownTicker(ticker.to_string()))?;
        let record = Arc::clone(&read(&slot));
        Ok(record)
    }

    fn slot(&self, ticker: &str) -> Result<Slot, ForecastError> {
        self.policy.validate(ticker)?;
        read(&self.slots)
            .get(ticker)
            .cloned()
            .ok_or_else(|| ForecastError::UnknownTicker(ticker.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
