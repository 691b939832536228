//! Forecaster: buy/sell signal detection over forecast price series.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod ledger;
pub mod engine;
pub mod store;
pub mod provider;
pub mod storage;

pub use engine::{compute_max_profit, compute_sequential_trades};
pub use ledger::{LedgerEntry, LedgerKind, RoundTrip, TradeLedger, TradeSummary};
pub use types::{ForecastError, Period, PricePoint, PriceSeries, TradeAction, TradeRecord};
