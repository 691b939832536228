//! Signal-detection engine.
//!
//! Two single-pass scanners turn a price series into a trade ledger:
//! the global best buy/sell pair and the greedy sequence of completed
//! upswings. The forecaster ties them to the provider and the store.

pub mod forecaster;
pub mod max_profit;
pub mod sequential;

pub use forecaster::{FailedForecast, ForecastReport, Forecaster};
pub use max_profit::{compute_max_profit, MaxProfitScanner};
pub use sequential::{compute_sequential_trades, SequentialTradeScanner};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

/// Round a percentage to 2 decimals, half to even on the exact binary value.
pub(crate) fn round_pct(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}

/// Percentage change from `from` to `to`, rounded to 2 decimals.
///
/// `None` when `from` is zero or the result is not representable.
pub(crate) fn pct_change(from: f64, to: f64) -> Option<Decimal> {
    if from == 0.0 {
        return None;
    }
    let raw = (to - from) / from * 100.0;
    if !raw.is_finite() {
        return None;
    }
    let pct = round_pct(raw);
    if pct.is_none() {
        warn!(from, to, raw, "Percentage change out of decimal range, treated as no gain");
    }
    pct
}
