//! Greedy multi-trade decomposer.
//!
//! Walks the series once and closes a trade at the first decline after
//! every run of rises: buy at the run's floor, sell at its last price.
//! A run still rising when the series ends stays open.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, info_span, warn, Span};

use crate::ledger::{LedgerEntry, LedgerKind, TradeLedger, TradeSummary};
use crate::types::{PriceSeries, TradeAction, TradeRecord};

use super::{pct_change, round_pct};

/// Splits a series into consecutive non-overlapping round trips.
#[derive(Debug, Clone)]
pub struct SequentialTradeScanner {
    span: Span,
}

impl Default for SequentialTradeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialTradeScanner {
    pub fn new() -> Self {
        Self::with_span(info_span!("sequential_trades"))
    }

    /// Scanner that logs inside the given span.
    pub fn with_span(span: Span) -> Self {
        Self { span }
    }

    /// Scan `series` and build its sequential-trades ledger.
    ///
    /// A flat step counts as a rise. Each sell row carries the trade's
    /// profit % and hold period; the buy row only its action.
    pub fn scan(&self, series: &PriceSeries) -> TradeLedger {
        let _enter = self.span.enter();

        let points = series.points();
        let mut entries: Vec<LedgerEntry> = points
            .iter()
            .map(|p| LedgerEntry {
                period: p.period,
                record: TradeRecord::new(p.price),
            })
            .collect();

        let mut trades: Vec<(Decimal, i64)> = Vec::new();
        let mut low = 0usize;
        let mut last = 0usize;
        let mut rising_since_low = false;

        for i in 1..points.len() {
            let price = points[i].price;

            if points[low].price == 0.0 {
                // A zero floor has no percentage gain; restart from here.
                low = i;
                rising_since_low = false;
            } else if price >= points[last].price {
                rising_since_low = true;
            } else {
                if rising_since_low {
                    let profit = pct_change(points[low].price, points[last].price)
                        .unwrap_or(Decimal::ZERO);
                    let hold = points[last].period - points[low].period;

                    let sell = &mut entries[last].record;
                    sell.action = Some(TradeAction::Sell);
                    sell.profit_pct = Some(profit);
                    sell.hold_period = Some(hold);
                    entries[low].record.action = Some(TradeAction::Buy);

                    debug!(
                        buy = %points[low].period,
                        sell = %points[last].period,
                        profit_pct = %profit,
                        hold,
                        "Trade closed"
                    );
                    trades.push((profit, hold));
                    rising_since_low = false;
                }
                low = i;
            }
            last = i;
        }

        if rising_since_low {
            debug!(
                from = %points[low].period,
                "Series ends mid-rise, trailing run left open"
            );
        }

        let summary = summarize(&trades);
        info!(
            points = points.len(),
            trades = summary.trades,
            compound_gain_pct = %summary.compound_gain_pct,
            total_hold_periods = summary.total_hold_periods,
            "Sequential trades found"
        );

        TradeLedger::new(
            LedgerKind::Sequential,
            entries,
            summary.compound_gain_pct,
            Some(summary),
        )
    }
}

fn summarize(trades: &[(Decimal, i64)]) -> TradeSummary {
    let growth = trades.iter().fold(1.0_f64, |acc, (profit, _)| {
        acc * (1.0 + profit.to_f64().unwrap_or(0.0) / 100.0)
    });
    let compound_gain_pct = round_pct((growth - 1.0) * 100.0).unwrap_or_else(|| {
        warn!(growth, "Compound gain out of range, saturating");
        Decimal::MAX
    });

    TradeSummary {
        compound_gain_pct,
        total_hold_periods: trades.iter().map(|(_, hold)| hold).sum(),
        trades: trades.len(),
    }
}

/// Sequential-trades ledger for `series` using a default scanner.
pub fn compute_sequential_trades(series: &PriceSeries) -> TradeLedger {
    SequentialTradeScanner::new().scan(series)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
