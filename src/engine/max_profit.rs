//! Global single-trade optimizer.
//!
//! One left-to-right pass tracks the lowest price seen so far and the
//! highest price since that low. The best (low, high) pair by percentage
//! gain becomes the ledger's only buy and sell.

use rust_decimal::Decimal;
use tracing::{debug, info, info_span, Span};

use crate::ledger::{LedgerEntry, LedgerKind, TradeLedger};
use crate::types::{PriceSeries, TradeAction, TradeRecord};

use super::pct_change;

#[derive(Debug, Clone, Copy)]
struct Extreme {
    index: usize,
    price: f64,
}

/// Finds the single highest-percentage buy-then-sell pair in a series.
#[derive(Debug, Clone)]
pub struct MaxProfitScanner {
    span: Span,
}

impl Default for MaxProfitScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxProfitScanner {
    pub fn new() -> Self {
        Self::with_span(info_span!("max_profit"))
    }

    /// Scanner that logs inside the given span.
    pub fn with_span(span: Span) -> Self {
        Self { span }
    }

    /// Scan `series` and build its max-profit ledger.
    ///
    /// Every row carries its price; rows where a new low or high was set,
    /// where the running profit changed, or where the best pair improved
    /// carry the matching annotation. Equal profits never replace the
    /// recorded pair, so the earliest optimum wins.
    pub fn scan(&self, series: &PriceSeries) -> TradeLedger {
        let _enter = self.span.enter();

        let points = series.points();
        let Some(first) = points.first() else {
            debug!("Empty series, nothing to scan");
            return TradeLedger::new(LedgerKind::MaxProfit, Vec::new(), Decimal::ZERO, None);
        };

        let mut entries: Vec<LedgerEntry> = Vec::with_capacity(points.len());
        let mut low = Extreme { index: 0, price: first.price };
        let mut high = low;
        let mut max_profit = Decimal::ZERO;
        let mut best: Option<(usize, usize)> = None;
        let mut last_profit: Option<Decimal> = None;

        for (i, point) in points.iter().enumerate() {
            let price = point.price;
            let mut record = TradeRecord::new(price);

            if i == 0 || low.price == 0.0 {
                // A zero floor has no percentage gain; restart from here.
                low = Extreme { index: i, price };
                high = low;
                record.new_low = Some(price);
            } else if price < low.price {
                // A new floor discards the high seen since the old one.
                low = Extreme { index: i, price };
                high = low;
                record.new_low = Some(price);
            } else if price > high.price {
                high = Extreme { index: i, price };
                record.new_high = Some(price);
            }

            let profit = pct_change(low.price, high.price).unwrap_or(Decimal::ZERO);
            if profit > Decimal::ZERO && last_profit != Some(profit) {
                record.profit_pct = Some(profit);
            }
            last_profit = Some(profit);

            if profit > max_profit {
                max_profit = profit;
                best = Some((low.index, high.index));
                record.new_max_profit = Some(profit);
                debug!(
                    period = %point.period,
                    buy = %points[low.index].period,
                    sell = %points[high.index].period,
                    profit_pct = %profit,
                    "New max profit"
                );
            }

            entries.push(LedgerEntry {
                period: point.period,
                record,
            });
        }

        if let Some((buy, sell)) = best {
            entries[buy].record.action = Some(TradeAction::Buy);
            entries[sell].record.action = Some(TradeAction::Sell);
            info!(
                points = points.len(),
                buy = %entries[buy].period,
                sell = %entries[sell].period,
                profit_pct = %max_profit,
                "Max profit found"
            );
        } else {
            info!(points = points.len(), "No profitable pair");
        }

        TradeLedger::new(LedgerKind::MaxProfit, entries, max_profit, None)
    }
}

/// Max-profit ledger for `series` using a default scanner.
pub fn compute_max_profit(series: &PriceSeries) -> TradeLedger {
    MaxProfitScanner::new().scan(series)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Marker, Period};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn p(i: i64) -> Period {
        Period::weekly(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).offset(i)
    }

    fn series(prices: &[f64]) -> PriceSeries {
        PriceSeries::from_prices(p(0), prices).unwrap()
    }

    fn action_periods(ledger: &TradeLedger) -> Vec<(Period, TradeAction)> {
        ledger
            .actions_only()
            .into_iter()
            .map(|e| (e.period, e.record.action.unwrap()))
            .collect()
    }

    #[test]
    fn test_buy_at_lowest_before_highest() {
        let ledger = compute_max_profit(&series(&[10.0, 12.0, 8.0, 15.0, 9.0]));
        assert_eq!(
            action_periods(&ledger),
            vec![(p(2), TradeAction::Buy), (p(3), TradeAction::Sell)]
        );
        assert_eq!(ledger.profit_pct(), dec!(87.5));
        assert_eq!(ledger.kind(), LedgerKind::MaxProfit);
        assert!(ledger.summary().is_none());
    }

    #[test]
    fn test_audit_markers() {
        let ledger = compute_max_profit(&series(&[10.0, 12.0, 8.0, 15.0, 9.0]));
        let rows = ledger.full_history();
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].record.markers(), vec![Marker::NewLow]);
        assert_eq!(rows[1].record.markers(), vec![Marker::NewHigh, Marker::NewMaxProfit]);
        assert_eq!(rows[1].record.new_max_profit, Some(dec!(20)));
        assert_eq!(rows[2].record.markers(), vec![Marker::NewLow]);
        assert_eq!(rows[3].record.markers(), vec![Marker::NewHigh, Marker::NewMaxProfit]);
        assert!(rows[4].record.markers().is_empty());

        for (row, price) in rows.iter().zip([10.0, 12.0, 8.0, 15.0, 9.0]) {
            assert_eq!(row.record.current, price);
        }
    }

    #[test]
    fn test_profit_recorded_only_when_positive_and_changed() {
        let ledger = compute_max_profit(&series(&[10.0, 12.0, 11.0, 13.0, 8.0, 8.5]));
        let profits: Vec<Option<Decimal>> = ledger
            .full_history()
            .iter()
            .map(|e| e.record.profit_pct)
            .collect();
        assert_eq!(
            profits,
            vec![None, Some(dec!(20)), None, Some(dec!(30)), None, Some(dec!(6.25))]
        );
        assert_eq!(ledger.profit_pct(), dec!(30));
    }

    #[test]
    fn test_short_series_has_no_action() {
        let empty = compute_max_profit(&PriceSeries::default());
        assert!(empty.is_empty());
        assert!(empty.actions_only().is_empty());
        assert_eq!(empty.profit_pct(), Decimal::ZERO);

        let single = compute_max_profit(&series(&[42.0]));
        assert_eq!(single.len(), 1);
        assert!(single.actions_only().is_empty());
        assert_eq!(single.profit_pct(), Decimal::ZERO);
        assert_eq!(single.full_history()[0].record.new_low, Some(42.0));
    }

    #[test]
    fn test_strictly_increasing_spans_whole_series() {
        let ledger = compute_max_profit(&series(&[4.0, 5.0, 6.0, 7.0, 8.0]));
        assert_eq!(
            action_periods(&ledger),
            vec![(p(0), TradeAction::Buy), (p(4), TradeAction::Sell)]
        );
        assert_eq!(ledger.profit_pct(), dec!(100));
    }

    #[test]
    fn test_strictly_decreasing_has_no_action() {
        let ledger = compute_max_profit(&series(&[9.0, 8.0, 7.0, 6.0]));
        assert!(ledger.actions_only().is_empty());
        assert_eq!(ledger.profit_pct(), Decimal::ZERO);
        assert!(ledger
            .full_history()
            .iter()
            .all(|e| e.record.new_low.is_some() && e.record.profit_pct.is_none()));
    }

    #[test]
    fn test_tie_keeps_earliest_pair() {
        let ledger = compute_max_profit(&series(&[10.0, 20.0, 5.0, 10.0]));
        assert_eq!(
            action_periods(&ledger),
            vec![(p(0), TradeAction::Buy), (p(1), TradeAction::Sell)]
        );
        assert_eq!(ledger.profit_pct(), dec!(100));
        // The later pair still shows its running profit, but no new max.
        let last = &ledger.full_history()[3].record;
        assert_eq!(last.profit_pct, Some(dec!(100)));
        assert!(last.new_max_profit.is_none());
    }

    #[test]
    fn test_flat_series_has_no_action() {
        let ledger = compute_max_profit(&series(&[3.0, 3.0, 3.0]));
        assert!(ledger.actions_only().is_empty());
        assert_eq!(ledger.profit_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_price_restarts_floor() {
        let ledger = compute_max_profit(&series(&[5.0, 0.0, 3.0, 6.0]));
        assert_eq!(
            action_periods(&ledger),
            vec![(p(2), TradeAction::Buy), (p(3), TradeAction::Sell)]
        );
        assert_eq!(ledger.profit_pct(), dec!(100));
        let rows = ledger.full_history();
        assert_eq!(rows[1].record.new_low, Some(0.0));
        assert_eq!(rows[2].record.new_low, Some(3.0));
    }

    #[test]
    fn test_leading_zero_price() {
        let ledger = compute_max_profit(&series(&[0.0, 2.0, 4.0]));
        assert_eq!(
            action_periods(&ledger),
            vec![(p(1), TradeAction::Buy), (p(2), TradeAction::Sell)]
        );
        assert_eq!(ledger.profit_pct(), dec!(100));
    }

    #[test]
    fn test_unrepresentable_profit_never_trades() {
        let ledger = compute_max_profit(&series(&[1e-27, 1.0]));
        assert!(ledger.actions_only().is_empty());
        assert_eq!(ledger.profit_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_at_most_one_buy_and_one_sell() {
        let ledger = compute_max_profit(&series(&[5.0, 9.0, 2.0, 4.0, 1.0, 3.5, 2.0, 7.0]));
        let actions = ledger.actions_only();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].record.action, Some(TradeAction::Buy));
        assert_eq!(actions[1].record.action, Some(TradeAction::Sell));
        assert!(actions[0].period <= actions[1].period);
        // 1.0 -> 7.0
        assert_eq!(ledger.profit_pct(), dec!(600));
    }

    #[test]
    fn test_rescan_is_identical() {
        let s = series(&[10.0, 12.0, 8.0, 15.0, 9.0]);
        let scanner = MaxProfitScanner::new();
        let a = serde_json::to_string(&scanner.scan(&s)).unwrap();
        let b = serde_json::to_string(&scanner.scan(&s)).unwrap();
        assert_eq!(a, b);
    }
}
