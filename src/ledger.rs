//! Trade ledgers produced by the scanners.
//!
//! A ledger keeps one row per scanned period, in series order, and derives
//! the views callers need from it: the action-only projection, the paired
//! round trips, and (for the sequential model) the compound summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Period, TradeAction, TradeRecord};

/// Which scanner produced a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    MaxProfit,
    Sequential,
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerKind::MaxProfit => write!(f, "max profit"),
            LedgerKind::Sequential => write!(f, "sequential trades"),
        }
    }
}

/// One row of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub period: Period,
    pub record: TradeRecord,
}

/// Totals over the closed trades of a sequential ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// (Π(1 + profit_i/100) − 1) × 100, rounded to 2 decimals.
    pub compound_gain_pct: Decimal,
    pub total_hold_periods: i64,
    pub trades: usize,
}

/// A buy paired with the sell that closes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub buy: Period,
    pub buy_price: f64,
    pub sell: Period,
    pub sell_price: f64,
    pub profit_pct: Decimal,
    pub hold_periods: i64,
}

/// Ordered per-period trade history plus its derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    kind: LedgerKind,
    entries: Vec<LedgerEntry>,
    profit_pct: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<TradeSummary>,
}

impl TradeLedger {
    pub(crate) fn new(
        kind: LedgerKind,
        entries: Vec<LedgerEntry>,
        profit_pct: Decimal,
        summary: Option<TradeSummary>,
    ) -> Self {
        Self {
            kind,
            entries,
            profit_pct,
            summary,
        }
    }

    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every scanned period, in series order.
    pub fn full_history(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Rows carrying a buy or sell, in series order.
    pub fn actions_only(&self) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.record.action.is_some())
            .collect()
    }

    /// Compound totals. `None` for max-profit ledgers.
    pub fn summary(&self) -> Option<&TradeSummary> {
        self.summary.as_ref()
    }

    /// Headline profit: the best pair for a max-profit ledger, the
    /// compound gain for a sequential one. Zero when nothing was traded.
    pub fn profit_pct(&self) -> Decimal {
        self.profit_pct
    }

    pub fn record(&self, period: &Period) -> Option<&TradeRecord> {
        self.entries
            .binary_search_by(|e| e.period.cmp(period))
            .ok()
            .map(|i| &self.entries[i].record)
    }

    /// Buys paired with their closing sells.
    ///
    /// Rows are walked in order; a sell closes the most recent open buy.
    pub fn round_trips(&self) -> Vec<RoundTrip> {
        let mut trips = Vec::new();
        let mut open: Option<&LedgerEntry> = None;

        for entry in &self.entries {
            match entry.record.action {
                Some(TradeAction::Buy) => open = Some(entry),
                Some(TradeAction::Sell) => {
                    if let Some(buy) = open.take() {
                        let profit_pct = match self.kind {
                            LedgerKind::MaxProfit => self.profit_pct,
                            LedgerKind::Sequential => {
                                entry.record.profit_pct.unwrap_or(Decimal::ZERO)
                            }
                        };
                        trips.push(RoundTrip {
                            buy: buy.period,
                            buy_price: buy.record.current,
                            sell: entry.period,
                            sell_price: entry.record.current,
                            profit_pct,
                            hold_periods: entry.period - buy.period,
                        });
                    }
                }
                None => {}
            }
        }

        trips
    }

    /// Tabular rendering of every row.
    pub fn history_table(&self) -> HistoryTable<'_> {
        HistoryTable(self)
    }

    /// Tabular rendering of the action rows, with the compound summary row
    /// appended for sequential ledgers.
    pub fn actions_table(&self) -> ActionsTable<'_> {
        ActionsTable(self)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub struct HistoryTable<'a>(&'a TradeLedger);

pub struct ActionsTable<'a>(&'a TradeLedger);

const SUMMARY_LABEL: &str = "Compound gain";

fn opt<T>(value: Option<T>, render: impl Fn(T) -> String) -> String {
    value.map(render).unwrap_or_default()
}

fn price(p: f64) -> String {
    format!("{p:.2}")
}

fn pct(d: Decimal) -> String {
    format!("{d:.2}")
}

fn row_cells(kind: LedgerKind, entry: &LedgerEntry, full: bool) -> Vec<String> {
    let r = &entry.record;
    let mut cells = vec![
        entry.period.to_string(),
        price(r.current),
        opt(r.profit_pct, pct),
    ];
    if kind == LedgerKind::MaxProfit && full {
        cells.push(opt(r.new_low, price));
        cells.push(opt(r.new_high, price));
        cells.push(opt(r.new_max_profit, pct));
    }
    cells.push(opt(r.action, |a| a.to_string()));
    if kind == LedgerKind::Sequential {
        cells.push(opt(r.hold_period, |h| h.to_string()));
    }
    cells
}

fn headers(kind: LedgerKind, full: bool) -> Vec<&'static str> {
    let mut h = vec!["period", "current", "profit %"];
    if kind == LedgerKind::MaxProfit && full {
        h.extend(["new_low", "new_high", "new_max_profit"]);
    }
    h.push("action");
    if kind == LedgerKind::Sequential {
        h.push("hold period");
    }
    h
}

fn write_table(f: &mut fmt::Formatter<'_>, headers: &[&str], rows: &[Vec<String>]) -> fmt::Result {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        writeln!(f, "{}", padded.join(" | ").trim_end())
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    line(f, &header_cells)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(f, "{}", rule.join("-+-"))?;
    for row in rows {
        line(f, row)?;
    }
    Ok(())
}

impl fmt::Display for HistoryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.0;
        let rows: Vec<Vec<String>> = ledger
            .entries
            .iter()
            .map(|e| row_cells(ledger.kind, e, true))
            .collect();
        write_table(f, &headers(ledger.kind, true), &rows)
    }
}

impl fmt::Display for ActionsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.0;
        let mut rows: Vec<Vec<String>> = ledger
            .actions_only()
            .into_iter()
            .map(|e| row_cells(ledger.kind, e, false))
            .collect();
        if let Some(summary) = &ledger.summary {
            rows.push(vec![
                SUMMARY_LABEL.to_string(),
                String::new(),
                pct(summary.compound_gain_pct),
                String::new(),
                summary.total_hold_periods.to_string(),
            ]);
        }
        write_table(f, &headers(ledger.kind, false), &rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
