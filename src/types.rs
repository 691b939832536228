//! Shared types for the forecaster.
//!
//! Periods, price series, per-period trade records, forecast parameters
//! and the domain error type. Scanner, ledger, store and provider modules
//! all depend on these without depending on each other.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
}

impl Interval {
    /// Length of one period in calendar days.
    pub fn days(&self) -> i64 {
        match self {
            Interval::Daily => 1,
            Interval::Weekly => 7,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "1d"),
            Interval::Weekly => write!(f, "1wk"),
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" | "d" | "daily" => Ok(Interval::Daily),
            "1wk" | "w" | "weekly" => Ok(Interval::Weekly),
            _ => Err(anyhow::anyhow!("Unknown interval: {s}")),
        }
    }
}

/// A discrete time bucket holding one price observation.
///
/// Weekly periods are anchored on the Monday of their week, so any date
/// inside the week maps to the same period. Subtracting two periods of
/// the same interval yields the number of whole periods between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "PeriodRepr")]
pub struct Period {
    start: NaiveDate,
    interval: Interval,
}

/// Wire shape of a `Period`; loading re-anchors through `Period::new`.
#[derive(Deserialize)]
struct PeriodRepr {
    start: NaiveDate,
    interval: Interval,
}

impl From<PeriodRepr> for Period {
    fn from(repr: PeriodRepr) -> Self {
        Period::new(repr.start, repr.interval)
    }
}

impl Period {
    /// The period of the given interval containing `date`.
    pub fn new(date: NaiveDate, interval: Interval) -> Self {
        let start = match interval {
            Interval::Daily => date,
            Interval::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
        };
        Self { start, interval }
    }

    pub fn daily(date: NaiveDate) -> Self {
        Self::new(date, Interval::Daily)
    }

    pub fn weekly(date: NaiveDate) -> Self {
        Self::new(date, Interval::Weekly)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day covered by this period.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.interval.days() - 1)
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// The immediately following period.
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// The period `n` steps away (negative = earlier).
    pub fn offset(&self, n: i64) -> Self {
        Self {
            start: self.start + Duration::days(n * self.interval.days()),
            interval: self.interval,
        }
    }

    /// Number of whole periods from `earlier` to `self`.
    pub fn periods_since(&self, earlier: &Period) -> i64 {
        debug_assert_eq!(self.interval, earlier.interval, "mixed-interval subtraction");
        (self.start - earlier.start).num_days() / self.interval.days()
    }
}

impl Sub for Period {
    type Output = i64;

    fn sub(self, rhs: Period) -> i64 {
        self.periods_since(&rhs)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval {
            Interval::Daily => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Interval::Weekly => write!(
                f,
                "{}/{}",
                self.start.format("%Y-%m-%d"),
                self.end().format("%Y-%m-%d")
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Price series
// ---------------------------------------------------------------------------

/// One observed or forecast price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub period: Period,
    pub price: f64,
}

impl PricePoint {
    pub fn new(period: Period, price: f64) -> Self {
        Self { period, price }
    }
}

/// An ordered, immutable sequence of price points.
///
/// Periods are strictly increasing and share one interval; prices are
/// finite. Negative prices are not rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, ForecastError> {
        for point in &points {
            if !point.price.is_finite() {
                return Err(ForecastError::InvalidSeries(format!(
                    "non-finite price {} at {}",
                    point.price, point.period
                )));
            }
        }
        for pair in points.windows(2) {
            let (prev, next) = (&pair[0].period, &pair[1].period);
            if prev.interval() != next.interval() {
                return Err(ForecastError::InvalidSeries(format!(
                    "mixed intervals: {} then {}",
                    prev.interval(),
                    next.interval()
                )));
            }
            if next <= prev {
                return Err(ForecastError::InvalidSeries(format!(
                    "periods not strictly increasing: {prev} then {next}"
                )));
            }
        }
        Ok(Self { points })
    }

    /// Consecutive periods starting at `start`, one per price.
    pub fn from_prices(start: Period, prices: &[f64]) -> Result<Self, ForecastError> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint::new(start.offset(i as i64), price))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Price observed at `period`, if the series covers it.
    pub fn price_at(&self, period: &Period) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.period.cmp(period))
            .ok()
            .map(|i| self.points[i].price)
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = ForecastError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

// ---------------------------------------------------------------------------
// Trade records
// ---------------------------------------------------------------------------

/// Trade instruction attached to a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// Audit markers stamped by the max-profit scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    NewLow,
    NewHigh,
    NewMaxProfit,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::NewLow => write!(f, "new_low"),
            Marker::NewHigh => write!(f, "new_high"),
            Marker::NewMaxProfit => write!(f, "new_max_profit"),
        }
    }
}

/// Annotated row for one period of a scanned series.
///
/// Only `current` is always present. A max-profit row may carry several
/// markers at once (a new high that is also a new best pair).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeRecord {
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_max_profit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<TradeAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_period: Option<i64>,
}

impl TradeRecord {
    pub fn new(current: f64) -> Self {
        Self {
            current,
            ..Default::default()
        }
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        match marker {
            Marker::NewLow => self.new_low.is_some(),
            Marker::NewHigh => self.new_high.is_some(),
            Marker::NewMaxProfit => self.new_max_profit.is_some(),
        }
    }

    /// Markers set on this row, in column order.
    pub fn markers(&self) -> Vec<Marker> {
        [Marker::NewLow, Marker::NewHigh, Marker::NewMaxProfit]
            .into_iter()
            .filter(|m| self.has_marker(*m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Forecast parameters & metadata
// ---------------------------------------------------------------------------

/// Which price of each interval the forecast is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    Open,
    Close,
    High,
    Low,
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceType::Open => write!(f, "Open"),
            PriceType::Close => write!(f, "Close"),
            PriceType::High => write!(f, "High"),
            PriceType::Low => write!(f, "Low"),
        }
    }
}

/// Parameters handed to the forecasting collaborator.
///
/// The scanners never read these; they travel with the forecast as
/// metadata so a stored result can be traced back to its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParams {
    pub price_type: PriceType,
    /// Length of history to fit on: "5y", "1y", "ytd", "10y".
    pub history: String,
    pub interval: Interval,
    /// (p, d, q)
    pub order: (u32, u32, u32),
    /// (P, D, Q, m)
    pub seasonal_order: (u32, u32, u32, u32),
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            price_type: PriceType::Close,
            history: "5y".to_string(),
            interval: Interval::Weekly,
            order: (0, 1, 1),
            seasonal_order: (2, 1, 0, 52),
        }
    }
}

impl ForecastParams {
    /// Number of future periods a forecast covers: one full season plus
    /// the first period of the next.
    pub fn horizon(&self) -> usize {
        self.seasonal_order.3 as usize + 1
    }
}

impl fmt::Display for ForecastParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d, q) = self.order;
        let (sp, sd, sq, m) = self.seasonal_order;
        write!(
            f,
            "price_type={} history={} interval={} order=({p},{d},{q}) seasonal_order=({sp},{sd},{sq},{m})",
            self.price_type, self.history, self.interval,
        )
    }
}

/// Opaque description of the model run that produced a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    pub model: String,
    pub params: ForecastParams,
    #[serde(default)]
    pub aic: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

impl ForecastMetadata {
    pub fn new(model: impl Into<String>, params: ForecastParams) -> Self {
        Self {
            model: model.into(),
            params,
            aic: None,
            generated_at: Utc::now(),
        }
    }
}

/// Output of the forecasting collaborator for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Observed prices the model was fitted on.
    pub history: PriceSeries,
    /// Predicted prices over the forecast horizon.
    pub forecast: PriceSeries,
    pub metadata: ForecastMetadata,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors raised by the scanning core and the ticker store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForecastError {
    #[error("No forecast available for {ticker}")]
    Data { ticker: String },

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Invalid ticker {ticker:?}: {reason}")]
    Validation { ticker: String, reason: String },

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
