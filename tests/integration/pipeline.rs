//! End-to-end runs of the forecaster against the mock provider.

use rust_decimal_macros::dec;
use std::sync::Arc;

use forecaster::engine::Forecaster;
use forecaster::storage;
use forecaster::store::{TickerPolicy, TickerStore};
use forecaster::types::*;

use crate::mock_provider::{first_period, MockProvider, LADDER, SWING};

fn forecaster_with(mock: &MockProvider) -> Forecaster {
    Forecaster::new(
        Box::new(mock.clone()),
        Arc::new(TickerStore::new(TickerPolicy::default())),
        ForecastParams::default(),
    )
}

#[tokio::test]
async fn test_full_pipeline() {
    let mock = MockProvider::new();
    let forecaster = forecaster_with(&mock);

    let rejected = forecaster.add_tickers(&["SPY", "QQQ", "nvda", "TOOLONG"]);
    assert_eq!(rejected, vec!["nvda", "TOOLONG"]);

    let report = forecaster.forecast(&[] as &[&str]).await;
    assert!(report.is_complete());
    assert_eq!(report.succeeded, vec!["QQQ", "SPY"]);
    assert_eq!(mock.calls(), vec!["QQQ", "SPY"]);

    forecaster.find_max_profit(&report.succeeded).unwrap();
    forecaster.find_best_trades(&report.succeeded).unwrap();

    // Best single pair on the swing series
    let spy = forecaster.ticker("SPY").unwrap();
    let best = spy.max_profit_ledger().unwrap();
    assert_eq!(best.len(), SWING.len());
    assert_eq!(best.profit_pct(), dec!(87.5));
    let trips = best.round_trips();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].buy, first_period().offset(2));
    assert_eq!(trips[0].sell, first_period().offset(3));
    assert_eq!(trips[0].buy_price, 8.0);
    assert_eq!(trips[0].sell_price, 15.0);

    // Greedy upswings on the ladder series
    let qqq = forecaster.ticker("QQQ").unwrap();
    let seq = qqq.sequential_ledger().unwrap();
    assert_eq!(seq.len(), LADDER.len());
    let summary = seq.summary().unwrap();
    assert_eq!(summary.trades, 2);
    assert_eq!(summary.compound_gain_pct, dec!(110));
    assert_eq!(summary.total_hold_periods, 2);

    let profits: Vec<_> = seq.round_trips().iter().map(|t| t.profit_pct).collect();
    assert_eq!(profits, vec![dec!(40), dec!(50)]);

    // Trailing rise 4 -> 10 stays open
    let last = seq.record(&first_period().offset(5)).unwrap();
    assert!(last.action.is_none());

    let table = seq.actions_table().to_string();
    assert!(table.contains("Compound gain"));
    assert!(table.contains("110.00"));
}

#[tokio::test]
async fn test_partial_failure_keeps_other_tickers() {
    let mock = MockProvider::new();
    let forecaster = forecaster_with(&mock);
    forecaster.add_tickers(&["SPY", "IWM"]);

    let report = forecaster.forecast(&[] as &[&str]).await;
    assert_eq!(report.succeeded, vec!["SPY"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].ticker, "IWM");
    assert!(report.failed[0].reason.contains("no forecast"));

    // IWM has no forecast, so scanning it is a data error
    let err = forecaster.find_max_profit(&["IWM"]).unwrap_err();
    assert_eq!(err, ForecastError::Data { ticker: "IWM".into() });
    assert!(forecaster.find_max_profit(&report.succeeded).is_ok());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_record() {
    let mock = MockProvider::new();
    let forecaster = forecaster_with(&mock);
    forecaster.add_tickers(&["SPY"]);
    forecaster.forecast(&["SPY"]).await;
    forecaster.find_max_profit(&["SPY"]).unwrap();

    mock.set_error("provider down");
    let report = forecaster.forecast(&["SPY"]).await;
    assert!(!report.is_complete());

    let spy = forecaster.ticker("SPY").unwrap();
    assert_eq!(spy.max_profit_ledger().unwrap().profit_pct(), dec!(87.5));

    mock.clear_error();
    mock.set_forecast("SPY", &[20.0, 10.0, 30.0]);
    let report = forecaster.forecast(&["SPY"]).await;
    assert!(report.is_complete());

    // A fresh forecast drops ledgers computed from the old one
    let spy = forecaster.ticker("SPY").unwrap();
    assert!(spy.max_profit_ledger().is_err());
    forecaster.find_max_profit(&["SPY"]).unwrap();
    let spy = forecaster.ticker("SPY").unwrap();
    assert_eq!(spy.max_profit_ledger().unwrap().profit_pct(), dec!(200));
}

#[tokio::test]
async fn test_unknown_ticker_lookup() {
    let forecaster = forecaster_with(&MockProvider::new());
    assert_eq!(
        forecaster.ticker("DIA").unwrap_err(),
        ForecastError::UnknownTicker("DIA".into())
    );
    assert!(matches!(
        forecaster.ticker("dia").unwrap_err(),
        ForecastError::Validation { .. }
    ));
}

#[tokio::test]
async fn test_saved_record_round_trips() {
    let mock = MockProvider::new();
    let forecaster = forecaster_with(&mock);
    forecaster.add_tickers(&["QQQ"]);
    forecaster.forecast(&["QQQ"]).await;
    forecaster.find_max_profit(&["QQQ"]).unwrap();
    forecaster.find_best_trades(&["QQQ"]).unwrap();

    let dir = std::env::temp_dir().join(format!("forecaster_it_{}", uuid::Uuid::new_v4()));
    let record = forecaster.ticker("QQQ").unwrap();
    storage::save_record(&record, &dir).unwrap();

    let loaded = storage::load_record("QQQ", &dir).unwrap().unwrap();
    assert_eq!(loaded, *record);

    std::fs::remove_dir_all(&dir).unwrap();
}
