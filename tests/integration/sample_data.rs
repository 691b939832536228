//! The shipped config and sample forecast file work together.

use std::path::Path;
use std::sync::Arc;

use forecaster::config::AppConfig;
use forecaster::engine::Forecaster;
use forecaster::provider::{ForecastProvider, JsonFileProvider};
use forecaster::store::TickerStore;
use forecaster::types::TradeAction;

fn manifest_path(rel: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(rel)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn test_shipped_config_parses() {
    let cfg = AppConfig::load(&manifest_path("config.toml")).unwrap();
    assert_eq!(cfg.tickers.symbols, vec!["SPY"]);
    assert_eq!(cfg.forecast.horizon(), 53);
}

#[tokio::test]
async fn test_sample_forecast_runs_through_scanners() {
    let cfg = AppConfig::load(&manifest_path("config.toml")).unwrap();
    let provider = JsonFileProvider::new(manifest_path("data/forecasts"));
    assert_eq!(provider.name(), "json_file");

    let forecaster = Forecaster::new(
        Box::new(provider),
        Arc::new(TickerStore::new(cfg.tickers.policy())),
        cfg.forecast.clone(),
    );
    assert!(forecaster.add_tickers(&cfg.tickers.symbols).is_empty());

    let report = forecaster.forecast(&[] as &[&str]).await;
    assert!(report.is_complete(), "{:?}", report.failed);

    forecaster.find_max_profit(&report.succeeded).unwrap();
    forecaster.find_best_trades(&report.succeeded).unwrap();

    let spy = forecaster.ticker("SPY").unwrap();
    assert_eq!(spy.forecast_series().unwrap().len(), cfg.forecast.horizon());

    let best = spy.max_profit_ledger().unwrap();
    let actions: Vec<_> = best
        .actions_only()
        .iter()
        .filter_map(|e| e.record.action)
        .collect();
    assert_eq!(actions, vec![TradeAction::Buy, TradeAction::Sell]);
    assert!(best.profit_pct() > rust_decimal::Decimal::ZERO);

    // Every closed upswing shows up as a round trip
    let seq = spy.sequential_ledger().unwrap();
    assert_eq!(seq.round_trips().len(), seq.summary().unwrap().trades);
}
