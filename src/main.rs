//! Forecaster: buy/sell signal detection over forecast price series.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads forecasts for the configured tickers, runs both scanners and
//! prints the resulting action tables.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use forecaster::config;
use forecaster::engine::Forecaster;
use forecaster::provider::{ForecastProvider, JsonFileProvider};
use forecaster::storage;
use forecaster::store::TickerStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = config::AppConfig::path_from_env();
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        tickers = cfg.tickers.symbols.len(),
        params = %cfg.forecast,
        forecast_dir = %cfg.data.forecast_dir.display(),
        "Forecaster starting up"
    );

    // -- Initialise components -------------------------------------------

    let provider = JsonFileProvider::new(&cfg.data.forecast_dir);
    info!(provider = provider.name(), "Forecast provider ready");
    let store = Arc::new(TickerStore::new(cfg.tickers.policy()));
    let forecaster = Forecaster::new(Box::new(provider), store, cfg.forecast.clone());

    let rejected = forecaster.add_tickers(&cfg.tickers.symbols);
    if !rejected.is_empty() {
        warn!(?rejected, "Some configured tickers were rejected");
    }

    // -- Forecast and scan -------------------------------------------------

    let report = forecaster.forecast(&[] as &[&str]).await;
    for failure in &report.failed {
        warn!(ticker = %failure.ticker, reason = %failure.reason, "Forecast failed");
    }
    if report.succeeded.is_empty() {
        error!("No forecasts available, nothing to scan");
        return Ok(());
    }

    forecaster.find_max_profit(&report.succeeded)?;
    forecaster.find_best_trades(&report.succeeded)?;

    // -- Report ------------------------------------------------------------

    for ticker in &report.succeeded {
        let record = forecaster.ticker(ticker)?;
        let max_profit = record.max_profit_ledger()?;
        let sequential = record.sequential_ledger()?;

        println!("\n=== {ticker} ===");
        println!("\nMax profit ({}%):\n{}", max_profit.profit_pct(), max_profit.actions_table());
        println!("\nSequential trades:\n{}", sequential.actions_table());

        if cfg.output.show_history {
            println!("\nMax profit history:\n{}", max_profit.history_table());
            println!("\nSequential history:\n{}", sequential.history_table());
        }

        if let Some(dir) = &cfg.output.report_dir {
            let path = storage::save_record(&record, dir)?;
            info!(ticker = %ticker, path = %path.display(), "Record written");
        }
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Forecaster finished"
    );
    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Uses JSON output when `FORECASTER_LOG_JSON` is set, human-readable
/// otherwise. `RUST_LOG` overrides the default `forecaster=info` filter.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forecaster=info"));

    if std::env::var("FORECASTER_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
