//! Persistence layer.
//!
//! Saves and loads a ticker's computed record (forecast plus ledgers) as
//! one pretty-printed JSON file per ticker.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::store::TickerRecord;

/// Path of the record file for `ticker` under `dir`.
pub fn record_path(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{ticker}.record.json"))
}

/// Save a record, creating `dir` if needed. Returns the written path.
pub fn save_record(record: &TickerRecord, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report dir {}", dir.display()))?;

    let path = record_path(dir, &record.ticker);
    let json = serde_json::to_string_pretty(record)
        .with_context(|| format!("Failed to serialise record for {}", record.ticker))?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write record to {}", path.display()))?;

    debug!(ticker = %record.ticker, path = %path.display(), "Record saved");
    Ok(path)
}

/// Load a record. Returns `None` if no file exists for `ticker`.
pub fn load_record(ticker: &str, dir: &Path) -> Result<Option<TickerRecord>> {
    let path = record_path(dir, ticker);
    if !path.exists() {
        info!(ticker, path = %path.display(), "No saved record found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read record from {}", path.display()))?;
    let record: TickerRecord = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse record from {}", path.display()))?;

    debug!(ticker, path = %path.display(), "Record loaded");
    Ok(Some(record))
}

/// Delete a saved record. Missing files are not an error.
pub fn delete_record(ticker: &str, dir: &Path) -> Result<()> {
    let path = record_path(dir, ticker);
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete record file {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
