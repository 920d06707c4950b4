//! Broker-agnostic CSV trade import with fingerprint deduplication.
//!
//! Expected header:
//! `date,symbol,direction,entry_price,exit_price,pnl,r_multiple,commission,setup,notes`

use serde::{Deserialize, Serialize};

use crate::db::{trades, Database};
use crate::error::{JournalError, Result};
use crate::models::{Direction, RawTrade};
use crate::normalize::normalize_trade;

#[derive(Debug, Deserialize)]
struct CsvTradeRow {
    date: chrono::NaiveDate,
    symbol: String,
    direction: String,
    entry_price: f64,
    #[serde(default)]
    exit_price: Option<f64>,
    #[serde(default)]
    pnl: Option<f64>,
    #[serde(default)]
    r_multiple: Option<f64>,
    #[serde(default)]
    commission: Option<f64>,
    #[serde(default)]
    setup: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

fn parse_direction(text: &str) -> Result<Direction> {
    match text.to_ascii_lowercase().as_str() {
        "long" | "buy" => Ok(Direction::Long),
        "short" | "sell" => Ok(Direction::Short),
        other => Err(JournalError::InvalidRecord(format!(
            "unknown direction: {other}"
        ))),
    }
}

fn row_to_raw(row: CsvTradeRow) -> Result<RawTrade> {
    let direction = parse_direction(&row.direction)?;
    Ok(RawTrade {
        id: None,
        date: row.date,
        exit_date: None,
        symbol: row.symbol,
        direction,
        status: None,
        entry_price: row.entry_price,
        exit_price: row.exit_price,
        pnl: row.pnl,
        r_multiple: row.r_multiple,
        commission: row.commission,
        setup: row.setup,
        tags: Vec::new(),
        notes: row.notes.unwrap_or_default(),
        target: None,
        stop_loss: None,
        entry_time: None,
        exit_time: None,
        screenshots: Vec::new(),
    })
}

/// Stable dedup key for an imported row.
fn generate_fingerprint(raw: &RawTrade) -> String {
    format!(
        "csv|{}|{}|{:?}|{}|{:.8}",
        raw.symbol.to_lowercase(),
        raw.date,
        raw.direction,
        raw.entry_price,
        raw.pnl.unwrap_or(0.0)
    )
}

/// Parse without persisting, for an import preview. Bad rows are skipped.
pub fn preview_csv(csv_content: &str) -> Vec<RawTrade> {
    let mut reader = csv::Reader::from_reader(csv_content.as_bytes());
    reader
        .deserialize::<CsvTradeRow>()
        .filter_map(|row| row.ok())
        .filter_map(|row| row_to_raw(row).ok())
        .collect()
}

/// Import every parseable row, deduplicating on fingerprint. Row-level
/// failures are reported, not fatal.
pub fn import_csv(db: &Database, csv_content: &str) -> Result<ImportReport> {
    let mut reader = csv::Reader::from_reader(csv_content.as_bytes());
    let mut report = ImportReport::default();

    for (index, row) in reader.deserialize::<CsvTradeRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let raw = match row.map_err(JournalError::from).and_then(row_to_raw) {
            Ok(raw) => raw,
            Err(e) => {
                report.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };

        let fingerprint = generate_fingerprint(&raw);
        let trade = normalize_trade(raw);
        if trades::upsert_imported(db, &trade, &fingerprint)? {
            report.imported += 1;
        } else {
            report.duplicates += 1;
        }
    }

    log::info!(
        "CSV import: {} imported, {} duplicates, {} errors",
        report.imported,
        report.duplicates,
        report.errors.len()
    );

    Ok(report)
}
