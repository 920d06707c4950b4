//! Trade repository over the SQLite store.

use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;

use crate::db::{lock, Database};
use crate::error::{JournalError, Result};
use crate::models::{Direction, RawTrade, Trade, TradeFilters, TradeStatus};
use crate::normalize::normalize_trade;

const TRADE_COLUMNS: &str = "id, date, exit_date, symbol, direction, status, entry_price, \
     exit_price, pnl, r_multiple, commission, setup, tags, notes, target, stop_loss, \
     entry_time, exit_time, screenshots, created_at, updated_at";

fn direction_to_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long",
        Direction::Short => "short",
    }
}

fn status_to_str(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::Open => "open",
        TradeStatus::Closed => "closed",
    }
}

fn conversion_err(index: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn parse_date(index: usize, text: String) -> rusqlite::Result<NaiveDate> {
    text.parse().map_err(|e| conversion_err(index, e))
}

fn parse_direction(index: usize, text: String) -> rusqlite::Result<Direction> {
    match text.as_str() {
        "long" => Ok(Direction::Long),
        "short" => Ok(Direction::Short),
        other => Err(conversion_err(
            index,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown direction: {other}"),
            ),
        )),
    }
}

fn parse_status(index: usize, text: String) -> rusqlite::Result<TradeStatus> {
    match text.as_str() {
        "open" => Ok(TradeStatus::Open),
        "closed" => Ok(TradeStatus::Closed),
        other => Err(conversion_err(
            index,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown status: {other}"),
            ),
        )),
    }
}

fn parse_string_list(index: usize, text: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&text).map_err(|e| conversion_err(index, e))
}

fn map_row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        date: parse_date(1, row.get(1)?)?,
        exit_date: row
            .get::<_, Option<String>>(2)?
            .map(|d| parse_date(2, d))
            .transpose()?,
        symbol: row.get(3)?,
        direction: parse_direction(4, row.get(4)?)?,
        status: parse_status(5, row.get(5)?)?,
        entry_price: row.get(6)?,
        exit_price: row.get(7)?,
        pnl: row.get(8)?,
        r_multiple: row.get(9)?,
        commission: row.get(10)?,
        setup: row.get(11)?,
        tags: parse_string_list(12, row.get(12)?)?,
        notes: row.get(13)?,
        target: row.get(14)?,
        stop_loss: row.get(15)?,
        entry_time: row.get(16)?,
        exit_time: row.get(17)?,
        screenshots: parse_string_list(18, row.get(18)?)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

fn insert_with_fingerprint(
    conn: &rusqlite::Connection,
    trade: &Trade,
    fingerprint: Option<&str>,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO trades ({TRADE_COLUMNS}, import_fingerprint)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        rusqlite::params![
            trade.id,
            trade.date.to_string(),
            trade.exit_date.map(|d| d.to_string()),
            trade.symbol,
            direction_to_str(trade.direction),
            status_to_str(trade.status),
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            trade.r_multiple,
            trade.commission,
            trade.setup,
            serde_json::to_string(&trade.tags)?,
            trade.notes,
            trade.target,
            trade.stop_loss,
            trade.entry_time,
            trade.exit_time,
            serde_json::to_string(&trade.screenshots)?,
            trade.created_at,
            trade.updated_at,
            fingerprint,
        ],
    )?;
    Ok(())
}

/// Persist an already-normalized trade as-is.
pub fn insert_trade(db: &Database, trade: &Trade) -> Result<()> {
    let conn = lock(db)?;
    insert_with_fingerprint(&conn, trade, None)
}

/// Normalize a raw record and persist it. The stored trade is returned.
pub fn create_trade(db: &Database, raw: RawTrade) -> Result<Trade> {
    let trade = normalize_trade(raw);
    {
        let conn = lock(db)?;
        insert_with_fingerprint(&conn, &trade, None)?;
    }
    get_trade(db, &trade.id)
}

pub fn get_trade(db: &Database, id: &str) -> Result<Trade> {
    let conn = lock(db)?;
    conn.query_row(
        &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?"),
        [id],
        map_row_to_trade,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => JournalError::NotFound(format!("trade {id}")),
        other => other.into(),
    })
}

pub fn list_trades(db: &Database, filters: &TradeFilters) -> Result<Vec<Trade>> {
    let conn = lock(db)?;

    let mut query = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE 1=1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = filters.status {
        query.push_str(" AND status = ?");
        params.push(Box::new(status_to_str(status).to_string()));
    }
    if let Some(symbol) = &filters.symbol {
        query.push_str(" AND symbol LIKE ?");
        params.push(Box::new(format!("%{}%", symbol)));
    }
    if let Some(start) = filters.start_date {
        query.push_str(" AND date >= ?");
        params.push(Box::new(start.to_string()));
    }
    if let Some(end) = filters.end_date {
        query.push_str(" AND date <= ?");
        params.push(Box::new(end.to_string()));
    }

    query.push_str(" ORDER BY date ASC, created_at ASC");

    if let (Some(page), Some(limit)) = (filters.page, filters.limit) {
        let offset = (page - 1) * limit;
        query.push_str(" LIMIT ? OFFSET ?");
        params.push(Box::new(limit));
        params.push(Box::new(offset));
    }

    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&query)?;
    let trades = stmt
        .query_map(param_refs.as_slice(), map_row_to_trade)?
        .collect::<rusqlite::Result<Vec<Trade>>>()?;
    Ok(trades)
}

/// Apply a partial JSON patch. Only known fields are honored; unknown keys
/// are ignored so older clients can keep sending their payloads.
pub fn update_trade(db: &Database, id: &str, patch: &serde_json::Value) -> Result<Trade> {
    {
        let conn = lock(db)?;
        let now = Utc::now().timestamp();

        let mut updates = vec!["updated_at = ?"];
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(status) = patch.get("status").and_then(|v| v.as_str()) {
            updates.push("status = ?");
            values.push(Box::new(status.to_string()));
        }
        if let Some(exit_date) = patch.get("exit_date").and_then(|v| v.as_str()) {
            updates.push("exit_date = ?");
            values.push(Box::new(exit_date.to_string()));
        }
        if let Some(exit_price) = patch.get("exit_price").and_then(|v| v.as_f64()) {
            updates.push("exit_price = ?");
            values.push(Box::new(exit_price));
        }
        if let Some(pnl) = patch.get("pnl").and_then(|v| v.as_f64()) {
            updates.push("pnl = ?");
            values.push(Box::new(pnl));
        }
        if let Some(r_multiple) = patch.get("r_multiple").and_then(|v| v.as_f64()) {
            updates.push("r_multiple = ?");
            values.push(Box::new(r_multiple));
        }
        if let Some(commission) = patch.get("commission").and_then(|v| v.as_f64()) {
            updates.push("commission = ?");
            values.push(Box::new(commission));
        }
        if let Some(setup) = patch.get("setup").and_then(|v| v.as_str()) {
            updates.push("setup = ?");
            values.push(Box::new(setup.to_string()));
        }
        if let Some(tags) = patch.get("tags").and_then(|v| v.as_array()) {
            updates.push("tags = ?");
            values.push(Box::new(serde_json::to_string(tags)?));
        }
        if let Some(notes) = patch.get("notes").and_then(|v| v.as_str()) {
            updates.push("notes = ?");
            values.push(Box::new(notes.to_string()));
        }
        if let Some(target) = patch.get("target").and_then(|v| v.as_f64()) {
            updates.push("target = ?");
            values.push(Box::new(target));
        }
        if let Some(stop_loss) = patch.get("stop_loss").and_then(|v| v.as_f64()) {
            updates.push("stop_loss = ?");
            values.push(Box::new(stop_loss));
        }
        if let Some(entry_time) = patch.get("entry_time").and_then(|v| v.as_str()) {
            updates.push("entry_time = ?");
            values.push(Box::new(entry_time.to_string()));
        }
        if let Some(exit_time) = patch.get("exit_time").and_then(|v| v.as_str()) {
            updates.push("exit_time = ?");
            values.push(Box::new(exit_time.to_string()));
        }
        if let Some(screenshots) = patch.get("screenshots").and_then(|v| v.as_array()) {
            updates.push("screenshots = ?");
            values.push(Box::new(serde_json::to_string(screenshots)?));
        }

        let query = format!("UPDATE trades SET {} WHERE id = ?", updates.join(", "));
        values.push(Box::new(id.to_string()));

        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&query, param_refs.as_slice())?;
    }

    get_trade(db, id)
}

pub fn delete_trade(db: &Database, id: &str) -> Result<()> {
    let conn = lock(db)?;
    conn.execute("DELETE FROM trades WHERE id = ?", [id])?;
    Ok(())
}

/// Insert an imported trade unless its fingerprint is already present.
/// Returns false for a duplicate.
pub fn upsert_imported(db: &Database, trade: &Trade, fingerprint: &str) -> Result<bool> {
    let conn = lock(db)?;
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trades WHERE import_fingerprint = ?",
        [fingerprint],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Ok(false);
    }
    insert_with_fingerprint(&conn, trade, Some(fingerprint))?;
    Ok(true)
}
