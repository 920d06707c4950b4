//! Boundary normalization of loosely-typed records.
//!
//! Legacy exports predate the `status` field; openness is inferred from
//! exit-price presence. Every record entering the crate passes through here
//! exactly once, so the statistics engine can assume fully-populated trades.

use chrono::Utc;

use crate::models::{RawTrade, Trade, TradeStatus};

/// Classify a raw record's status. Explicit status wins; otherwise a missing
/// exit price means the position is still open.
pub fn infer_status(raw: &RawTrade) -> TradeStatus {
    match raw.status {
        Some(status) => status,
        None => {
            if raw.exit_price.is_some() {
                TradeStatus::Closed
            } else {
                TradeStatus::Open
            }
        }
    }
}

/// Fill defaults and resolve legacy fields, producing a normalized trade.
pub fn normalize_trade(raw: RawTrade) -> Trade {
    let status = infer_status(&raw);
    let now = Utc::now().timestamp();

    Trade {
        id: raw
            .id
            .unwrap_or_else(|| format!("TRADE-{}", uuid::Uuid::new_v4())),
        date: raw.date,
        exit_date: raw.exit_date,
        symbol: raw.symbol,
        direction: raw.direction,
        status,
        entry_price: raw.entry_price,
        exit_price: raw.exit_price,
        pnl: raw.pnl,
        r_multiple: raw.r_multiple,
        commission: raw.commission.unwrap_or(0.0),
        setup: raw.setup,
        tags: raw.tags,
        notes: raw.notes,
        target: raw.target,
        stop_loss: raw.stop_loss,
        entry_time: raw.entry_time,
        exit_time: raw.exit_time,
        screenshots: raw.screenshots,
        created_at: now,
        updated_at: now,
    }
}

pub fn normalize_trades(raw: Vec<RawTrade>) -> Vec<Trade> {
    raw.into_iter().map(normalize_trade).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    fn raw(exit_price: Option<f64>, status: Option<TradeStatus>) -> RawTrade {
        RawTrade {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            exit_date: None,
            symbol: "BTC/USDT".to_string(),
            direction: Direction::Long,
            status,
            entry_price: 42000.0,
            exit_price,
            pnl: exit_price.map(|_| 120.0),
            r_multiple: None,
            commission: None,
            setup: None,
            tags: Vec::new(),
            notes: String::new(),
            target: None,
            stop_loss: None,
            entry_time: None,
            exit_time: None,
            screenshots: Vec::new(),
        }
    }

    #[test]
    fn legacy_record_without_status_is_open_when_exit_missing() {
        let trade = normalize_trade(raw(None, None));
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.commission, 0.0);
    }

    #[test]
    fn legacy_record_without_status_is_closed_when_exit_present() {
        let trade = normalize_trade(raw(Some(43000.0), None));
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.pnl, Some(120.0));
    }

    #[test]
    fn explicit_status_wins_over_inference() {
        // An open position can carry a partial exit price; explicit status
        // must not be overridden.
        let trade = normalize_trade(raw(Some(43000.0), Some(TradeStatus::Open)));
        assert_eq!(trade.status, TradeStatus::Open);
    }

    #[test]
    fn generated_id_when_missing() {
        let trade = normalize_trade(raw(None, None));
        assert!(trade.id.starts_with("TRADE-"));
    }
}
