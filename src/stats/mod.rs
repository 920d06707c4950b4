//! The statistics engine: pure, stateless folds over trade and journal
//! records. Nothing in this module performs I/O, logs, or retains state
//! between calls; every function recomputes from scratch and is safe to run
//! on every refresh.

pub mod achievements;
pub mod aggregate;
pub mod bests;
pub mod comparison;
pub mod projection;
pub mod streaks;
pub mod tasks;

pub use achievements::{calculate_achievements, Achievement};
pub use aggregate::{BucketStats, Statistics, ValueStats, PROFIT_FACTOR_CAP};
pub use bests::{personal_bests, BestKind, PersonalBest};
pub use comparison::{period_comparisons, ComparisonPeriod, MetricComparison, Trend};
pub use projection::{project_growth, risk_of_ruin, GrowthProjection, WhatIfScenario};
pub use streaks::{calculate_streaks, Streak, StreakData};
pub use tasks::{detect_tasks, Task, TaskKind, TaskPriority};

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{DisplayMode, Trade};

/// Closed trades in chronological order. Sort is stable, so same-day trades
/// keep their input order.
pub(crate) fn closed_chronological(trades: &[Trade]) -> Vec<&Trade> {
    let mut closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    closed.sort_by_key(|t| t.date);
    closed
}

/// Per-day summed values under the display mode, date-ordered.
pub(crate) fn daily_values(trades: &[Trade], mode: DisplayMode) -> BTreeMap<NaiveDate, f64> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.is_closed()) {
        if let Some(value) = trade.value(mode) {
            *days.entry(trade.date).or_insert(0.0) += value;
        }
    }
    days
}

/// Whether `next` is the trading day after `prev`: adjacent calendar days,
/// or separated only by weekend days. Weekends are transparent for
/// trading-day adjacency; they never break a run, they just don't count.
pub(crate) fn is_adjacent_trading_day(prev: NaiveDate, next: NaiveDate) -> bool {
    if next <= prev {
        return false;
    }
    let mut day = prev.succ_opt();
    while let Some(d) = day {
        if d == next {
            return true;
        }
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        day = d.succ_opt();
    }
    false
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::{Direction, Trade, TradeStatus};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Closed trade with the given date and pnl; R defaults to pnl / 100.
    pub fn closed_trade(id: &str, date: NaiveDate, pnl: f64) -> Trade {
        Trade {
            id: id.to_string(),
            date,
            exit_date: Some(date),
            symbol: "BTC/USDT".to_string(),
            direction: Direction::Long,
            status: TradeStatus::Closed,
            entry_price: 100.0,
            exit_price: Some(100.0 + pnl),
            pnl: Some(pnl),
            r_multiple: Some(pnl / 100.0),
            commission: 0.0,
            setup: None,
            tags: Vec::new(),
            notes: String::new(),
            target: None,
            stop_loss: None,
            entry_time: None,
            exit_time: None,
            screenshots: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn open_trade(id: &str, date: NaiveDate) -> Trade {
        Trade {
            status: TradeStatus::Open,
            exit_date: None,
            exit_price: None,
            pnl: None,
            r_multiple: None,
            ..closed_trade(id, date, 0.0)
        }
    }
}
