//! Milestone achievements evaluated against current data. The catalog is
//! fixed; every evaluation returns the full list with unlocked state and a
//! capped 0-100 progress value.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, JournalEntry, Trade};

use super::aggregate::Statistics;
use super::calculate_streaks;

/// Sample-size gates for the ratio achievements. Below the gate, progress
/// tracks trades collected; at or past it, progress tracks the metric.
const WIN_RATE_SAMPLE: usize = 20;
const PROFIT_FACTOR_SAMPLE: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
    /// 0-100, capped. Locked achievements can sit at 100 only when the
    /// underlying value equals the target but a gate is still unmet.
    pub progress: f64,
    pub current: f64,
    pub target: f64,
}

fn achievement(
    id: &str,
    title: &str,
    description: &str,
    unlocked: bool,
    progress: f64,
    current: f64,
    target: f64,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        unlocked,
        progress: progress.clamp(0.0, 100.0),
        current,
        target,
    }
}

fn count_milestone(id: &str, title: &str, description: &str, count: usize, target: usize) -> Achievement {
    achievement(
        id,
        title,
        description,
        count >= target,
        count as f64 / target as f64 * 100.0,
        count as f64,
        target as f64,
    )
}

/// Progress toward a ratio achievement behind a sample-size gate: first the
/// gate, then the metric. Never a blended percentage.
fn gated_progress(sample: usize, gate: usize, value: f64, target: f64) -> f64 {
    if sample < gate {
        sample as f64 / gate as f64 * 100.0
    } else if target > 0.0 {
        value / target * 100.0
    } else {
        0.0
    }
}

pub fn calculate_achievements(trades: &[Trade], entries: &[JournalEntry]) -> Vec<Achievement> {
    let stats = Statistics::calculate(trades);
    let streaks = calculate_streaks(trades, entries, DisplayMode::Pnl);
    let total = stats.total_trades;

    // Calendar-month pnl sums for the profitable-month milestone.
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.is_closed()) {
        if let Some(pnl) = trade.pnl {
            *months.entry((trade.date.year(), trade.date.month())).or_insert(0.0) += pnl;
        }
    }
    let best_month = months.values().copied().fold(0.0_f64, f64::max);
    let has_profitable_month = months.values().any(|pnl| *pnl > 0.0);

    let adherence_longest = streaks.system_adherence_days.longest as usize;
    let journal_count = entries.len();

    vec![
        count_milestone(
            "trades-10",
            "Getting Started",
            "Log 10 trades",
            total,
            10,
        ),
        count_milestone(
            "trades-50",
            "Committed",
            "Log 50 trades",
            total,
            50,
        ),
        count_milestone(
            "trades-100",
            "Century Club",
            "Log 100 trades",
            total,
            100,
        ),
        achievement(
            "profitable-month",
            "In the Green",
            "Finish a calendar month with positive P&L",
            has_profitable_month,
            if has_profitable_month { 100.0 } else { 0.0 },
            best_month,
            0.0,
        ),
        count_milestone(
            "journal-30",
            "Dear Diary",
            "Write 30 journal entries",
            journal_count,
            30,
        ),
        count_milestone(
            "adherence-10",
            "Iron Discipline",
            "Follow your system 10 days in a row",
            adherence_longest,
            10,
        ),
        achievement(
            "win-rate-60",
            "Sharpshooter",
            "Reach a 60% win rate over at least 20 trades",
            total >= WIN_RATE_SAMPLE && stats.win_rate >= 60.0,
            gated_progress(total, WIN_RATE_SAMPLE, stats.win_rate, 60.0),
            stats.win_rate,
            60.0,
        ),
        achievement(
            "profit-factor-2",
            "Well Oiled",
            "Reach a 2.0 profit factor over at least 30 trades",
            total >= PROFIT_FACTOR_SAMPLE && stats.pnl.profit_factor >= 2.0,
            gated_progress(total, PROFIT_FACTOR_SAMPLE, stats.pnl.profit_factor, 2.0),
            stats.pnl.profit_factor,
            2.0,
        ),
    ]
}
