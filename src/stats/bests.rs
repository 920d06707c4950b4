//! Personal-best records: named superlatives over the trade history.
//! A record is only emitted when its qualifying event actually exists.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, Trade};

use super::closed_chronological;

/// A record is flagged recent when it happened within this many days of
/// evaluation time.
const RECENT_DAYS: i64 = 30;
/// Sliding window length for the best win-rate period.
const WIN_RATE_WINDOW: usize = 10;
/// Minimum run length for a winning streak to count as a record.
const MIN_STREAK: usize = 3;
/// Minimum trades on a day for the best average-per-trade record.
const MIN_TRADES_FOR_AVG_DAY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BestKind {
    BestTrade,
    BestDay,
    BestRiskReward,
    BestWinRatePeriod,
    LongestWinStreak,
    BestWeek,
    BestMonth,
    BestAverageDay,
    BestRecovery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub kind: BestKind,
    pub title: String,
    pub value: f64,
    pub date: NaiveDate,
    pub trade_ids: Vec<String>,
    pub is_recent: bool,
}

fn record(
    kind: BestKind,
    title: &str,
    value: f64,
    date: NaiveDate,
    trade_ids: Vec<String>,
    today: NaiveDate,
) -> PersonalBest {
    let days_ago = today.signed_duration_since(date).num_days();
    PersonalBest {
        kind,
        title: title.to_string(),
        value,
        date,
        trade_ids,
        is_recent: (0..=RECENT_DAYS).contains(&days_ago),
    }
}

/// Per-day value sums with the contributing trade ids, date-ordered.
fn daily_buckets(closed: &[&Trade], mode: DisplayMode) -> BTreeMap<NaiveDate, (f64, Vec<String>)> {
    let mut days: BTreeMap<NaiveDate, (f64, Vec<String>)> = BTreeMap::new();
    for trade in closed {
        if let Some(value) = trade.value(mode) {
            let entry = days.entry(trade.date).or_insert((0.0, Vec::new()));
            entry.0 += value;
            entry.1.push(trade.id.clone());
        }
    }
    days
}

pub fn personal_bests(trades: &[Trade], mode: DisplayMode, today: NaiveDate) -> Vec<PersonalBest> {
    let closed = closed_chronological(trades);
    if closed.is_empty() {
        return Vec::new();
    }

    let days = daily_buckets(&closed, mode);
    let mut bests = Vec::new();

    if let Some(best) = best_trade(&closed, mode, today) {
        bests.push(best);
    }
    if let Some(best) = best_day(&days, today) {
        bests.push(best);
    }
    if let Some(best) = best_risk_reward(&closed, today) {
        bests.push(best);
    }
    if let Some(best) = best_win_rate_period(&closed, today) {
        bests.push(best);
    }
    if let Some(best) = longest_win_streak(&closed, today) {
        bests.push(best);
    }
    if let Some(best) = best_week(&closed, mode, today) {
        bests.push(best);
    }
    if let Some(best) = best_month(&closed, mode, today) {
        bests.push(best);
    }
    if let Some(best) = best_average_day(&days, today) {
        bests.push(best);
    }
    if let Some(best) = best_recovery(&days, today) {
        bests.push(best);
    }

    bests
}

fn best_trade(closed: &[&Trade], mode: DisplayMode, today: NaiveDate) -> Option<PersonalBest> {
    // Strict > keeps the earliest qualifying trade on ties.
    let mut best: Option<&Trade> = None;
    for trade in closed {
        let Some(value) = trade.value(mode) else {
            continue;
        };
        match best {
            Some(b) if value <= b.value(mode).unwrap_or(0.0) => {}
            _ => best = Some(trade),
        }
    }
    let best = best?;
    Some(record(
        BestKind::BestTrade,
        "Best Trade",
        best.value(mode).unwrap_or(0.0),
        best.date,
        vec![best.id.clone()],
        today,
    ))
}

fn best_day(
    days: &BTreeMap<NaiveDate, (f64, Vec<String>)>,
    today: NaiveDate,
) -> Option<PersonalBest> {
    let mut best: Option<(NaiveDate, &(f64, Vec<String>))> = None;
    for (date, bucket) in days {
        match best {
            Some((_, b)) if bucket.0 <= b.0 => {}
            _ => best = Some((*date, bucket)),
        }
    }
    let (date, (value, ids)) = best?;
    Some(record(
        BestKind::BestDay,
        "Best Day",
        *value,
        date,
        ids.clone(),
        today,
    ))
}

fn best_risk_reward(closed: &[&Trade], today: NaiveDate) -> Option<PersonalBest> {
    // Always ranked by R multiple, whatever the display mode.
    let mut best: Option<(&Trade, f64)> = None;
    for trade in closed {
        if let Some(r) = trade.r_multiple {
            match best {
                Some((_, b)) if r <= b => {}
                _ => best = Some((trade, r)),
            }
        }
    }
    let (trade, r) = best?;
    Some(record(
        BestKind::BestRiskReward,
        "Best Risk:Reward",
        r,
        trade.date,
        vec![trade.id.clone()],
        today,
    ))
}

fn best_win_rate_period(closed: &[&Trade], today: NaiveDate) -> Option<PersonalBest> {
    if closed.len() < WIN_RATE_WINDOW {
        return None;
    }

    let mut best_rate = -1.0_f64;
    let mut best_window: Option<&[&Trade]> = None;
    for window in closed.windows(WIN_RATE_WINDOW) {
        let wins = window.iter().filter(|t| t.pnl.unwrap_or(0.0) > 0.0).count();
        let rate = wins as f64 / WIN_RATE_WINDOW as f64 * 100.0;
        if rate > best_rate {
            best_rate = rate;
            best_window = Some(window);
        }
    }

    let window = best_window?;
    let end = window.last()?;
    Some(record(
        BestKind::BestWinRatePeriod,
        "Best Win Rate (10 trades)",
        best_rate,
        end.date,
        window.iter().map(|t| t.id.clone()).collect(),
        today,
    ))
}

fn longest_win_streak(closed: &[&Trade], today: NaiveDate) -> Option<PersonalBest> {
    let mut best: Vec<&Trade> = Vec::new();
    let mut run: Vec<&Trade> = Vec::new();

    for trade in closed {
        if trade.pnl.unwrap_or(0.0) > 0.0 {
            run.push(trade);
            if run.len() > best.len() {
                best = run.clone();
            }
        } else {
            run.clear();
        }
    }

    if best.len() < MIN_STREAK {
        return None;
    }

    let end = best.last()?;
    Some(record(
        BestKind::LongestWinStreak,
        "Longest Win Streak",
        best.len() as f64,
        end.date,
        best.iter().map(|t| t.id.clone()).collect(),
        today,
    ))
}

/// Bucket key + representative date for week/month groupings.
fn period_best<K: Ord>(
    closed: &[&Trade],
    mode: DisplayMode,
    key: impl Fn(NaiveDate) -> K,
    anchor: impl Fn(NaiveDate) -> NaiveDate,
) -> Option<(NaiveDate, f64, Vec<String>)> {
    let mut buckets: BTreeMap<K, (NaiveDate, f64, Vec<String>)> = BTreeMap::new();
    for trade in closed {
        if let Some(value) = trade.value(mode) {
            let entry = buckets
                .entry(key(trade.date))
                .or_insert((anchor(trade.date), 0.0, Vec::new()));
            entry.1 += value;
            entry.2.push(trade.id.clone());
        }
    }

    let mut best: Option<(NaiveDate, f64, Vec<String>)> = None;
    for (_, (date, value, ids)) in buckets {
        match &best {
            Some((_, b, _)) if value <= *b => {}
            _ => best = Some((date, value, ids)),
        }
    }
    best
}

fn best_week(closed: &[&Trade], mode: DisplayMode, today: NaiveDate) -> Option<PersonalBest> {
    let (date, value, ids) = period_best(
        closed,
        mode,
        |d| {
            let week = d.iso_week();
            (week.year(), week.week())
        },
        |d| {
            let week = d.iso_week();
            NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon).unwrap_or(d)
        },
    )?;
    Some(record(BestKind::BestWeek, "Best Week", value, date, ids, today))
}

fn best_month(closed: &[&Trade], mode: DisplayMode, today: NaiveDate) -> Option<PersonalBest> {
    let (date, value, ids) = period_best(
        closed,
        mode,
        |d| (d.year(), d.month()),
        |d| NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d),
    )?;
    Some(record(BestKind::BestMonth, "Best Month", value, date, ids, today))
}

fn best_average_day(
    days: &BTreeMap<NaiveDate, (f64, Vec<String>)>,
    today: NaiveDate,
) -> Option<PersonalBest> {
    let mut best: Option<(NaiveDate, f64, &Vec<String>)> = None;
    for (date, (sum, ids)) in days {
        if ids.len() < MIN_TRADES_FOR_AVG_DAY {
            continue;
        }
        let avg = sum / ids.len() as f64;
        match best {
            Some((_, b, _)) if avg <= b => {}
            _ => best = Some((*date, avg, ids)),
        }
    }

    let (date, avg, ids) = best?;
    if avg <= 0.0 {
        return None;
    }
    Some(record(
        BestKind::BestAverageDay,
        "Best Average Day",
        avg,
        date,
        ids.clone(),
        today,
    ))
}

fn best_recovery(
    days: &BTreeMap<NaiveDate, (f64, Vec<String>)>,
    today: NaiveDate,
) -> Option<PersonalBest> {
    // A recovery is a positive day immediately after a negative day in the
    // trading-day sequence; no lookback beyond the adjacent pair.
    let entries: Vec<(&NaiveDate, &(f64, Vec<String>))> = days.iter().collect();
    let mut best: Option<(NaiveDate, f64, &Vec<String>)> = None;

    for pair in entries.windows(2) {
        let (_, (prev_value, _)) = pair[0];
        let (date, (value, ids)) = pair[1];
        if *prev_value < 0.0 && *value > 0.0 {
            match best {
                Some((_, b, _)) if *value <= b => {}
                _ => best = Some((*date, *value, ids)),
            }
        }
    }

    let (date, value, ids) = best?;
    Some(record(
        BestKind::BestRecovery,
        "Best Recovery",
        value,
        date,
        ids.clone(),
        today,
    ))
}
