//! Streak tracking across trading, journaling, and discipline dimensions.
//!
//! Adjacency rules differ by family: trading-day streaks treat weekends as
//! transparent (a Friday-to-Monday gap does not break the run), while
//! journaling and system-adherence streaks require literal calendar-day
//! adjacency. Both behaviors match the product's historical semantics and
//! are deliberately kept distinct.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, JournalEntry, Trade};

use super::{daily_values, is_adjacent_trading_day};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Run ending at the most recent date with data.
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakData {
    pub winning_days: Streak,
    pub losing_days: Streak,
    pub trading_days: Streak,
    pub journaling_days: Streak,
    pub system_adherence_days: Streak,
}

pub fn calculate_streaks(
    trades: &[Trade],
    entries: &[JournalEntry],
    mode: DisplayMode,
) -> StreakData {
    let days = daily_values(trades, mode);
    let day_signs: Vec<f64> = days.values().copied().collect();

    let mut trading_dates: Vec<NaiveDate> = trades.iter().map(|t| t.date).collect();
    trading_dates.sort();
    trading_dates.dedup();

    let mut entry_dates: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
    entry_dates.sort();
    entry_dates.dedup();

    let mut adherence_dates: Vec<NaiveDate> = entries
        .iter()
        .filter(|e| e.followed_system)
        .map(|e| e.date)
        .collect();
    adherence_dates.sort();
    adherence_dates.dedup();

    StreakData {
        winning_days: sign_streak(&day_signs, |v| v > 0.0),
        losing_days: sign_streak(&day_signs, |v| v < 0.0),
        trading_days: date_streak(&trading_dates, is_adjacent_trading_day),
        journaling_days: date_streak(&entry_dates, is_next_calendar_day),
        // Current adherence is measured against the latest journal entry:
        // a most-recent entry that broke the system resets it to 0.
        system_adherence_days: adherence_streak(&adherence_dates, entry_dates.last().copied()),
    }
}

fn is_next_calendar_day(prev: NaiveDate, next: NaiveDate) -> bool {
    prev.succ_opt() == Some(next)
}

/// Runs of matching daily signs over the sequence of trading days. Days are
/// consecutive by position in the sequence, not by calendar distance.
fn sign_streak(day_values: &[f64], matches: impl Fn(f64) -> bool) -> Streak {
    let mut longest = 0_u32;
    let mut run = 0_u32;
    for value in day_values {
        if matches(*value) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    // `run` still holds the trailing run, which is the current streak.
    Streak {
        current: run,
        longest,
    }
}

/// Runs over sorted, deduplicated dates under the given adjacency rule.
/// Current is the run ending at the last date.
fn date_streak(dates: &[NaiveDate], adjacent: impl Fn(NaiveDate, NaiveDate) -> bool) -> Streak {
    if dates.is_empty() {
        return Streak::default();
    }

    let mut longest = 1_u32;
    let mut run = 1_u32;
    for pair in dates.windows(2) {
        if adjacent(pair[0], pair[1]) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    Streak {
        current: run,
        longest,
    }
}

fn adherence_streak(adherence_dates: &[NaiveDate], latest_entry: Option<NaiveDate>) -> Streak {
    let base = date_streak(adherence_dates, is_next_calendar_day);
    let current = match (adherence_dates.last(), latest_entry) {
        (Some(last_adherent), Some(latest)) if *last_adherent == latest => base.current,
        _ => 0,
    };
    Streak {
        current,
        longest: base.longest,
    }
}
