//! Action-item detection: open trades needing exit data, incomplete trade
//! logs, missing journal entries, and journaling streaks at risk.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, JournalEntry, Trade, TradeStatus};

use super::{calculate_streaks, closed_chronological};

/// How many recently closed trades get the completeness checklist.
const RECENT_CLOSED_CHECKED: usize = 10;
/// How many prior days are scanned for missing journal entries.
const BACKFILL_DAYS: usize = 7;
/// Minimum journaling streak worth protecting.
const STREAK_AT_RISK_MIN: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    OpenTrade,
    IncompleteTrade,
    JournalToday,
    JournalBackfill,
    StreakAtRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub count: usize,
    pub date: Option<NaiveDate>,
}

/// Every checklist field a fully-logged closed trade carries.
fn is_fully_logged(trade: &Trade) -> bool {
    !trade.notes.trim().is_empty()
        && trade.setup.is_some()
        && !trade.tags.is_empty()
        && trade.target.is_some()
        && trade.stop_loss.is_some()
        && trade.entry_time.is_some()
        && trade.exit_time.is_some()
        && !trade.screenshots.is_empty()
}

pub fn detect_tasks(trades: &[Trade], entries: &[JournalEntry], today: NaiveDate) -> Vec<Task> {
    let mut tasks = Vec::new();

    // Open trades with no exit data yet.
    let open_missing_exit = trades
        .iter()
        .filter(|t| t.status == TradeStatus::Open && t.exit_price.is_none())
        .count();
    if open_missing_exit > 0 {
        tasks.push(Task {
            kind: TaskKind::OpenTrade,
            title: "Close out open trades".to_string(),
            description: format!(
                "{} open trade{} missing exit data",
                open_missing_exit,
                if open_missing_exit == 1 { "" } else { "s" }
            ),
            priority: TaskPriority::High,
            count: open_missing_exit,
            date: None,
        });
    }

    // Completeness checklist over the most recently closed trades.
    let closed = closed_chronological(trades);
    let incomplete_recent = closed
        .iter()
        .rev()
        .take(RECENT_CLOSED_CHECKED)
        .filter(|t| !is_fully_logged(t))
        .count();
    if incomplete_recent > 0 {
        tasks.push(Task {
            kind: TaskKind::IncompleteTrade,
            title: "Complete trade logs".to_string(),
            description: format!(
                "{} recent trade{} missing checklist fields",
                incomplete_recent,
                if incomplete_recent == 1 { "" } else { "s" }
            ),
            priority: TaskPriority::Medium,
            count: incomplete_recent,
            date: None,
        });
    }

    // Today's journal, when today saw trading.
    let traded_today = trades.iter().any(|t| t.date == today);
    let today_entry = entries.iter().find(|e| e.date == today);
    if traded_today && !today_entry.map(|e| e.is_complete()).unwrap_or(false) {
        tasks.push(Task {
            kind: TaskKind::JournalToday,
            title: "Journal today's session".to_string(),
            description: if today_entry.is_some() {
                "Today's journal entry is incomplete".to_string()
            } else {
                "No journal entry for today yet".to_string()
            },
            priority: TaskPriority::High,
            count: 1,
            date: Some(today),
        });
    }

    // Prior trading days with no complete journal entry, most recent first.
    let mut trading_dates: Vec<NaiveDate> = trades
        .iter()
        .map(|t| t.date)
        .filter(|d| *d < today)
        .collect();
    trading_dates.sort();
    trading_dates.dedup();
    let missing_days: Vec<NaiveDate> = trading_dates
        .iter()
        .rev()
        .filter(|d| {
            !entries
                .iter()
                .any(|e| e.date == **d && e.is_complete())
        })
        .take(BACKFILL_DAYS)
        .copied()
        .collect();
    if !missing_days.is_empty() {
        tasks.push(Task {
            kind: TaskKind::JournalBackfill,
            title: "Backfill journal entries".to_string(),
            description: format!(
                "{} trading day{} without a complete journal entry",
                missing_days.len(),
                if missing_days.len() == 1 { "" } else { "s" }
            ),
            priority: TaskPriority::Medium,
            count: missing_days.len(),
            date: missing_days.first().copied(),
        });
    }

    // Journaling streak at risk: exactly one day since the last entry and
    // nothing written today yet.
    let streaks = calculate_streaks(trades, entries, DisplayMode::Pnl);
    let last_entry_date = entries.iter().map(|e| e.date).max();
    let yesterday = today.checked_sub_days(Days::new(1));
    if streaks.journaling_days.current >= STREAK_AT_RISK_MIN
        && last_entry_date.is_some()
        && last_entry_date == yesterday
        && today_entry.is_none()
    {
        tasks.push(Task {
            kind: TaskKind::StreakAtRisk,
            title: "Keep your journaling streak".to_string(),
            description: format!(
                "{}-day journaling streak ends unless you write today",
                streaks.journaling_days.current
            ),
            priority: TaskPriority::Medium,
            count: 1,
            date: Some(today),
        });
    }

    // Stable by priority tier, preserving detection order within a tier.
    tasks.sort_by_key(|t| t.priority);
    tasks
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{closed_trade, date, open_trade};
    use super::*;
    use crate::models::Mood;

    fn entry(d: NaiveDate, notes: &str) -> JournalEntry {
        JournalEntry {
            id: format!("J-{d}"),
            date: d,
            mood: Mood::Good,
            notes: notes.to_string(),
            lessons: String::new(),
            market_conditions: String::new(),
            did_trade: true,
            followed_system: true,
            is_news_day: false,
            news_events: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// A closed trade with every checklist field filled in.
    fn logged_trade(id: &str, d: NaiveDate, pnl: f64) -> Trade {
        let mut trade = closed_trade(id, d, pnl);
        trade.notes = "clean entry on retest".to_string();
        trade.setup = Some("breakout".to_string());
        trade.tags = vec!["trend".to_string()];
        trade.target = Some(110.0);
        trade.stop_loss = Some(95.0);
        trade.entry_time = Some("09:31".to_string());
        trade.exit_time = Some("11:02".to_string());
        trade.screenshots = vec!["chart.png".to_string()];
        trade
    }

    #[test]
    fn single_open_trade_yields_one_high_priority_task() {
        let trades = vec![open_trade("a", date(2024, 3, 10))];
        let tasks = detect_tasks(&trades, &[], date(2024, 3, 15));
        let open: Vec<&Task> = tasks.iter().filter(|t| t.kind == TaskKind::OpenTrade).collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].count, 1);
        assert_eq!(open[0].priority, TaskPriority::High);
    }

    #[test]
    fn fully_logged_trades_raise_no_checklist_task() {
        let trades = vec![logged_trade("a", date(2024, 3, 10), 50.0)];
        let entries = vec![entry(date(2024, 3, 10), "good day")];
        let tasks = detect_tasks(&trades, &entries, date(2024, 3, 15));
        assert!(!tasks.iter().any(|t| t.kind == TaskKind::IncompleteTrade));
    }

    #[test]
    fn checklist_only_covers_recent_ten() {
        // 12 bare closed trades: only the latest 10 are checked.
        let trades: Vec<Trade> = (0..12)
            .map(|i| closed_trade(&format!("t{i}"), date(2024, 3, 1 + i), 10.0))
            .collect();
        let tasks = detect_tasks(&trades, &[], date(2024, 3, 20));
        let checklist = tasks
            .iter()
            .find(|t| t.kind == TaskKind::IncompleteTrade)
            .unwrap();
        assert_eq!(checklist.count, 10);
    }

    #[test]
    fn journal_task_when_today_has_trades_and_no_entry() {
        let trades = vec![closed_trade("a", date(2024, 3, 15), 50.0)];
        let tasks = detect_tasks(&trades, &[], date(2024, 3, 15));
        let journal = tasks.iter().find(|t| t.kind == TaskKind::JournalToday).unwrap();
        assert_eq!(journal.priority, TaskPriority::High);
        assert_eq!(journal.date, Some(date(2024, 3, 15)));
    }

    #[test]
    fn incomplete_entry_today_still_raises_task() {
        let trades = vec![closed_trade("a", date(2024, 3, 15), 50.0)];
        let entries = vec![entry(date(2024, 3, 15), "")];
        let tasks = detect_tasks(&trades, &entries, date(2024, 3, 15));
        assert!(tasks.iter().any(|t| t.kind == TaskKind::JournalToday));
    }

    #[test]
    fn backfill_caps_at_seven_days() {
        let trades: Vec<Trade> = (0..9)
            .map(|i| closed_trade(&format!("t{i}"), date(2024, 3, 1 + i), 10.0))
            .collect();
        let tasks = detect_tasks(&trades, &[], date(2024, 3, 20));
        let backfill = tasks
            .iter()
            .find(|t| t.kind == TaskKind::JournalBackfill)
            .unwrap();
        assert_eq!(backfill.count, 7);
        // Most recent missing day first.
        assert_eq!(backfill.date, Some(date(2024, 3, 9)));
    }

    #[test]
    fn streak_at_risk_after_exactly_one_quiet_day() {
        let entries = vec![
            entry(date(2024, 3, 12), "a"),
            entry(date(2024, 3, 13), "b"),
            entry(date(2024, 3, 14), "c"),
        ];
        let tasks = detect_tasks(&[], &entries, date(2024, 3, 15));
        assert!(tasks.iter().any(|t| t.kind == TaskKind::StreakAtRisk));

        // Two quiet days: streak already broken, no task.
        let tasks = detect_tasks(&[], &entries, date(2024, 3, 16));
        assert!(!tasks.iter().any(|t| t.kind == TaskKind::StreakAtRisk));
    }

    #[test]
    fn short_streaks_are_not_protected() {
        let entries = vec![entry(date(2024, 3, 13), "a"), entry(date(2024, 3, 14), "b")];
        let tasks = detect_tasks(&[], &entries, date(2024, 3, 15));
        assert!(!tasks.iter().any(|t| t.kind == TaskKind::StreakAtRisk));
    }

    #[test]
    fn high_priority_tasks_sort_first() {
        let mut trades = vec![closed_trade("a", date(2024, 3, 10), 10.0)];
        trades.push(open_trade("b", date(2024, 3, 14)));
        let tasks = detect_tasks(&trades, &[], date(2024, 3, 15));
        assert!(tasks.len() >= 2);
        for pair in tasks.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
        assert_eq!(tasks[0].priority, TaskPriority::High);
    }
}
