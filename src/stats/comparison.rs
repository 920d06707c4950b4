//! Period-over-period metric deltas: this month vs last month, the rolling
//! quarter vs the one before, and the last 30 days vs all prior history.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonPeriod {
    MonthOverMonth,
    QuarterOverQuarter,
    RecentVsHistorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub period: ComparisonPeriod,
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
    /// Whether the observed direction is an improvement. All four metrics
    /// here are higher-is-better.
    pub is_positive: bool,
}

struct WindowMetrics {
    win_rate: f64,
    total: f64,
    avg_value: f64,
    trade_count: f64,
}

fn window_metrics<'a>(trades: impl Iterator<Item = &'a Trade>, mode: DisplayMode) -> WindowMetrics {
    let mut count = 0_usize;
    let mut wins = 0_usize;
    let mut total = 0.0_f64;
    for trade in trades.filter(|t| t.is_closed()) {
        count += 1;
        if trade.pnl.unwrap_or(0.0) > 0.0 {
            wins += 1;
        }
        total += trade.value(mode).unwrap_or(0.0);
    }

    WindowMetrics {
        win_rate: if count > 0 {
            wins as f64 / count as f64 * 100.0
        } else {
            0.0
        },
        total,
        avg_value: if count > 0 { total / count as f64 } else { 0.0 },
        trade_count: count as f64,
    }
}

fn compare(
    period: ComparisonPeriod,
    metric: &str,
    current: f64,
    previous: f64,
) -> Option<MetricComparison> {
    // A comparison where nothing happened in either period is noise.
    if current == 0.0 && previous == 0.0 {
        return None;
    }

    let change = current - previous;
    let change_percent = if previous != 0.0 {
        change / previous.abs() * 100.0
    } else {
        100.0 * change.signum()
    };
    let trend = if change > 0.0 {
        Trend::Up
    } else if change < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    };

    Some(MetricComparison {
        period,
        metric: metric.to_string(),
        current,
        previous,
        change,
        change_percent,
        trend,
        is_positive: change >= 0.0,
    })
}

fn push_family(
    out: &mut Vec<MetricComparison>,
    period: ComparisonPeriod,
    current: WindowMetrics,
    previous: WindowMetrics,
) {
    let pairs = [
        ("win_rate", current.win_rate, previous.win_rate),
        ("total", current.total, previous.total),
        ("avg_trade", current.avg_value, previous.avg_value),
        ("trade_count", current.trade_count, previous.trade_count),
    ];
    for (metric, cur, prev) in pairs {
        if let Some(comparison) = compare(period, metric, cur, prev) {
            out.push(comparison);
        }
    }
}

pub fn period_comparisons(
    trades: &[Trade],
    mode: DisplayMode,
    today: NaiveDate,
) -> Vec<MetricComparison> {
    let mut out = Vec::new();

    // Calendar months containing / preceding today.
    let this_month = (today.year(), today.month());
    let prev_month = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    push_family(
        &mut out,
        ComparisonPeriod::MonthOverMonth,
        window_metrics(
            trades
                .iter()
                .filter(|t| (t.date.year(), t.date.month()) == this_month),
            mode,
        ),
        window_metrics(
            trades
                .iter()
                .filter(|t| (t.date.year(), t.date.month()) == prev_month),
            mode,
        ),
    );

    // Rolling quarters anchored on today, not calendar-quarter boundaries.
    let quarter_start = today.checked_sub_days(Days::new(90)).unwrap_or(today);
    let prev_quarter_start = today.checked_sub_days(Days::new(180)).unwrap_or(today);
    push_family(
        &mut out,
        ComparisonPeriod::QuarterOverQuarter,
        window_metrics(
            trades
                .iter()
                .filter(|t| t.date > quarter_start && t.date <= today),
            mode,
        ),
        window_metrics(
            trades
                .iter()
                .filter(|t| t.date > prev_quarter_start && t.date <= quarter_start),
            mode,
        ),
    );

    // Last 30 days vs everything older.
    let recent_start = today.checked_sub_days(Days::new(30)).unwrap_or(today);
    push_family(
        &mut out,
        ComparisonPeriod::RecentVsHistorical,
        window_metrics(
            trades
                .iter()
                .filter(|t| t.date > recent_start && t.date <= today),
            mode,
        ),
        window_metrics(trades.iter().filter(|t| t.date <= recent_start), mode),
    );

    out
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{closed_trade, date};
    use super::*;

    #[test]
    fn empty_trades_produce_no_comparisons() {
        assert!(period_comparisons(&[], DisplayMode::Pnl, date(2024, 3, 15)).is_empty());
    }

    #[test]
    fn month_over_month_uses_calendar_months() {
        let trades = vec![
            closed_trade("a", date(2024, 2, 10), 50.0),
            closed_trade("b", date(2024, 2, 20), -25.0),
            closed_trade("c", date(2024, 3, 5), 100.0),
        ];
        let comparisons = period_comparisons(&trades, DisplayMode::Pnl, date(2024, 3, 15));
        let total = comparisons
            .iter()
            .find(|c| c.period == ComparisonPeriod::MonthOverMonth && c.metric == "total")
            .unwrap();
        assert_eq!(total.current, 100.0);
        assert_eq!(total.previous, 25.0);
        assert_eq!(total.change, 75.0);
        assert_eq!(total.trend, Trend::Up);
        assert!(total.is_positive);
        assert!((total.change_percent - 300.0).abs() < 1e-9);
    }

    #[test]
    fn zero_both_sides_is_dropped() {
        // One open-month trade only: the previous-month window is empty, so
        // win_rate at 0 vs 0 for a losing current month must still appear,
        // while untouched families yield nothing.
        let trades = vec![closed_trade("a", date(2024, 3, 5), -10.0)];
        let comparisons = period_comparisons(&trades, DisplayMode::Pnl, date(2024, 3, 15));
        // Current-month win rate is 0 and previous is 0: dropped.
        assert!(!comparisons
            .iter()
            .any(|c| c.period == ComparisonPeriod::MonthOverMonth && c.metric == "win_rate"));
        // Trade count 1 vs 0 survives.
        assert!(comparisons
            .iter()
            .any(|c| c.period == ComparisonPeriod::MonthOverMonth && c.metric == "trade_count"));
    }

    #[test]
    fn previous_zero_reports_full_swing() {
        let trades = vec![closed_trade("a", date(2024, 3, 5), 100.0)];
        let comparisons = period_comparisons(&trades, DisplayMode::Pnl, date(2024, 3, 15));
        let total = comparisons
            .iter()
            .find(|c| c.period == ComparisonPeriod::MonthOverMonth && c.metric == "total")
            .unwrap();
        assert_eq!(total.previous, 0.0);
        assert_eq!(total.change_percent, 100.0);
    }

    #[test]
    fn recent_window_splits_at_thirty_days() {
        let trades = vec![
            closed_trade("old", date(2024, 1, 1), 40.0),
            closed_trade("new", date(2024, 3, 10), 90.0),
        ];
        let comparisons = period_comparisons(&trades, DisplayMode::Pnl, date(2024, 3, 15));
        let total = comparisons
            .iter()
            .find(|c| c.period == ComparisonPeriod::RecentVsHistorical && c.metric == "total")
            .unwrap();
        assert_eq!(total.current, 90.0);
        assert_eq!(total.previous, 40.0);
    }

    #[test]
    fn downtrend_is_not_positive() {
        let trades = vec![
            closed_trade("a", date(2024, 2, 10), 100.0),
            closed_trade("b", date(2024, 3, 5), 20.0),
        ];
        let comparisons = period_comparisons(&trades, DisplayMode::Pnl, date(2024, 3, 15));
        let total = comparisons
            .iter()
            .find(|c| c.period == ComparisonPeriod::MonthOverMonth && c.metric == "total")
            .unwrap();
        assert_eq!(total.trend, Trend::Down);
        assert!(!total.is_positive);
    }
}
