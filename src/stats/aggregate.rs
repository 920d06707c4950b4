//! Aggregate statistics over a trade set.
//!
//! Both value families (account-currency pnl and R multiples) are always
//! computed; the caller picks which one to render. Every ratio degrades to
//! 0 on empty input instead of propagating NaN or infinity.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, Trade};

use super::{closed_chronological, daily_values};

/// Finite stand-in for an undefined profit factor (wins but no losses).
/// The ratio is reported as this cap instead of infinity.
pub const PROFIT_FACTOR_CAP: f64 = 999.0;

/// Per-family metrics. `Statistics` carries one of these for pnl and one
/// for R multiples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueStats {
    pub total: f64,
    pub avg_win: f64,
    /// Mean losing value, kept at its natural sign (negative or zero).
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub best_day: f64,
    pub worst_day: f64,
    pub avg_daily: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration_days: i64,
    pub avg_recovery_days: f64,
}

/// One grouping bucket (weekday or setup label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub label: String,
    pub trades: usize,
    pub total_pnl: f64,
    pub total_rr: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub open_trades: usize,
    pub win_rate: f64,
    /// Positive: active run of winning trades. Negative: active losing run.
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
    pub pnl: ValueStats,
    pub rr: ValueStats,
    pub performance_by_weekday: Vec<BucketStats>,
    pub performance_by_setup: Vec<BucketStats>,
}

impl Statistics {
    pub fn calculate(trades: &[Trade]) -> Self {
        let closed = closed_chronological(trades);
        let total_trades = trades.len();
        let open_trades = total_trades - closed.len();

        let winning_trades = closed
            .iter()
            .filter(|t| t.pnl.unwrap_or(0.0) > 0.0)
            .count();
        let losing_trades = closed.len() - winning_trades;

        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let (current_streak, longest_win_streak, longest_lose_streak) = trade_streaks(&closed);

        Statistics {
            total_trades,
            winning_trades,
            losing_trades,
            open_trades,
            win_rate,
            current_streak,
            longest_win_streak,
            longest_lose_streak,
            pnl: value_stats(trades, DisplayMode::Pnl, total_trades),
            rr: value_stats(trades, DisplayMode::RMultiple, total_trades),
            performance_by_weekday: performance_by_weekday(&closed),
            performance_by_setup: performance_by_setup(&closed),
        }
    }
}

fn value_stats(trades: &[Trade], mode: DisplayMode, total_trades: usize) -> ValueStats {
    let closed = closed_chronological(trades);

    // For averaging, only trades that actually carry the field count;
    // missing R multiples still sum as 0 but don't dilute the means.
    let present: Vec<f64> = closed
        .iter()
        .filter_map(|t| match mode {
            DisplayMode::Pnl => t.pnl,
            DisplayMode::RMultiple => t.r_multiple,
        })
        .collect();

    let total: f64 = closed.iter().filter_map(|t| t.value(mode)).sum();

    let wins: Vec<f64> = present.iter().copied().filter(|v| *v > 0.0).collect();
    let losses: Vec<f64> = present.iter().copied().filter(|v| *v <= 0.0).collect();

    let avg_win = mean(&wins);
    let avg_loss = mean(&losses);

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().sum::<f64>().abs();
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    };

    let largest_win = wins.iter().copied().fold(0.0_f64, f64::max);
    let largest_loss = losses.iter().copied().fold(0.0_f64, f64::min);

    let days = daily_values(trades, mode);
    // Strict comparisons: the earliest day wins ties.
    let mut best_day = 0.0;
    let mut worst_day = 0.0;
    for value in days.values() {
        if *value > best_day {
            best_day = *value;
        }
        if *value < worst_day {
            worst_day = *value;
        }
    }
    let avg_daily = if days.is_empty() {
        0.0
    } else {
        days.values().sum::<f64>() / days.len() as f64
    };

    let expectancy = if total_trades > 0 {
        total / total_trades as f64
    } else {
        0.0
    };

    let dd = drawdown(&days);

    ValueStats {
        total,
        avg_win,
        avg_loss,
        profit_factor,
        largest_win,
        largest_loss,
        best_day,
        worst_day,
        avg_daily,
        expectancy,
        max_drawdown: dd.max_drawdown,
        max_drawdown_duration_days: dd.max_duration_days,
        avg_recovery_days: dd.avg_recovery_days,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

struct Drawdown {
    max_drawdown: f64,
    max_duration_days: i64,
    avg_recovery_days: f64,
}

/// Walk the cumulative daily curve tracking the running peak. Drawdown is
/// the deepest peak-to-trough decline; duration is the longest span the
/// curve stays below a prior peak; recovery is the mean trough-to-new-peak
/// gap over completed drawdowns.
fn drawdown(days: &BTreeMap<NaiveDate, f64>) -> Drawdown {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut peak_date: Option<NaiveDate> = None;
    let mut trough = 0.0_f64;
    let mut trough_date: Option<NaiveDate> = None;
    let mut in_drawdown = false;

    let mut max_drawdown = 0.0_f64;
    let mut max_duration_days = 0_i64;
    let mut recoveries: Vec<i64> = Vec::new();

    for (date, value) in days {
        cumulative += value;

        if cumulative >= peak {
            if in_drawdown {
                if let Some(t) = trough_date {
                    recoveries.push((*date - t).num_days());
                }
                in_drawdown = false;
            }
            peak = cumulative;
            peak_date = Some(*date);
        } else {
            if !in_drawdown {
                in_drawdown = true;
                trough = cumulative;
                trough_date = Some(*date);
            } else if cumulative < trough {
                trough = cumulative;
                trough_date = Some(*date);
            }

            let decline = peak - cumulative;
            if decline > max_drawdown {
                max_drawdown = decline;
            }
            if let Some(p) = peak_date {
                let span = (*date - p).num_days();
                if span > max_duration_days {
                    max_duration_days = span;
                }
            }
        }
    }

    let avg_recovery_days = if recoveries.is_empty() {
        0.0
    } else {
        recoveries.iter().sum::<i64>() as f64 / recoveries.len() as f64
    };

    Drawdown {
        max_drawdown,
        max_duration_days,
        avg_recovery_days,
    }
}

/// Consecutive win/loss runs over closed trades in chronological order.
/// Returns (current signed streak, longest win run, longest lose run).
fn trade_streaks(closed: &[&Trade]) -> (i32, u32, u32) {
    let mut longest_win = 0_u32;
    let mut longest_lose = 0_u32;
    let mut run_win = 0_u32;
    let mut run_lose = 0_u32;

    for trade in closed {
        if trade.pnl.unwrap_or(0.0) > 0.0 {
            run_win += 1;
            run_lose = 0;
            longest_win = longest_win.max(run_win);
        } else {
            run_lose += 1;
            run_win = 0;
            longest_lose = longest_lose.max(run_lose);
        }
    }

    let current = if run_win > 0 {
        run_win as i32
    } else {
        -(run_lose as i32)
    };

    (current, longest_win, longest_lose)
}

fn bucket(label: String, trades: &[&Trade]) -> BucketStats {
    let wins = trades.iter().filter(|t| t.pnl.unwrap_or(0.0) > 0.0).count();
    BucketStats {
        label,
        trades: trades.len(),
        total_pnl: trades.iter().map(|t| t.pnl.unwrap_or(0.0)).sum(),
        total_rr: trades.iter().map(|t| t.r_multiple.unwrap_or(0.0)).sum(),
        win_rate: if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64 * 100.0
        },
    }
}

fn performance_by_weekday(closed: &[&Trade]) -> Vec<BucketStats> {
    const ORDER: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    ORDER
        .iter()
        .filter_map(|weekday| {
            let day_trades: Vec<&Trade> = closed
                .iter()
                .copied()
                .filter(|t| t.date.weekday() == *weekday)
                .collect();
            if day_trades.is_empty() {
                None
            } else {
                Some(bucket(weekday.to_string(), &day_trades))
            }
        })
        .collect()
}

fn performance_by_setup(closed: &[&Trade]) -> Vec<BucketStats> {
    // First-appearance order in the chronological walk.
    let mut labels: Vec<String> = Vec::new();
    for trade in closed {
        if let Some(setup) = &trade.setup {
            if !labels.iter().any(|l| l == setup) {
                labels.push(setup.clone());
            }
        }
    }

    labels
        .into_iter()
        .map(|label| {
            let setup_trades: Vec<&Trade> = closed
                .iter()
                .copied()
                .filter(|t| t.setup.as_deref() == Some(label.as_str()))
                .collect();
            bucket(label, &setup_trades)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{closed_trade, date, open_trade};
    use super::*;

    #[test]
    fn empty_input_is_all_zero() {
        let stats = Statistics::calculate(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.pnl.profit_factor, 0.0);
        assert_eq!(stats.pnl.expectancy, 0.0);
        assert_eq!(stats.pnl.max_drawdown, 0.0);
        assert!(stats.performance_by_weekday.is_empty());
    }

    #[test]
    fn win_loss_counts_exclude_open_trades() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 100.0),
            closed_trade("b", date(2024, 3, 2), -50.0),
            open_trade("c", date(2024, 3, 3)),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.open_trades, 1);
        assert!(stats.winning_trades + stats.losing_trades <= stats.total_trades);
    }

    #[test]
    fn profit_factor_capped_when_no_losses() {
        // Zero-loss convention: capped finite sentinel, never infinity.
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 10.0),
            closed_trade("b", date(2024, 3, 2), 20.0),
            closed_trade("c", date(2024, 3, 3), 30.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.pnl.profit_factor, PROFIT_FACTOR_CAP);
        assert!(stats.pnl.profit_factor.is_finite());
        assert!(!stats.rr.profit_factor.is_nan());
    }

    #[test]
    fn profit_factor_zero_when_all_losing() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), -10.0),
            closed_trade("b", date(2024, 3, 2), -20.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.pnl.profit_factor, 0.0);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.pnl.avg_loss, -15.0);
    }

    #[test]
    fn profit_factor_ratio_with_mixed_trades() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 300.0),
            closed_trade("b", date(2024, 3, 2), -100.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert!((stats.pnl.profit_factor - 3.0).abs() < 1e-9);
    }

    #[test]
    fn daily_aggregation_uses_distinct_days() {
        // Two trades on one day, one on the next: avg daily divides by 2.
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 60.0),
            closed_trade("b", date(2024, 3, 1), 40.0),
            closed_trade("c", date(2024, 3, 2), -50.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.pnl.best_day, 100.0);
        assert_eq!(stats.pnl.worst_day, -50.0);
        assert!((stats.pnl.avg_daily - 25.0).abs() < 1e-9);
    }

    #[test]
    fn streaks_follow_chronological_order() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 10.0),
            closed_trade("b", date(2024, 3, 2), 10.0),
            closed_trade("c", date(2024, 3, 3), -5.0),
            closed_trade("d", date(2024, 3, 4), 10.0),
            closed_trade("e", date(2024, 3, 5), 10.0),
            closed_trade("f", date(2024, 3, 6), 10.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.longest_win_streak, 3);
        assert_eq!(stats.longest_lose_streak, 1);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn current_streak_negative_after_losses() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 10.0),
            closed_trade("b", date(2024, 3, 2), -5.0),
            closed_trade("c", date(2024, 3, 3), -5.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.current_streak, -2);
    }

    #[test]
    fn drawdown_on_cumulative_daily_curve() {
        // Curve: 100, 50, 130 -> deepest decline 50, recovered on day 3.
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 100.0),
            closed_trade("b", date(2024, 3, 2), -50.0),
            closed_trade("c", date(2024, 3, 3), 80.0),
        ];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.pnl.max_drawdown, 50.0);
        assert_eq!(stats.pnl.max_drawdown_duration_days, 1);
        assert_eq!(stats.pnl.avg_recovery_days, 1.0);
    }

    #[test]
    fn missing_r_values_sum_as_zero_but_do_not_dilute_averages() {
        let mut a = closed_trade("a", date(2024, 3, 1), 100.0);
        a.r_multiple = Some(2.0);
        let mut b = closed_trade("b", date(2024, 3, 2), 50.0);
        b.r_multiple = None;
        let stats = Statistics::calculate(&[a, b]);
        assert_eq!(stats.rr.total, 2.0);
        // Only the trade with an R value enters the winning mean.
        assert_eq!(stats.rr.avg_win, 2.0);
    }

    #[test]
    fn expectancy_divides_by_all_trades() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 90.0),
            open_trade("b", date(2024, 3, 2)),
        ];
        let stats = Statistics::calculate(&trades);
        assert!((stats.pnl.expectancy - 45.0).abs() < 1e-9);
    }

    #[test]
    fn setup_buckets_keep_first_seen_order() {
        let mut a = closed_trade("a", date(2024, 3, 1), 10.0);
        a.setup = Some("breakout".to_string());
        let mut b = closed_trade("b", date(2024, 3, 2), -5.0);
        b.setup = Some("pullback".to_string());
        let mut c = closed_trade("c", date(2024, 3, 3), 20.0);
        c.setup = Some("breakout".to_string());
        let stats = Statistics::calculate(&[a, b, c]);
        assert_eq!(stats.performance_by_setup.len(), 2);
        assert_eq!(stats.performance_by_setup[0].label, "breakout");
        assert_eq!(stats.performance_by_setup[0].trades, 2);
        assert_eq!(stats.performance_by_setup[0].total_pnl, 30.0);
        assert_eq!(stats.performance_by_setup[0].win_rate, 100.0);
    }

    #[test]
    fn idempotent_on_same_input() {
        let trades = vec![
            closed_trade("a", date(2024, 3, 1), 100.0),
            closed_trade("b", date(2024, 3, 2), -50.0),
        ];
        assert_eq!(Statistics::calculate(&trades), Statistics::calculate(&trades));
    }

    #[test]
    fn single_trade() {
        let trades = vec![closed_trade("a", date(2024, 3, 1), 42.0)];
        let stats = Statistics::calculate(&trades);
        assert_eq!(stats.win_rate, 100.0);
        assert_eq!(stats.pnl.largest_win, 42.0);
        assert_eq!(stats.pnl.largest_loss, 0.0);
        assert_eq!(stats.pnl.best_day, 42.0);
    }
}
