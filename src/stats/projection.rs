//! Forward account-growth projection and a heuristic risk-of-ruin estimate.
//!
//! The projection compounds at a damped fraction of the observed average
//! daily return so a short hot streak doesn't extrapolate into fantasy.
//! Non-finite intermediate values are clamped back to the current balance.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::aggregate::Statistics;

/// Fraction of the observed daily return the projection trusts.
const DAMPING: f64 = 0.8;
/// Risk-of-ruin needs at least this many trades to say anything.
const MIN_TRADES_FOR_RUIN: usize = 10;
/// Drawdown tolerance, in risk units, behind the ruin formula exponent.
const RUIN_UNITS: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIfScenario {
    /// Target win rate in percent, e.g. 55.0.
    pub target_win_rate: Option<f64>,
    /// Target average risk:reward, e.g. 2.0.
    pub target_risk_reward: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub day: u32,
    pub date: NaiveDate,
    pub baseline: f64,
    pub what_if: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthProjection {
    pub points: Vec<ProjectionPoint>,
    pub daily_rate: f64,
    /// Baseline end value minus the starting balance.
    pub projected_gain: f64,
    pub what_if_gain: Option<f64>,
    /// What-if improvement over the baseline at the horizon, in percent.
    pub improvement_percent: Option<f64>,
}

/// Payoff ratio (average win over average loss magnitude) from the pnl
/// family; 1.0 when there is no loss history to measure against.
fn payoff_ratio(stats: &Statistics) -> f64 {
    let avg_loss = stats.pnl.avg_loss.abs();
    if avg_loss > 0.0 {
        stats.pnl.avg_win / avg_loss
    } else {
        1.0
    }
}

/// Expected value per trade in R units for a win rate (0..1) and payoff.
fn expectancy_r(win_rate: f64, payoff: f64) -> f64 {
    win_rate * payoff - (1.0 - win_rate)
}

fn compound(balance: f64, rate: f64, day: u32) -> f64 {
    let value = balance * (1.0 + rate).powi(day as i32);
    if value.is_finite() {
        value
    } else {
        balance
    }
}

pub fn project_growth(
    stats: &Statistics,
    starting_balance: f64,
    horizon_days: u32,
    what_if: Option<WhatIfScenario>,
    today: NaiveDate,
) -> GrowthProjection {
    let daily_rate = if starting_balance > 0.0 {
        stats.pnl.avg_daily / starting_balance * DAMPING
    } else {
        0.0
    };

    // What-if rescales the damped rate by the ratio of adjusted to
    // observed expectancy per trade, both in R units.
    let what_if_rate = what_if.map(|scenario| {
        let win_rate = stats.win_rate / 100.0;
        let payoff = payoff_ratio(stats);
        let baseline_ev = expectancy_r(win_rate, payoff);
        let adjusted_ev = expectancy_r(
            scenario
                .target_win_rate
                .map(|wr| wr / 100.0)
                .unwrap_or(win_rate),
            scenario.target_risk_reward.unwrap_or(payoff),
        );

        let factor = if baseline_ev > 0.0 {
            adjusted_ev / baseline_ev
        } else {
            adjusted_ev
        };
        let rate = daily_rate * factor;
        if rate.is_finite() {
            rate
        } else {
            daily_rate
        }
    });

    let mut points = Vec::with_capacity(horizon_days as usize + 1);
    for day in 0..=horizon_days {
        let date = today
            .checked_add_days(Days::new(day as u64))
            .unwrap_or(today);
        points.push(ProjectionPoint {
            day,
            date,
            baseline: compound(starting_balance, daily_rate, day),
            what_if: what_if_rate.map(|rate| compound(starting_balance, rate, day)),
        });
    }

    let baseline_end = points
        .last()
        .map(|p| p.baseline)
        .unwrap_or(starting_balance);
    let what_if_end = points.last().and_then(|p| p.what_if);

    let projected_gain = baseline_end - starting_balance;
    let what_if_gain = what_if_end.map(|end| end - starting_balance);
    let improvement_percent = what_if_end.and_then(|end| {
        if baseline_end > 0.0 {
            Some((end - baseline_end) / baseline_end * 100.0)
        } else {
            None
        }
    });

    GrowthProjection {
        points,
        daily_rate,
        projected_gain,
        what_if_gain,
        improvement_percent,
    }
}

/// Heuristic ruin probability from the Kelly edge. Reported as 0 below the
/// sample floor or at a 0% win rate (no confidence either way), and pinned
/// near-certain when the edge is non-positive.
pub fn risk_of_ruin(stats: &Statistics) -> f64 {
    if stats.total_trades < MIN_TRADES_FOR_RUIN || stats.win_rate == 0.0 {
        return 0.0;
    }

    let win_rate = stats.win_rate / 100.0;
    let payoff = payoff_ratio(stats);
    if payoff <= 0.0 {
        return 99.9;
    }

    let edge = win_rate - (1.0 - win_rate) / payoff;
    if edge <= 0.0 {
        return 99.9;
    }

    (((1.0 - edge) / (1.0 + edge)).powi(RUIN_UNITS) * 100.0).clamp(0.0, 100.0)
}
