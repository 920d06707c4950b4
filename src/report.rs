//! One-call dashboard report: composes the statistics engine into a single
//! serializable value for a rendering layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DisplayMode, JournalEntry, Trade};
use crate::stats::{
    calculate_achievements, calculate_streaks, detect_tasks, period_comparisons, personal_bests,
    project_growth, risk_of_ruin, Achievement, GrowthProjection, MetricComparison, PersonalBest,
    Statistics, StreakData, Task, WhatIfScenario,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: NaiveDate,
    pub daily_value: f64,
    pub cumulative_value: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_on: NaiveDate,
    pub display_mode: DisplayMode,
    pub statistics: Statistics,
    pub equity_curve: Vec<EquityCurvePoint>,
    pub personal_bests: Vec<PersonalBest>,
    pub achievements: Vec<Achievement>,
    pub streaks: StreakData,
    pub comparisons: Vec<MetricComparison>,
    pub tasks: Vec<Task>,
    pub projection: GrowthProjection,
    pub risk_of_ruin: f64,
}

impl DashboardReport {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        trades: &[Trade],
        entries: &[JournalEntry],
        mode: DisplayMode,
        starting_balance: f64,
        horizon_days: u32,
        what_if: Option<WhatIfScenario>,
        today: NaiveDate,
    ) -> Self {
        let statistics = Statistics::calculate(trades);
        let projection = project_growth(&statistics, starting_balance, horizon_days, what_if, today);
        let ruin = risk_of_ruin(&statistics);

        DashboardReport {
            generated_on: today,
            display_mode: mode,
            equity_curve: equity_curve(trades, mode),
            personal_bests: personal_bests(trades, mode, today),
            achievements: calculate_achievements(trades, entries),
            streaks: calculate_streaks(trades, entries, mode),
            comparisons: period_comparisons(trades, mode, today),
            tasks: detect_tasks(trades, entries, today),
            projection,
            risk_of_ruin: ruin,
            statistics,
        }
    }
}

/// Daily sums in date order with a running cumulative value.
pub fn equity_curve(trades: &[Trade], mode: DisplayMode) -> Vec<EquityCurvePoint> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.is_closed()) {
        if let Some(value) = trade.value(mode) {
            let entry = days.entry(trade.date).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, (daily_value, trade_count))| {
            cumulative += daily_value;
            EquityCurvePoint {
                date,
                daily_value,
                cumulative_value: cumulative,
                trade_count,
            }
        })
        .collect()
}
