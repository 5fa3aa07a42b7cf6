//! Weekly and monthly report assembly.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use super::AnalyticsConfig;
use super::insights::{ImprovementSuggestion, ProductiveDay, best_day, improvement_suggestions, productive_days};
use super::stats::{CategoryPerformance, CompletionStatistics, TimeOfDayStats, category_performance, time_of_day_stats};
use super::streak::{current_streak, longest_streak};
use super::trend::{TrendAnalysis, analyze_trend};
use crate::block::{BlockStatus, TimeBlock};
use crate::calendar::{Calendar, DateRange};
use crate::progress::{DailyProgress, aggregate, aggregate_days, ratio};

/// Summary of the trailing week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub period: DateRange,
    pub generated_at: DateTime<Utc>,
    pub statistics: CompletionStatistics,
    /// One entry per day of the period, including empty days.
    pub daily_breakdown: Vec<DailyProgress>,
    pub category_performance: Vec<CategoryPerformance>,
    pub time_of_day: TimeOfDayStats,
    pub best_day: Option<ProductiveDay>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub trend: TrendAnalysis,
}

/// One seven-day slice of a monthly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBreakdown {
    pub period: DateRange,
    pub total_blocks: u32,
    pub completed_blocks: u32,
    pub completion_rate: f64,
    pub completed_minutes: i64,
}

/// Summary of the trailing month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub period: DateRange,
    pub generated_at: DateTime<Utc>,
    pub statistics: CompletionStatistics,
    pub category_performance: Vec<CategoryPerformance>,
    pub weekly_breakdown: Vec<WeeklyBreakdown>,
    pub improvement_suggestions: Vec<ImprovementSuggestion>,
    pub productive_days: Vec<ProductiveDay>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Builds the report for the `weekly_window_days` days ending today.
///
/// `blocks` should reach back to the Monday of last week so the trend has
/// data; blocks outside the window are otherwise ignored. `progress` supplies
/// ratings and notes, and history for streaks beyond the loaded blocks.
pub fn weekly_report(
    blocks: &[TimeBlock],
    progress: &[DailyProgress],
    now: DateTime<Utc>,
    calendar: &Calendar,
    config: &AnalyticsConfig,
) -> WeeklyReport {
    let today = calendar.day_of(now);
    let period = DateRange::trailing(today, config.weekly_window_days);
    let in_period = blocks_in(blocks, period, calendar);
    debug!(start = %period.start, end = %period.end, blocks = in_period.len(), "building weekly report");

    let history = merged_progress(blocks, progress, period, calendar);
    let daily_breakdown = fill_period(&history, period);
    let history: Vec<DailyProgress> = history.into_values().collect();

    WeeklyReport {
        period,
        generated_at: now,
        statistics: CompletionStatistics::from_blocks(&in_period, calendar),
        best_day: best_day(&daily_breakdown),
        daily_breakdown,
        category_performance: category_performance(&in_period),
        time_of_day: time_of_day_stats(&in_period, calendar, config),
        current_streak: current_streak(&history, today),
        longest_streak: longest_streak(&history),
        trend: analyze_trend(blocks, now, calendar, config),
    }
}

/// Builds the report for the `monthly_window_days` days ending today.
pub fn monthly_report(
    blocks: &[TimeBlock],
    progress: &[DailyProgress],
    now: DateTime<Utc>,
    calendar: &Calendar,
    config: &AnalyticsConfig,
) -> MonthlyReport {
    let today = calendar.day_of(now);
    let period = DateRange::trailing(today, config.monthly_window_days);
    let in_period = blocks_in(blocks, period, calendar);
    debug!(start = %period.start, end = %period.end, blocks = in_period.len(), "building monthly report");

    let statistics = CompletionStatistics::from_blocks(&in_period, calendar);
    let categories = category_performance(&in_period);
    let suggestions = improvement_suggestions(
        &in_period,
        statistics.average_blocks_per_day,
        &categories,
        config,
    );

    let history = merged_progress(blocks, progress, period, calendar);
    let period_days = fill_period(&history, period);
    let history: Vec<DailyProgress> = history.into_values().collect();

    MonthlyReport {
        period,
        generated_at: now,
        weekly_breakdown: weekly_breakdown(&in_period, period, calendar),
        improvement_suggestions: suggestions,
        productive_days: productive_days(&period_days, config),
        current_streak: current_streak(&history, today),
        longest_streak: longest_streak(&history),
        statistics,
        category_performance: categories,
    }
}

fn blocks_in<'a>(blocks: &'a [TimeBlock], period: DateRange, calendar: &Calendar) -> Vec<&'a TimeBlock> {
    blocks
        .iter()
        .filter(|b| period.contains(b.day(calendar)))
        .collect()
}

/// Stored progress with counters refreshed from the blocks at hand.
///
/// Only days that were stored or have blocks appear, so a blank today does not
/// break a streak that ended yesterday. Stored days inside `period` are
/// recounted from the blocks (zero when none were loaded); stored rating and
/// notes always survive.
fn merged_progress(
    blocks: &[TimeBlock],
    progress: &[DailyProgress],
    period: DateRange,
    calendar: &Calendar,
) -> BTreeMap<NaiveDate, DailyProgress> {
    let mut merged: BTreeMap<NaiveDate, DailyProgress> =
        progress.iter().map(|p| (p.date, p.clone())).collect();

    for (_, entry) in merged.range_mut(period.start..=period.end) {
        entry.recompute(std::iter::empty::<&TimeBlock>());
    }

    for (date, counted) in aggregate_days(blocks, calendar) {
        let entry = merged.entry(date).or_insert_with(|| DailyProgress::empty(date));
        entry.total_blocks = counted.total_blocks;
        entry.completed_blocks = counted.completed_blocks;
        entry.skipped_blocks = counted.skipped_blocks;
    }
    merged
}

/// One entry per day of `period`, empty where nothing was stored or scheduled.
fn fill_period(history: &BTreeMap<NaiveDate, DailyProgress>, period: DateRange) -> Vec<DailyProgress> {
    period
        .days()
        .map(|date| {
            history
                .get(&date)
                .cloned()
                .unwrap_or_else(|| DailyProgress::empty(date))
        })
        .collect()
}

fn weekly_breakdown(blocks: &[&TimeBlock], period: DateRange, calendar: &Calendar) -> Vec<WeeklyBreakdown> {
    let mut weeks = Vec::new();
    let mut start = period.start;
    while start <= period.end {
        let end = (start + Duration::days(6)).min(period.end);
        let window = DateRange::new(start, end);
        let week_blocks: Vec<&TimeBlock> = blocks
            .iter()
            .copied()
            .filter(|b| window.contains(b.day(calendar)))
            .collect();

        let counted = aggregate(start, week_blocks.iter().copied());
        let completed_minutes = week_blocks
            .iter()
            .filter(|b| b.status == BlockStatus::Completed)
            .map(|b| b.duration_minutes())
            .sum();
        weeks.push(WeeklyBreakdown {
            period: window,
            total_blocks: counted.total_blocks,
            completed_blocks: counted.completed_blocks,
            completion_rate: ratio(counted.completed_blocks, counted.total_blocks),
            completed_minutes,
        });
        start = end + Duration::days(1);
    }
    weeks
}
