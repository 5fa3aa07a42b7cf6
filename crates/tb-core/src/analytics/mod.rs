//! Completion analytics over time blocks and daily progress.
//!
//! Everything in this module is a pure function of its inputs. Empty input
//! degrades to zeroed statistics and empty lists; no function here returns an
//! error or panics on division by zero.
//!
//! # Pipeline
//!
//! 1. Filter blocks to the report window (by calendar day of their start).
//! 2. Compute overall [`CompletionStatistics`], per-category and per-hour stats.
//! 3. Aggregate each day of the window into a [`crate::DailyProgress`].
//! 4. Derive streaks from stored daily progress and the week-over-week trend.
//! 5. For monthly reports, add weekly sub-breakdowns, productive days and
//!    improvement suggestions.

mod insights;
mod report;
mod stats;
mod streak;
mod trend;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};

pub use insights::{
    ImprovementSuggestion, ProductiveDay, Severity, SuggestionKind, improvement_suggestions,
    productive_days,
};
pub use report::{MonthlyReport, WeeklyBreakdown, WeeklyReport, monthly_report, weekly_report};
pub use stats::{
    CategoryPerformance, CompletionStatistics, HourStats, TimeOfDayStats, UNCATEGORIZED,
    category_performance, time_of_day_stats,
};
pub use streak::{current_streak, longest_streak};
pub use trend::{TrendAnalysis, TrendDirection, analyze_trend, compare_rates};

/// Thresholds used by the analytics heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Days in a weekly report window. Default: 7.
    pub weekly_window_days: u32,

    /// Days in a monthly report window. Default: 30.
    pub monthly_window_days: u32,

    /// Blocks an hour needs before it can rank as "most productive".
    /// Default: 3.
    pub min_hour_samples: u32,

    /// How many productive hours to report. Default: 3.
    pub top_hours: usize,

    /// Blocks a day needs to count as a productive day. Default: 3.
    pub productive_min_blocks: u32,

    /// Completion rate a day needs to count as a productive day. Default: 0.8.
    pub productive_min_rate: f64,

    /// How many productive days to report. Default: 5.
    pub top_productive_days: usize,

    /// Rate difference between weeks that counts as a real change.
    /// Default: 0.05.
    pub trend_threshold: f64,

    /// Average blocks per active day above which the schedule is flagged as
    /// overloaded. Default: 10.
    pub max_blocks_per_day: f64,

    /// Blocks longer than this many minutes are flagged for splitting.
    /// Default: 120.
    pub long_block_minutes: i64,

    /// Categories completing below this rate are flagged. Default: 0.5.
    pub weak_category_rate: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            weekly_window_days: 7,
            monthly_window_days: 30,
            min_hour_samples: 3,
            top_hours: 3,
            productive_min_blocks: 3,
            productive_min_rate: 0.8,
            top_productive_days: 5,
            trend_threshold: 0.05,
            max_blocks_per_day: 10.0,
            long_block_minutes: 120,
            weak_category_rate: 0.5,
        }
    }
}
