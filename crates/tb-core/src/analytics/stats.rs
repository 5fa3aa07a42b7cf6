//! Counting statistics: overall, per category, per hour of day.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::AnalyticsConfig;
use crate::block::{BlockStatus, TimeBlock};
use crate::calendar::Calendar;
use crate::progress::ratio;

/// Bucket name for blocks without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Overall counts and durations for a set of blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionStatistics {
    pub total_blocks: u32,
    pub completed_blocks: u32,
    pub skipped_blocks: u32,
    pub in_progress_blocks: u32,
    pub not_started_blocks: u32,
    pub completion_rate: f64,
    pub skip_rate: f64,
    /// Sum of all block durations.
    pub scheduled_minutes: i64,
    /// Sum of completed block durations.
    pub completed_minutes: i64,
    /// Days with at least one block.
    pub active_days: u32,
    pub average_blocks_per_day: f64,
}

impl CompletionStatistics {
    pub fn from_blocks(blocks: &[&TimeBlock], calendar: &Calendar) -> Self {
        let mut stats = Self {
            total_blocks: 0,
            completed_blocks: 0,
            skipped_blocks: 0,
            in_progress_blocks: 0,
            not_started_blocks: 0,
            completion_rate: 0.0,
            skip_rate: 0.0,
            scheduled_minutes: 0,
            completed_minutes: 0,
            active_days: 0,
            average_blocks_per_day: 0.0,
        };
        let mut days = BTreeSet::new();

        for block in blocks {
            stats.total_blocks += 1;
            stats.scheduled_minutes += block.duration_minutes();
            days.insert(block.day(calendar));
            match block.status {
                BlockStatus::Completed => {
                    stats.completed_blocks += 1;
                    stats.completed_minutes += block.duration_minutes();
                }
                BlockStatus::Skipped => stats.skipped_blocks += 1,
                BlockStatus::InProgress => stats.in_progress_blocks += 1,
                BlockStatus::NotStarted => stats.not_started_blocks += 1,
            }
        }

        stats.active_days = u32::try_from(days.len()).unwrap_or(u32::MAX);
        stats.completion_rate = ratio(stats.completed_blocks, stats.total_blocks);
        stats.skip_rate = ratio(stats.skipped_blocks, stats.total_blocks);
        if stats.active_days > 0 {
            stats.average_blocks_per_day =
                f64::from(stats.total_blocks) / f64::from(stats.active_days);
        }
        stats
    }
}

/// How one category performed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub total_blocks: u32,
    pub completed_blocks: u32,
    pub completion_rate: f64,
    pub total_minutes: i64,
    pub completed_minutes: i64,
}

/// Groups blocks by category, best completion rate first.
///
/// Blocks without a category fall into [`UNCATEGORIZED`]. Ties are broken by
/// category name so the order is stable.
pub fn category_performance(blocks: &[&TimeBlock]) -> Vec<CategoryPerformance> {
    let mut groups: BTreeMap<&str, CategoryPerformance> = BTreeMap::new();
    for block in blocks {
        let name = block.category_name().unwrap_or(UNCATEGORIZED);
        let entry = groups.entry(name).or_insert_with(|| CategoryPerformance {
            category: name.to_string(),
            total_blocks: 0,
            completed_blocks: 0,
            completion_rate: 0.0,
            total_minutes: 0,
            completed_minutes: 0,
        });
        entry.total_blocks += 1;
        entry.total_minutes += block.duration_minutes();
        if block.status == BlockStatus::Completed {
            entry.completed_blocks += 1;
            entry.completed_minutes += block.duration_minutes();
        }
    }

    let mut performance: Vec<CategoryPerformance> = groups
        .into_values()
        .map(|mut c| {
            c.completion_rate = ratio(c.completed_blocks, c.total_blocks);
            c
        })
        .collect();
    performance.sort_by(|a, b| {
        b.completion_rate
            .total_cmp(&a.completion_rate)
            .then_with(|| a.category.cmp(&b.category))
    });
    performance
}

/// Completion for blocks starting in one local hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourStats {
    /// Local hour, 0..24.
    pub hour: u32,
    pub total_blocks: u32,
    pub completed_blocks: u32,
    pub completion_rate: f64,
}

/// Per-hour completion and the best hours of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOfDayStats {
    /// Every hour that had at least one block, ascending.
    pub hours: Vec<HourStats>,
    /// Highest-completion hours among those with enough samples.
    pub most_productive_hours: Vec<HourStats>,
}

/// Groups blocks by the local hour they start in.
///
/// Only hours with at least `min_hour_samples` blocks are eligible for the
/// "most productive" ranking, so a single lucky block cannot top it.
pub fn time_of_day_stats(
    blocks: &[&TimeBlock],
    calendar: &Calendar,
    config: &AnalyticsConfig,
) -> TimeOfDayStats {
    let mut by_hour: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for block in blocks {
        let (total, completed) = by_hour.entry(calendar.hour_of(block.start_time)).or_default();
        *total += 1;
        if block.status == BlockStatus::Completed {
            *completed += 1;
        }
    }

    let hours: Vec<HourStats> = by_hour
        .into_iter()
        .map(|(hour, (total, completed))| HourStats {
            hour,
            total_blocks: total,
            completed_blocks: completed,
            completion_rate: ratio(completed, total),
        })
        .collect();

    let mut ranked: Vec<HourStats> = hours
        .iter()
        .filter(|h| h.total_blocks >= config.min_hour_samples)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.completion_rate
            .total_cmp(&a.completion_rate)
            .then_with(|| a.hour.cmp(&b.hour))
    });
    ranked.truncate(config.top_hours);

    TimeOfDayStats {
        hours,
        most_productive_hours: ranked,
    }
}
