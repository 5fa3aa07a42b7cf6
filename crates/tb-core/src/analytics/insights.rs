//! Heuristic advice and productive-day ranking.

use chrono::NaiveDate;
use serde::Serialize;

use super::AnalyticsConfig;
use super::stats::CategoryPerformance;
use crate::block::TimeBlock;
use crate::progress::DailyProgress;

/// How strongly a suggestion is worth acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Which heuristic produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ReduceDailyLoad,
    SplitLongBlocks,
    FocusCategory,
}

/// Advisory text about the user's schedule. Has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImprovementSuggestion {
    pub kind: SuggestionKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Checks a period's blocks against the improvement heuristics.
///
/// Each rule fires independently:
/// - average blocks per active day above `max_blocks_per_day`,
/// - any block longer than `long_block_minutes`,
/// - the weakest category completing below `weak_category_rate`.
pub fn improvement_suggestions(
    blocks: &[&TimeBlock],
    average_blocks_per_day: f64,
    categories: &[CategoryPerformance],
    config: &AnalyticsConfig,
) -> Vec<ImprovementSuggestion> {
    let mut suggestions = Vec::new();

    if average_blocks_per_day > config.max_blocks_per_day {
        suggestions.push(ImprovementSuggestion {
            kind: SuggestionKind::ReduceDailyLoad,
            severity: Severity::High,
            title: "Schedule fewer blocks".to_string(),
            message: format!(
                "You average {average_blocks_per_day:.1} blocks a day. Try keeping it to {} or fewer so each one gets real attention.",
                config.max_blocks_per_day
            ),
        });
    }

    let long_blocks = blocks
        .iter()
        .filter(|b| b.duration_minutes() > config.long_block_minutes)
        .count();
    if long_blocks > 0 {
        suggestions.push(ImprovementSuggestion {
            kind: SuggestionKind::SplitLongBlocks,
            severity: Severity::Medium,
            title: "Break up long blocks".to_string(),
            message: format!(
                "{long_blocks} block(s) ran longer than {} minutes. Splitting them into shorter sessions makes them easier to finish.",
                config.long_block_minutes
            ),
        });
    }

    let weakest = categories.iter().min_by(|a, b| {
        a.completion_rate
            .total_cmp(&b.completion_rate)
            .then_with(|| a.category.cmp(&b.category))
    });
    if let Some(weakest) = weakest.filter(|c| c.completion_rate < config.weak_category_rate) {
        suggestions.push(ImprovementSuggestion {
            kind: SuggestionKind::FocusCategory,
            severity: Severity::Low,
            title: format!("Focus on {}", weakest.category),
            message: format!(
                "Only {:.0}% of your {} blocks get completed. Schedule them at your most productive hours.",
                weakest.completion_rate * 100.0,
                weakest.category
            ),
        });
    }

    suggestions
}

/// A day worth highlighting for its completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductiveDay {
    pub date: NaiveDate,
    pub completed_blocks: u32,
    pub total_blocks: u32,
    pub completion_rate: f64,
}

impl ProductiveDay {
    fn from_progress(progress: &DailyProgress) -> Self {
        Self {
            date: progress.date,
            completed_blocks: progress.completed_blocks,
            total_blocks: progress.total_blocks,
            completion_rate: progress.completion_percentage(),
        }
    }
}

/// Ranks days by completion, keeping only those busy and complete enough.
///
/// A day needs at least `productive_min_blocks` blocks and a rate of at least
/// `productive_min_rate`, so a single finished block does not make a
/// "productive day". Ordered by rate, then block count (descending), then
/// date; truncated to `top_productive_days`.
pub fn productive_days(days: &[DailyProgress], config: &AnalyticsConfig) -> Vec<ProductiveDay> {
    let mut ranked: Vec<ProductiveDay> = days
        .iter()
        .filter(|d| d.total_blocks >= config.productive_min_blocks)
        .filter(|d| d.completion_percentage() >= config.productive_min_rate)
        .map(ProductiveDay::from_progress)
        .collect();
    rank_days(&mut ranked);
    ranked.truncate(config.top_productive_days);
    ranked
}

/// The single best day among days with any blocks, without thresholds.
pub(crate) fn best_day(days: &[DailyProgress]) -> Option<ProductiveDay> {
    let mut ranked: Vec<ProductiveDay> = days
        .iter()
        .filter(|d| d.total_blocks > 0)
        .map(ProductiveDay::from_progress)
        .collect();
    rank_days(&mut ranked);
    ranked.into_iter().next()
}

fn rank_days(days: &mut [ProductiveDay]) {
    days.sort_by(|a, b| {
        b.completion_rate
            .total_cmp(&a.completion_rate)
            .then_with(|| b.total_blocks.cmp(&a.total_blocks))
            .then_with(|| a.date.cmp(&b.date))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::stats::category_performance;
    use crate::analytics::test_support::{block, day};
    use crate::block::BlockStatus;
    use insta::assert_snapshot;

    fn progress(date: NaiveDate, completed: u32, total: u32) -> DailyProgress {
        DailyProgress {
            total_blocks: total,
            completed_blocks: completed,
            ..DailyProgress::empty(date)
        }
    }

    fn render(suggestions: &[ImprovementSuggestion]) -> String {
        suggestions
            .iter()
            .map(|s| format!("[{}] {}: {}", s.severity.as_str(), s.title, s.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn healthy_schedule_gets_no_suggestions() {
        let d = day(2025, 3, 10);
        let blocks = [
            block(d, 9, 60, Some("Work"), BlockStatus::Completed),
            block(d, 11, 90, Some("Work"), BlockStatus::Completed),
        ];
        let refs: Vec<&TimeBlock> = blocks.iter().collect();
        let categories = category_performance(&refs);
        let suggestions =
            improvement_suggestions(&refs, 2.0, &categories, &AnalyticsConfig::default());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn every_heuristic_can_fire_together() {
        let d = day(2025, 3, 10);
        let blocks = [
            block(d, 9, 150, Some("Work"), BlockStatus::Completed),
            block(d, 12, 30, Some("Exercise"), BlockStatus::Skipped),
            block(d, 13, 30, Some("Exercise"), BlockStatus::NotStarted),
            block(d, 14, 30, Some("Exercise"), BlockStatus::Completed),
        ];
        let refs: Vec<&TimeBlock> = blocks.iter().collect();
        let categories = category_performance(&refs);
        let suggestions =
            improvement_suggestions(&refs, 12.0, &categories, &AnalyticsConfig::default());

        assert_snapshot!(render(&suggestions), @r"
        [high] Schedule fewer blocks: You average 12.0 blocks a day. Try keeping it to 10 or fewer so each one gets real attention.
        [medium] Break up long blocks: 1 block(s) ran longer than 120 minutes. Splitting them into shorter sessions makes them easier to finish.
        [low] Focus on Exercise: Only 33% of your Exercise blocks get completed. Schedule them at your most productive hours.
        ");
    }

    #[test]
    fn exactly_two_hours_is_not_long() {
        let blocks = [block(day(2025, 3, 10), 9, 120, None, BlockStatus::Completed)];
        let refs: Vec<&TimeBlock> = blocks.iter().collect();
        let suggestions = improvement_suggestions(&refs, 1.0, &[], &AnalyticsConfig::default());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn weak_category_needs_rate_below_threshold() {
        let d = day(2025, 3, 10);
        let blocks = [
            block(d, 9, 30, Some("Study"), BlockStatus::Completed),
            block(d, 10, 30, Some("Study"), BlockStatus::Skipped),
        ];
        let refs: Vec<&TimeBlock> = blocks.iter().collect();
        let categories = category_performance(&refs);
        // 50% is not below 0.5
        let suggestions =
            improvement_suggestions(&refs, 2.0, &categories, &AnalyticsConfig::default());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn productive_days_apply_both_thresholds() {
        let days = vec![
            progress(day(2025, 3, 1), 1, 1),  // too few blocks
            progress(day(2025, 3, 2), 3, 4),  // 75%, below rate
            progress(day(2025, 3, 3), 4, 5),  // 80%, qualifies
            progress(day(2025, 3, 4), 3, 3),  // 100%
            progress(day(2025, 3, 5), 6, 6),  // 100%, more blocks
        ];
        let ranked = productive_days(&days, &AnalyticsConfig::default());
        let dates: Vec<NaiveDate> = ranked.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(2025, 3, 5), day(2025, 3, 4), day(2025, 3, 3)]);
    }

    #[test]
    fn productive_days_are_capped_at_five() {
        let days: Vec<DailyProgress> = (1..=8).map(|d| progress(day(2025, 3, d), 3, 3)).collect();
        let ranked = productive_days(&days, &AnalyticsConfig::default());
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].date, day(2025, 3, 1));
    }

    #[test]
    fn best_day_ignores_empty_days() {
        let days = vec![
            DailyProgress::empty(day(2025, 3, 1)),
            progress(day(2025, 3, 2), 1, 2),
            progress(day(2025, 3, 3), 1, 4),
        ];
        assert_eq!(best_day(&days).map(|d| d.date), Some(day(2025, 3, 2)));
        assert_eq!(best_day(&[DailyProgress::empty(day(2025, 3, 1))]), None);
    }
}
