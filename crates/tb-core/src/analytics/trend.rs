//! Week-over-week completion trend.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::AnalyticsConfig;
use crate::block::{BlockStatus, TimeBlock};
use crate::calendar::Calendar;
use crate::progress::ratio;

/// Rate change at or above which a trend is described as a big swing.
const STRONG_CHANGE: f64 = 0.2;

/// Which way completion is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// Completion this week compared with last week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub this_week_rate: f64,
    pub last_week_rate: f64,
    /// `this_week_rate - last_week_rate`.
    pub percentage_change: f64,
    pub direction: TrendDirection,
    pub message: String,
}

/// Compares two completion rates.
///
/// The direction is `Improving` or `Declining` only when the rates differ by
/// more than `threshold`; smaller changes are `Stable`.
pub fn compare_rates(this_week_rate: f64, last_week_rate: f64, threshold: f64) -> TrendAnalysis {
    let change = this_week_rate - last_week_rate;
    let direction = if change > threshold {
        TrendDirection::Improving
    } else if -change > threshold {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    TrendAnalysis {
        this_week_rate,
        last_week_rate,
        percentage_change: change,
        direction,
        message: trend_message(direction, change, this_week_rate, last_week_rate),
    }
}

/// Computes the trend from raw blocks.
///
/// "This week" runs from Monday 00:00 local time of the current week up to
/// `now`; "last week" is the seven days before that Monday.
pub fn analyze_trend(
    blocks: &[TimeBlock],
    now: DateTime<Utc>,
    calendar: &Calendar,
    config: &AnalyticsConfig,
) -> TrendAnalysis {
    let week_start = calendar.day_start(Calendar::week_start(calendar.day_of(now)));
    let last_week_start = week_start - Duration::days(7);

    let this_week = window_rate(blocks, week_start, now, true);
    let last_week = window_rate(blocks, last_week_start, week_start, false);
    compare_rates(this_week, last_week, config.trend_threshold)
}

/// Completion rate of blocks starting in `[from, to)`, or `[from, to]` when
/// `inclusive_end` is set.
fn window_rate(blocks: &[TimeBlock], from: DateTime<Utc>, to: DateTime<Utc>, inclusive_end: bool) -> f64 {
    let mut total = 0;
    let mut completed = 0;
    for block in blocks {
        let start = block.start_time;
        let in_window = start >= from && (start < to || (inclusive_end && start == to));
        if in_window {
            total += 1;
            if block.status == BlockStatus::Completed {
                completed += 1;
            }
        }
    }
    ratio(completed, total)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "rates are bounded to [-1, 1], so points fit in i64"
)]
fn trend_message(direction: TrendDirection, change: f64, this_week: f64, last_week: f64) -> String {
    let points = (change.abs() * 100.0).round() as i64;
    match direction {
        TrendDirection::Improving if change >= STRONG_CHANGE => {
            format!("Great momentum: completion is up {points} points on last week.")
        }
        TrendDirection::Improving => {
            format!("Completion is up {points} points on last week. Keep it going.")
        }
        TrendDirection::Declining if -change >= STRONG_CHANGE => format!(
            "Completion dropped {points} points from last week. Consider planning fewer blocks."
        ),
        TrendDirection::Declining => {
            format!("Completion is down {points} points from last week.")
        }
        TrendDirection::Stable if this_week <= 0.0 && last_week <= 0.0 => {
            "Not enough completed blocks yet to compare weeks.".to_string()
        }
        TrendDirection::Stable => "Completion is steady compared to last week.".to_string(),
    }
}
