//! Open time slot suggestions.
//!
//! Walks caller-defined day segments ("Morning 6-9", ...) looking for gaps
//! that fit a block of the requested length. This is a greedy scan meant for a
//! short, human-facing list of options; it does not try to find a globally
//! optimal packing.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::block::{MAX_BLOCK_MINUTES, Span, TimeBlock};
use crate::calendar::Calendar;
use crate::conflict::find_conflicts;

/// A named part of the day in which slots are suggested.
///
/// Hours are local wall-clock hours on the target date; `end_hour` may be 24.
/// The peak sub-range marks the hours considered best for focus work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySegment {
    pub label: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub peak_start_hour: u32,
    pub peak_end_hour: u32,
}

impl DaySegment {
    /// A segment whose peak is its first hour.
    pub fn new(label: impl Into<String>, start_hour: u32, end_hour: u32) -> Self {
        Self {
            label: label.into(),
            start_hour,
            end_hour,
            peak_start_hour: start_hour,
            peak_end_hour: start_hour + 1,
        }
    }

    #[must_use]
    pub fn with_peak(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.peak_start_hour = start_hour;
        self.peak_end_hour = end_hour;
        self
    }

    /// Whether a slot starting in `hour` falls in the peak window.
    pub const fn is_peak(&self, hour: u32) -> bool {
        hour >= self.peak_start_hour && hour < self.peak_end_hour
    }
}

/// The segments used when the caller does not configure any.
pub fn default_segments() -> Vec<DaySegment> {
    vec![
        DaySegment::new("Morning", 6, 9).with_peak(7, 8),
        DaySegment::new("Afternoon", 14, 17).with_peak(14, 15),
        DaySegment::new("Evening", 19, 21).with_peak(19, 20),
    ]
}

/// Tuning for the slot scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotOptions {
    /// Grid, in minutes, the cursor snaps to after skipping a conflict.
    /// Default: 15.
    pub granularity_minutes: i64,

    /// How far the cursor moves after a slot is suggested.
    /// Default: 60.
    pub advance_minutes: i64,

    /// Slots starting before this instant are not suggested.
    #[serde(skip)]
    pub not_before: Option<DateTime<Utc>>,
}

impl Default for SlotOptions {
    fn default() -> Self {
        Self {
            granularity_minutes: 15,
            advance_minutes: 60,
            not_before: None,
        }
    }
}

/// A free interval the caller could schedule into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSuggestion {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Label of the segment the slot was found in.
    pub segment: String,
    /// Whether the slot starts in the segment's peak hours.
    pub is_optimal: bool,
}

/// Suggests open slots of `duration` on `date`.
///
/// For each segment the cursor starts at the segment start. A candidate that
/// conflicts with existing blocks moves the cursor past the end of the latest
/// conflicting block (snapped up to the granularity grid) instead of creeping
/// forward in small steps. A free candidate is emitted and the cursor advances
/// by `advance_minutes`. Candidates must end within their segment.
///
/// Returns suggestions ordered by start time. Non-positive durations and
/// durations longer than a day yield nothing.
pub fn suggest_slots(
    date: NaiveDate,
    existing: &[TimeBlock],
    duration: Duration,
    segments: &[DaySegment],
    options: &SlotOptions,
    calendar: &Calendar,
) -> Vec<SlotSuggestion> {
    if duration <= Duration::zero() || duration > Duration::minutes(MAX_BLOCK_MINUTES) {
        return Vec::new();
    }

    let step = Duration::minutes(options.granularity_minutes.max(1));
    let advance = Duration::minutes(options.advance_minutes.max(1));

    let mut suggestions = Vec::new();
    for segment in segments {
        let segment_start = calendar.at(date, segment.start_hour.min(24), 0);
        let segment_end = calendar.at(date, segment.end_hour.min(24), 0);
        if segment_end <= segment_start {
            tracing::debug!(segment = %segment.label, "skipping empty segment");
            continue;
        }

        let mut cursor = segment_start;
        if let Some(not_before) = options.not_before.filter(|t| *t > segment_start) {
            cursor = snap_up(not_before, segment_start, step);
        }

        while cursor + duration <= segment_end {
            let candidate = Span::new(cursor, cursor + duration);
            let conflicts = find_conflicts(&candidate, existing, None, calendar);
            if let Some(latest_end) = conflicts.iter().map(|b| b.end_time).max() {
                cursor = snap_up(latest_end, segment_start, step);
            } else {
                suggestions.push(SlotSuggestion {
                    start: candidate.start,
                    end: candidate.end,
                    segment: segment.label.clone(),
                    is_optimal: segment.is_peak(calendar.hour_of(candidate.start)),
                });
                cursor += advance;
            }
        }
    }

    suggestions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.segment.cmp(&b.segment)));
    tracing::debug!(%date, count = suggestions.len(), "suggested slots");
    suggestions
}

/// Rounds `instant` up to the next multiple of `step` after `origin`.
fn snap_up(instant: DateTime<Utc>, origin: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let offset = (instant - origin).num_seconds().max(0);
    let step_secs = step.num_seconds().max(1);
    let steps = (offset + step_secs - 1) / step_secs;
    origin + Duration::seconds(steps * step_secs)
}
