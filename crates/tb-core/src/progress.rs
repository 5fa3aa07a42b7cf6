//! Per-day completion rollups.
//!
//! A [`DailyProgress`] is a pure function of the day's blocks plus the user's
//! own rating and notes. Counters are always recomputed from the blocks,
//! never patched incrementally, so the summary cannot drift from its source.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::block::{BlockStatus, TimeBlock};
use crate::calendar::Calendar;
use crate::types::DayRating;

/// Completion summary for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub total_blocks: u32,
    pub completed_blocks: u32,
    pub skipped_blocks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_rating: Option<DayRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_notes: Option<String>,
}

impl DailyProgress {
    /// An empty summary for `date`.
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_blocks: 0,
            completed_blocks: 0,
            skipped_blocks: 0,
            day_rating: None,
            day_notes: None,
        }
    }

    /// Fraction of blocks completed, in \[0, 1\]. Zero for a day without blocks.
    pub fn completion_percentage(&self) -> f64 {
        ratio(self.completed_blocks, self.total_blocks)
    }

    /// Replaces the counters with a fresh count of `blocks`.
    ///
    /// The rating and notes are the user's and are kept.
    pub fn recompute<'a, I>(&mut self, blocks: I)
    where
        I: IntoIterator<Item = &'a TimeBlock>,
    {
        let (total, completed, skipped) = count(blocks);
        self.total_blocks = total;
        self.completed_blocks = completed;
        self.skipped_blocks = skipped;
    }

    /// Records the user's rating and notes for the day.
    pub fn set_rating(&mut self, rating: Option<DayRating>, notes: Option<String>) {
        self.day_rating = rating;
        self.day_notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    }
}

/// Builds the progress summary for `date` from that day's blocks.
///
/// The caller passes only the blocks of `date`; use [`aggregate_days`] to
/// split a mixed set. Applying this twice to the same input gives identical
/// results.
pub fn aggregate<'a, I>(date: NaiveDate, blocks_for_date: I) -> DailyProgress
where
    I: IntoIterator<Item = &'a TimeBlock>,
{
    let mut progress = DailyProgress::empty(date);
    progress.recompute(blocks_for_date);
    progress
}

/// Groups blocks by calendar day and aggregates each day.
///
/// Only days with at least one block appear in the result.
pub fn aggregate_days(blocks: &[TimeBlock], calendar: &Calendar) -> BTreeMap<NaiveDate, DailyProgress> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&TimeBlock>> = BTreeMap::new();
    for block in blocks {
        by_day.entry(block.day(calendar)).or_default().push(block);
    }
    by_day
        .into_iter()
        .map(|(date, day_blocks)| (date, aggregate(date, day_blocks)))
        .collect()
}

/// Safe ratio: zero when the denominator is zero.
pub(crate) fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (f64::from(numerator) / f64::from(denominator)).clamp(0.0, 1.0)
}

fn count<'a, I>(blocks: I) -> (u32, u32, u32)
where
    I: IntoIterator<Item = &'a TimeBlock>,
{
    let mut total = 0u32;
    let mut completed = 0u32;
    let mut skipped = 0u32;
    for block in blocks {
        total = total.saturating_add(1);
        match block.status {
            BlockStatus::Completed => completed = completed.saturating_add(1),
            BlockStatus::Skipped => skipped = skipped.saturating_add(1),
            BlockStatus::NotStarted | BlockStatus::InProgress => {}
        }
    }
    (total, completed, skipped)
}
