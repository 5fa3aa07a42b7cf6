//! The time block entity and its validation rules.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::Calendar;
use crate::types::{BlockId, ValidationError};

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum notes length in characters.
pub const MAX_NOTES_CHARS: usize = 500;

/// Maximum category length in characters.
pub const MAX_CATEGORY_CHARS: usize = 50;

/// Maximum block length in minutes (one full day).
pub const MAX_BLOCK_MINUTES: i64 = 24 * 60;

/// Lifecycle status of a time block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Scheduled, not yet begun.
    #[default]
    NotStarted,
    /// The wall clock is inside the block, or the user started it.
    InProgress,
    /// Finished by the user.
    Completed,
    /// Explicitly skipped by the user.
    Skipped,
}

impl BlockStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Skipped,
    ];

    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    /// Terminal statuses are set by the user and never derived from the clock.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BlockStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A rule a candidate block breaks.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("title is {len} characters, the limit is {max}")]
    TitleTooLong { len: usize, max: usize },

    #[error("notes are {len} characters, the limit is {max}")]
    NotesTooLong { len: usize, max: usize },

    #[error("category is {len} characters, the limit is {max}")]
    CategoryTooLong { len: usize, max: usize },

    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("block lasts {minutes} minutes, longer than a day")]
    LongerThanDay { minutes: i64 },

    #[error("block starts on {start_day} but ends on {end_day}")]
    SpansDays {
        start_day: NaiveDate,
        end_day: NaiveDate,
    },
}

/// Anything with a start and end instant that can take part in conflict checks.
///
/// Implemented by stored blocks, drafts that have not been saved yet, and bare
/// spans, so the conflict detector and slot suggester can test any of them.
pub trait Scheduled {
    /// Inclusive start instant.
    fn start(&self) -> DateTime<Utc>;

    /// Exclusive end instant.
    fn end(&self) -> DateTime<Utc>;

    /// The stored block's ID, if this is a stored block.
    fn block_id(&self) -> Option<&BlockId> {
        None
    }
}

/// A bare half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl Scheduled for Span {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// The caller-supplied fields of a block that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDraft {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl BlockDraft {
    /// Creates a draft with only the required fields.
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            notes: None,
            category: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Returns every rule this draft breaks. Empty means valid.
    pub fn validate(&self, calendar: &Calendar) -> Vec<ValidationIssue> {
        check_fields(
            &self.title,
            self.notes.as_deref(),
            self.category.as_deref(),
            self.start_time,
            self.end_time,
            calendar,
        )
    }
}

impl Scheduled for BlockDraft {
    fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end(&self) -> DateTime<Utc> {
        self.end_time
    }
}

/// Validates a candidate block before it enters the set.
///
/// This is the entry point callers use on their write path; it reports all
/// issues at once rather than stopping at the first.
pub fn validate(candidate: &BlockDraft, calendar: &Calendar) -> Vec<ValidationIssue> {
    candidate.validate(calendar)
}

/// A partial update to an existing block.
///
/// `None` leaves a field unchanged. For optional fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub icon: Option<Option<String>>,
}

impl BlockPatch {
    /// Whether the patch moves the block in time.
    pub const fn changes_schedule(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.notes.is_none()
            && self.category.is_none()
            && self.icon.is_none()
    }
}

/// A scheduled interval of a single day with a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    /// Unique identifier, generated once.
    pub id: BlockId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: BlockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeBlock {
    /// Creates a block from a draft after validating it.
    ///
    /// Conflict checks are the caller's job; see [`crate::find_conflicts`].
    pub fn new(
        draft: BlockDraft,
        now: DateTime<Utc>,
        calendar: &Calendar,
    ) -> Result<Self, Vec<ValidationIssue>> {
        let issues = draft.validate(calendar);
        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(Self {
            id: BlockId::generate(),
            title: draft.title.trim().to_string(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            notes: non_blank(draft.notes),
            category: non_blank(draft.category),
            icon: non_blank(draft.icon),
            status: BlockStatus::NotStarted,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns every rule this block breaks. Empty means valid.
    pub fn validate(&self, calendar: &Calendar) -> Vec<ValidationIssue> {
        check_fields(
            &self.title,
            self.notes.as_deref(),
            self.category.as_deref(),
            self.start_time,
            self.end_time,
            calendar,
        )
    }

    /// The draft this block would become after applying `patch`.
    ///
    /// Used to validate and conflict-check an edit before committing it.
    pub fn patched(&self, patch: &BlockPatch) -> BlockDraft {
        BlockDraft {
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            start_time: patch.start_time.unwrap_or(self.start_time),
            end_time: patch.end_time.unwrap_or(self.end_time),
            notes: patch.notes.clone().unwrap_or_else(|| self.notes.clone()),
            category: patch.category.clone().unwrap_or_else(|| self.category.clone()),
            icon: patch.icon.clone().unwrap_or_else(|| self.icon.clone()),
        }
    }

    /// Overwrites the editable fields from an already validated draft.
    ///
    /// Status is untouched; it only changes through [`crate::apply_status`].
    pub fn apply_draft(&mut self, draft: BlockDraft, now: DateTime<Utc>) {
        self.title = draft.title.trim().to_string();
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.notes = non_blank(draft.notes);
        self.category = non_blank(draft.category);
        self.icon = non_blank(draft.icon);
        self.updated_at = now;
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Length in whole minutes, never negative.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes().max(0)
    }

    /// The calendar day the block belongs to (the day it starts on).
    pub fn day(&self, calendar: &Calendar) -> NaiveDate {
        calendar.day_of(self.start_time)
    }

    /// Category name used for grouping; blank categories count as missing.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

impl Scheduled for TimeBlock {
    fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end(&self) -> DateTime<Utc> {
        self.end_time
    }

    fn block_id(&self) -> Option<&BlockId> {
        Some(&self.id)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_fields(
    title: &str,
    notes: Option<&str>,
    category: Option<&str>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    calendar: &Calendar,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let title = title.trim();
    if title.is_empty() {
        issues.push(ValidationIssue::EmptyTitle);
    } else {
        let len = title.chars().count();
        if len > MAX_TITLE_CHARS {
            issues.push(ValidationIssue::TitleTooLong {
                len,
                max: MAX_TITLE_CHARS,
            });
        }
    }

    if let Some(notes) = notes {
        let len = notes.trim().chars().count();
        if len > MAX_NOTES_CHARS {
            issues.push(ValidationIssue::NotesTooLong {
                len,
                max: MAX_NOTES_CHARS,
            });
        }
    }

    if let Some(category) = category {
        let len = category.trim().chars().count();
        if len > MAX_CATEGORY_CHARS {
            issues.push(ValidationIssue::CategoryTooLong {
                len,
                max: MAX_CATEGORY_CHARS,
            });
        }
    }

    if end <= start {
        issues.push(ValidationIssue::EndNotAfterStart);
        return issues;
    }

    let minutes = (end - start).num_minutes();
    if minutes > MAX_BLOCK_MINUTES {
        issues.push(ValidationIssue::LongerThanDay { minutes });
    }

    // A block may end exactly at the following midnight.
    let start_day = calendar.day_of(start);
    if end > calendar.day_end(start_day) {
        issues.push(ValidationIssue::SpansDays {
            start_day,
            end_day: calendar.day_of(end),
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn status_from_str_round_trips_every_variant() {
        for status in BlockStatus::ALL {
            assert_eq!(status.as_str().parse::<BlockStatus>().unwrap(), status);
        }
        assert!("done".parse::<BlockStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&BlockStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn terminal_statuses() {
        assert!(BlockStatus::Completed.is_terminal());
        assert!(BlockStatus::Skipped.is_terminal());
        assert!(!BlockStatus::NotStarted.is_terminal());
        assert!(!BlockStatus::InProgress.is_terminal());
    }

    #[test]
    fn valid_draft_has_no_issues() {
        let draft = BlockDraft::new("Deep work", at(9, 0), at(10, 30)).with_category("Work");
        assert!(validate(&draft, &Calendar::utc()).is_empty());
    }

    #[test]
    fn blank_title_is_rejected() {
        let draft = BlockDraft::new("   ", at(9, 0), at(10, 0));
        assert_eq!(
            validate(&draft, &Calendar::utc()),
            vec![ValidationIssue::EmptyTitle]
        );
    }

    #[test]
    fn length_limits_are_counted_in_chars() {
        let title = "é".repeat(MAX_TITLE_CHARS);
        let draft = BlockDraft::new(title, at(9, 0), at(10, 0));
        assert!(validate(&draft, &Calendar::utc()).is_empty());

        let draft = BlockDraft::new("x".repeat(101), at(9, 0), at(10, 0))
            .with_notes("n".repeat(501))
            .with_category("c".repeat(51));
        let issues = validate(&draft, &Calendar::utc());
        assert_eq!(
            issues,
            vec![
                ValidationIssue::TitleTooLong { len: 101, max: 100 },
                ValidationIssue::NotesTooLong { len: 501, max: 500 },
                ValidationIssue::CategoryTooLong { len: 51, max: 50 },
            ]
        );
    }

    #[test]
    fn start_must_precede_end() {
        let same = BlockDraft::new("x", at(9, 0), at(9, 0));
        assert_eq!(
            validate(&same, &Calendar::utc()),
            vec![ValidationIssue::EndNotAfterStart]
        );
        let reversed = BlockDraft::new("x", at(10, 0), at(9, 0));
        assert_eq!(
            validate(&reversed, &Calendar::utc()),
            vec![ValidationIssue::EndNotAfterStart]
        );
    }

    #[test]
    fn block_may_end_at_midnight_but_not_after() {
        let cal = Calendar::utc();
        let midnight = Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        let to_midnight = BlockDraft::new("late", at(23, 0), midnight);
        assert!(validate(&to_midnight, &cal).is_empty());

        let past = BlockDraft::new("late", at(23, 0), midnight + Duration::minutes(30));
        assert_eq!(
            validate(&past, &cal),
            vec![ValidationIssue::SpansDays {
                start_day: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                end_day: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
            }]
        );
    }

    #[test]
    fn whole_day_block_is_allowed() {
        let cal = Calendar::utc();
        let draft = BlockDraft::new("offsite", at(0, 0), at(0, 0) + Duration::hours(24));
        assert!(validate(&draft, &cal).is_empty());

        let too_long = BlockDraft::new("offsite", at(0, 0), at(0, 0) + Duration::hours(25));
        let issues = validate(&too_long, &cal);
        assert!(issues.contains(&ValidationIssue::LongerThanDay { minutes: 25 * 60 }));
    }

    #[test]
    fn new_block_trims_and_normalizes_fields() {
        let draft = BlockDraft::new("  Standup ", at(9, 0), at(9, 15))
            .with_category("  ")
            .with_notes(" daily ");
        let block = TimeBlock::new(draft, at(8, 0), &Calendar::utc()).unwrap();
        assert_eq!(block.title, "Standup");
        assert_eq!(block.category, None);
        assert_eq!(block.notes.as_deref(), Some("daily"));
        assert_eq!(block.status, BlockStatus::NotStarted);
        assert_eq!(block.created_at, at(8, 0));
        assert_eq!(block.updated_at, at(8, 0));
        assert_eq!(block.duration_minutes(), 15);
    }

    #[test]
    fn new_block_rejects_invalid_draft() {
        let draft = BlockDraft::new("", at(10, 0), at(9, 0));
        let issues = TimeBlock::new(draft, at(8, 0), &Calendar::utc()).unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn patched_keeps_unchanged_fields_and_clears_optionals() {
        let draft = BlockDraft::new("Gym", at(7, 0), at(8, 0)).with_category("Health");
        let block = TimeBlock::new(draft, at(6, 0), &Calendar::utc()).unwrap();

        let patch = BlockPatch {
            end_time: Some(at(8, 30)),
            category: Some(None),
            ..BlockPatch::default()
        };
        assert!(patch.changes_schedule());
        let candidate = block.patched(&patch);
        assert_eq!(candidate.title, "Gym");
        assert_eq!(candidate.start_time, at(7, 0));
        assert_eq!(candidate.end_time, at(8, 30));
        assert_eq!(candidate.category, None);
    }

    #[test]
    fn apply_draft_refreshes_updated_at_but_not_status() {
        let draft = BlockDraft::new("Read", at(20, 0), at(21, 0));
        let mut block = TimeBlock::new(draft, at(6, 0), &Calendar::utc()).unwrap();
        block.status = BlockStatus::Completed;
        let id = block.id.clone();

        block.apply_draft(BlockDraft::new("Read more", at(20, 0), at(21, 30)), at(7, 0));
        assert_eq!(block.id, id);
        assert_eq!(block.title, "Read more");
        assert_eq!(block.status, BlockStatus::Completed);
        assert_eq!(block.updated_at, at(7, 0));
        assert_eq!(block.created_at, at(6, 0));
    }

    #[test]
    fn category_name_ignores_blank() {
        let mut block =
            TimeBlock::new(BlockDraft::new("x", at(9, 0), at(10, 0)), at(8, 0), &Calendar::utc())
                .unwrap();
        assert_eq!(block.category_name(), None);
        block.category = Some(" ".to_string());
        assert_eq!(block.category_name(), None);
        block.category = Some("Work".to_string());
        assert_eq!(block.category_name(), Some("Work"));
    }
}
