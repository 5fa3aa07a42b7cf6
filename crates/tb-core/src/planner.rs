//! The write path for time blocks.
//!
//! Every change to a block goes through the same sequence: load the affected
//! day, validate, check for conflicts, consult the creation policy, save, and
//! recompute the day's [`DailyProgress`]. [`Planner`] runs that sequence
//! against any [`BlockStore`] so callers cannot skip a step.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::block::{BlockDraft, BlockPatch, BlockStatus, TimeBlock, ValidationIssue};
use crate::calendar::{Calendar, DateRange};
use crate::conflict::find_conflicts;
use crate::progress::DailyProgress;
use crate::status::{apply_status, derive_status, refresh_all_for_now, reset_status};
use crate::store::BlockStore;
use crate::types::{BlockId, DayRating};

/// Decides whether another block may be created on a day.
pub trait CreationPolicy {
    fn allows_new_block(&self, date: NaiveDate, existing_for_day: &[TimeBlock]) -> bool;
}

/// No limit on blocks per day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl CreationPolicy for Unlimited {
    fn allows_new_block(&self, _date: NaiveDate, _existing_for_day: &[TimeBlock]) -> bool {
        true
    }
}

/// At most this many blocks on any one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxBlocksPerDay(pub usize);

impl CreationPolicy for MaxBlocksPerDay {
    fn allows_new_block(&self, _date: NaiveDate, existing_for_day: &[TimeBlock]) -> bool {
        existing_for_day.len() < self.0
    }
}

impl<P: CreationPolicy + ?Sized> CreationPolicy for Box<P> {
    fn allows_new_block(&self, date: NaiveDate, existing_for_day: &[TimeBlock]) -> bool {
        (**self).allows_new_block(date, existing_for_day)
    }
}

/// Why a planner write was refused.
#[derive(Debug, Error)]
pub enum PlanError<E> {
    #[error("invalid block: {}", describe_issues(.0))]
    Invalid(Vec<ValidationIssue>),

    #[error("block overlaps {} existing block(s)", .conflicts.len())]
    Conflict { conflicts: Vec<TimeBlock> },

    #[error("no more blocks allowed on {date}")]
    PolicyDenied { date: NaiveDate },

    #[error("block not found: {0}")]
    NotFound(BlockId),

    #[error("store error: {0}")]
    Store(#[source] E),
}

fn describe_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    for (i, issue) in issues.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{issue}");
    }
    out
}

/// Runs block writes against a store with a fixed calendar and policy.
#[derive(Debug, Clone)]
pub struct Planner<P = Unlimited> {
    calendar: Calendar,
    policy: P,
}

impl Planner<Unlimited> {
    pub const fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            policy: Unlimited,
        }
    }
}

impl<P: CreationPolicy> Planner<P> {
    pub const fn with_policy(calendar: Calendar, policy: P) -> Self {
        Self { calendar, policy }
    }

    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Validates and stores a new block.
    ///
    /// The initial status is derived from `now`, so a block created while its
    /// interval is running starts out in progress.
    pub fn add_block<S: BlockStore>(
        &self,
        store: &mut S,
        draft: BlockDraft,
        now: DateTime<Utc>,
    ) -> Result<TimeBlock, PlanError<S::Error>> {
        let issues = draft.validate(&self.calendar);
        if !issues.is_empty() {
            warn!(title = %draft.title, issues = issues.len(), "rejected invalid block");
            return Err(PlanError::Invalid(issues));
        }

        let day = self.calendar.day_of(draft.start_time);
        let existing = self.day_blocks(store, day)?;
        let conflicts = owned(find_conflicts(&draft, &existing, None, &self.calendar));
        if !conflicts.is_empty() {
            warn!(title = %draft.title, conflicts = conflicts.len(), "rejected conflicting block");
            return Err(PlanError::Conflict { conflicts });
        }
        if !self.policy.allows_new_block(day, &existing) {
            warn!(%day, existing = existing.len(), "creation policy denied block");
            return Err(PlanError::PolicyDenied { date: day });
        }

        let mut block = TimeBlock::new(draft, now, &self.calendar).map_err(PlanError::Invalid)?;
        let initial = derive_status(&block, now);
        apply_status(&mut block, initial, now);

        let mut day_blocks = existing;
        day_blocks.push(block.clone());
        let progress = self.recount(store, day, &day_blocks)?;
        store
            .save_block_with_progress(&block, &[progress])
            .map_err(PlanError::Store)?;

        info!(id = %block.id, title = %block.title, %day, "added block");
        Ok(block)
    }

    /// Applies a partial edit to a stored block.
    ///
    /// Moving a block to another day counts as creating one there, so the
    /// policy is consulted for the new day. Both days are recomputed.
    pub fn update_block<S: BlockStore>(
        &self,
        store: &mut S,
        id: &BlockId,
        patch: &BlockPatch,
        now: DateTime<Utc>,
    ) -> Result<TimeBlock, PlanError<S::Error>> {
        let mut block = self.require(store, id)?;
        if patch.is_empty() {
            return Ok(block);
        }

        let draft = block.patched(patch);
        let issues = draft.validate(&self.calendar);
        if !issues.is_empty() {
            warn!(%id, issues = issues.len(), "rejected invalid edit");
            return Err(PlanError::Invalid(issues));
        }

        let old_day = block.day(&self.calendar);
        let new_day = self.calendar.day_of(draft.start_time);
        let target: Vec<TimeBlock> = self
            .day_blocks(store, new_day)?
            .into_iter()
            .filter(|b| &b.id != id)
            .collect();

        if patch.changes_schedule() {
            let conflicts = owned(find_conflicts(&draft, &target, Some(id), &self.calendar));
            if !conflicts.is_empty() {
                warn!(%id, conflicts = conflicts.len(), "rejected conflicting edit");
                return Err(PlanError::Conflict { conflicts });
            }
        }
        if new_day != old_day && !self.policy.allows_new_block(new_day, &target) {
            warn!(%id, day = %new_day, "creation policy denied move");
            return Err(PlanError::PolicyDenied { date: new_day });
        }

        block.apply_draft(draft, now);

        let mut touched = Vec::with_capacity(2);
        let mut new_day_blocks = target;
        new_day_blocks.push(block.clone());
        touched.push(self.recount(store, new_day, &new_day_blocks)?);
        if new_day != old_day {
            let remaining: Vec<TimeBlock> = self
                .day_blocks(store, old_day)?
                .into_iter()
                .filter(|b| &b.id != id)
                .collect();
            touched.push(self.recount(store, old_day, &remaining)?);
        }
        store
            .save_block_with_progress(&block, &touched)
            .map_err(PlanError::Store)?;

        info!(%id, day = %new_day, "updated block");
        Ok(block)
    }

    /// Sets a block's status explicitly.
    pub fn set_status<S: BlockStore>(
        &self,
        store: &mut S,
        id: &BlockId,
        status: BlockStatus,
        now: DateTime<Utc>,
    ) -> Result<TimeBlock, PlanError<S::Error>> {
        let mut block = self.require(store, id)?;
        if apply_status(&mut block, status, now) {
            self.save_with_day(store, &block)?;
            info!(%id, %status, "set block status");
        }
        Ok(block)
    }

    /// Returns a non-terminal block to not started.
    ///
    /// Returns the block and whether anything changed.
    pub fn reset_block<S: BlockStore>(
        &self,
        store: &mut S,
        id: &BlockId,
        now: DateTime<Utc>,
    ) -> Result<(TimeBlock, bool), PlanError<S::Error>> {
        let mut block = self.require(store, id)?;
        let changed = reset_status(&mut block, now);
        if changed {
            self.save_with_day(store, &block)?;
            info!(%id, "reset block");
        }
        Ok((block, changed))
    }

    /// Removes a block and recomputes its day.
    pub fn delete_block<S: BlockStore>(
        &self,
        store: &mut S,
        id: &BlockId,
    ) -> Result<TimeBlock, PlanError<S::Error>> {
        let block = self.require(store, id)?;
        let day = block.day(&self.calendar);
        let remaining: Vec<TimeBlock> = self
            .day_blocks(store, day)?
            .into_iter()
            .filter(|b| &b.id != id)
            .collect();
        let progress = self.recount(store, day, &remaining)?;
        store
            .delete_block_with_progress(id, &progress)
            .map_err(PlanError::Store)?;

        info!(%id, %day, "deleted block");
        Ok(block)
    }

    /// Records the user's rating and notes for a day.
    ///
    /// Counters are recomputed from the day's blocks at the same time.
    pub fn rate_day<S: BlockStore>(
        &self,
        store: &mut S,
        date: NaiveDate,
        rating: Option<DayRating>,
        notes: Option<String>,
    ) -> Result<DailyProgress, PlanError<S::Error>> {
        let blocks = self.day_blocks(store, date)?;
        let mut progress = self.recount(store, date, &blocks)?;
        progress.set_rating(rating, notes);
        store.save_progress(&progress).map_err(PlanError::Store)?;

        info!(%date, rating = ?progress.day_rating.map(DayRating::value), "rated day");
        Ok(progress)
    }

    /// Re-derives clock-driven statuses for every block in `range`.
    ///
    /// Changed blocks are saved and the progress of their days recomputed.
    /// Returns the IDs that changed.
    pub fn refresh_statuses<S: BlockStore>(
        &self,
        store: &mut S,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<Vec<BlockId>, PlanError<S::Error>> {
        let mut blocks = store
            .load_blocks(range, &self.calendar)
            .map_err(PlanError::Store)?;
        let changed = refresh_all_for_now(&mut blocks, now);
        if changed.is_empty() {
            return Ok(changed);
        }

        for block in blocks.iter().filter(|b| changed.contains(&b.id)) {
            let day = block.day(&self.calendar);
            let day_blocks: Vec<TimeBlock> = blocks
                .iter()
                .filter(|b| b.day(&self.calendar) == day)
                .cloned()
                .collect();
            let progress = self.recount(store, day, &day_blocks)?;
            store
                .save_block_with_progress(block, &[progress])
                .map_err(PlanError::Store)?;
        }
        debug!(changed = changed.len(), "refreshed block statuses");
        Ok(changed)
    }

    fn require<S: BlockStore>(&self, store: &S, id: &BlockId) -> Result<TimeBlock, PlanError<S::Error>> {
        store
            .load_block(id)
            .map_err(PlanError::Store)?
            .ok_or_else(|| PlanError::NotFound(id.clone()))
    }

    fn day_blocks<S: BlockStore>(
        &self,
        store: &S,
        day: NaiveDate,
    ) -> Result<Vec<TimeBlock>, PlanError<S::Error>> {
        store
            .load_blocks(DateRange::single(day), &self.calendar)
            .map_err(PlanError::Store)
    }

    /// The stored summary for `day` (or a fresh one) recounted from `blocks`.
    fn recount<S: BlockStore>(
        &self,
        store: &S,
        day: NaiveDate,
        blocks: &[TimeBlock],
    ) -> Result<DailyProgress, PlanError<S::Error>> {
        let mut progress = store
            .load_progress(DateRange::single(day))
            .map_err(PlanError::Store)?
            .into_iter()
            .next()
            .unwrap_or_else(|| DailyProgress::empty(day));
        progress.recompute(blocks);
        debug!(%day, total = progress.total_blocks, completed = progress.completed_blocks, "recomputed daily progress");
        Ok(progress)
    }

    /// Saves a block whose schedule did not change, with its day recounted.
    fn save_with_day<S: BlockStore>(
        &self,
        store: &mut S,
        block: &TimeBlock,
    ) -> Result<(), PlanError<S::Error>> {
        let day = block.day(&self.calendar);
        let day_blocks: Vec<TimeBlock> = self
            .day_blocks(store, day)?
            .into_iter()
            .map(|b| if b.id == block.id { block.clone() } else { b })
            .collect();
        let progress = self.recount(store, day, &day_blocks)?;
        store
            .save_block_with_progress(block, &[progress])
            .map_err(PlanError::Store)
    }
}

fn owned(conflicts: Vec<&TimeBlock>) -> Vec<TimeBlock> {
    conflicts.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, m, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn planner() -> Planner {
        Planner::new(Calendar::utc())
    }

    fn progress_for(store: &MemoryStore, d: u32) -> DailyProgress {
        store
            .load_progress(DateRange::single(date(d)))
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    // Well before any of the blocks below.
    fn early() -> DateTime<Utc> {
        at(1, 0, 0)
    }

    #[test]
    fn add_block_saves_and_aggregates() {
        let mut store = MemoryStore::new();
        let block = planner()
            .add_block(
                &mut store,
                BlockDraft::new("Write report", at(10, 9, 0), at(10, 10, 0)).with_category("Work"),
                early(),
            )
            .unwrap();

        assert_eq!(block.status, BlockStatus::NotStarted);
        assert_eq!(store.load_block(&block.id).unwrap(), Some(block));
        assert_eq!(progress_for(&store, 10).total_blocks, 1);
    }

    #[test]
    fn add_block_during_its_interval_starts_in_progress() {
        let mut store = MemoryStore::new();
        let block = planner()
            .add_block(
                &mut store,
                BlockDraft::new("Now", at(10, 9, 0), at(10, 10, 0)),
                at(10, 9, 15),
            )
            .unwrap();
        assert_eq!(block.status, BlockStatus::InProgress);
    }

    #[test]
    fn add_block_reports_every_validation_issue() {
        let mut store = MemoryStore::new();
        let err = planner()
            .add_block(
                &mut store,
                BlockDraft::new("  ", at(10, 10, 0), at(10, 9, 0)),
                early(),
            )
            .unwrap_err();
        let PlanError::Invalid(issues) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(issues.contains(&ValidationIssue::EmptyTitle));
        assert!(issues.contains(&ValidationIssue::EndNotAfterStart));
        assert_eq!(store.block_count(), 0);
    }

    #[test]
    fn add_block_rejects_overlap_but_allows_touching() {
        let p = planner();
        let mut store = MemoryStore::new();
        let first = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();

        let err = p
            .add_block(&mut store, BlockDraft::new("B", at(10, 9, 30), at(10, 10, 30)), early())
            .unwrap_err();
        match err {
            PlanError::Conflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].id, first.id);
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        p.add_block(&mut store, BlockDraft::new("C", at(10, 10, 0), at(10, 11, 0)), early())
            .unwrap();
        assert_eq!(store.block_count(), 2);
    }

    #[test]
    fn policy_limits_blocks_per_day() {
        let p = Planner::with_policy(Calendar::utc(), MaxBlocksPerDay(2));
        let mut store = MemoryStore::new();
        for h in [8, 9] {
            p.add_block(&mut store, BlockDraft::new("x", at(10, h, 0), at(10, h, 30)), early())
                .unwrap();
        }
        let err = p
            .add_block(&mut store, BlockDraft::new("x", at(10, 11, 0), at(10, 11, 30)), early())
            .unwrap_err();
        assert!(matches!(err, PlanError::PolicyDenied { date: d } if d == date(10)));

        // Another day is unaffected.
        p.add_block(&mut store, BlockDraft::new("x", at(11, 11, 0), at(11, 11, 30)), early())
            .unwrap();
    }

    #[test]
    fn boxed_policy_delegates() {
        let policy: Box<dyn CreationPolicy> = Box::new(MaxBlocksPerDay(0));
        assert!(!policy.allows_new_block(date(10), &[]));
        assert!(Unlimited.allows_new_block(date(10), &[]));
    }

    #[test]
    fn update_block_ignores_itself_when_checking_conflicts() {
        let p = planner();
        let mut store = MemoryStore::new();
        let block = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();

        let patch = BlockPatch {
            end_time: Some(at(10, 10, 30)),
            notes: Some(Some("longer".to_string())),
            ..BlockPatch::default()
        };
        let updated = p.update_block(&mut store, &block.id, &patch, at(2, 0, 0)).unwrap();
        assert_eq!(updated.end_time, at(10, 10, 30));
        assert_eq!(updated.notes.as_deref(), Some("longer"));
        assert_eq!(updated.updated_at, at(2, 0, 0));
        assert_eq!(updated.created_at, block.created_at);
    }

    #[test]
    fn update_block_rejects_move_onto_another_block() {
        let p = planner();
        let mut store = MemoryStore::new();
        p.add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();
        let b = p
            .add_block(&mut store, BlockDraft::new("B", at(10, 11, 0), at(10, 12, 0)), early())
            .unwrap();

        let patch = BlockPatch {
            start_time: Some(at(10, 9, 30)),
            ..BlockPatch::default()
        };
        let err = p.update_block(&mut store, &b.id, &patch, early()).unwrap_err();
        assert!(matches!(err, PlanError::Conflict { .. }));
        assert_eq!(store.load_block(&b.id).unwrap().unwrap().start_time, at(10, 11, 0));
    }

    #[test]
    fn moving_a_block_recounts_both_days() {
        let p = planner();
        let mut store = MemoryStore::new();
        let block = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();
        let patch = BlockPatch {
            start_time: Some(at(11, 9, 0)),
            end_time: Some(at(11, 10, 0)),
            ..BlockPatch::default()
        };
        p.update_block(&mut store, &block.id, &patch, early()).unwrap();

        assert_eq!(progress_for(&store, 10).total_blocks, 0);
        assert_eq!(progress_for(&store, 11).total_blocks, 1);
    }

    #[test]
    fn unknown_block_is_not_found() {
        let p = planner();
        let mut store = MemoryStore::new();
        let id = BlockId::new("missing").unwrap();
        assert!(matches!(
            p.set_status(&mut store, &id, BlockStatus::Completed, early()),
            Err(PlanError::NotFound(_))
        ));
        assert!(matches!(p.delete_block(&mut store, &id), Err(PlanError::NotFound(_))));
    }

    #[test]
    fn set_status_updates_progress() {
        let p = planner();
        let mut store = MemoryStore::new();
        let a = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();
        let b = p
            .add_block(&mut store, BlockDraft::new("B", at(10, 10, 0), at(10, 10, 30)), early())
            .unwrap();

        p.set_status(&mut store, &a.id, BlockStatus::Completed, at(10, 10, 0))
            .unwrap();
        p.set_status(&mut store, &b.id, BlockStatus::Skipped, at(10, 10, 30))
            .unwrap();

        let progress = progress_for(&store, 10);
        assert_eq!(progress.total_blocks, 2);
        assert_eq!(progress.completed_blocks, 1);
        assert_eq!(progress.skipped_blocks, 1);
        assert!((progress.completion_percentage() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_leaves_terminal_blocks_alone() {
        let p = planner();
        let mut store = MemoryStore::new();
        let block = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), at(10, 9, 30))
            .unwrap();
        assert_eq!(block.status, BlockStatus::InProgress);

        let (reset, changed) = p.reset_block(&mut store, &block.id, at(10, 9, 45)).unwrap();
        assert!(changed);
        assert_eq!(reset.status, BlockStatus::NotStarted);

        p.set_status(&mut store, &block.id, BlockStatus::Completed, at(10, 10, 0))
            .unwrap();
        let (kept, changed) = p.reset_block(&mut store, &block.id, at(10, 10, 5)).unwrap();
        assert!(!changed);
        assert_eq!(kept.status, BlockStatus::Completed);
    }

    #[test]
    fn delete_block_recounts_day() {
        let p = planner();
        let mut store = MemoryStore::new();
        let block = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();
        let deleted = p.delete_block(&mut store, &block.id).unwrap();
        assert_eq!(deleted.id, block.id);
        assert_eq!(store.block_count(), 0);
        assert_eq!(progress_for(&store, 10).total_blocks, 0);
    }

    #[test]
    fn rating_survives_later_block_changes() {
        let p = planner();
        let mut store = MemoryStore::new();
        p.rate_day(&mut store, date(10), DayRating::new(4).ok(), Some("solid".to_string()))
            .unwrap();
        p.add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();

        let progress = progress_for(&store, 10);
        assert_eq!(progress.total_blocks, 1);
        assert_eq!(progress.day_rating.map(DayRating::value), Some(4));
        assert_eq!(progress.day_notes.as_deref(), Some("solid"));
    }

    #[test]
    fn refresh_statuses_follows_the_clock() {
        let p = planner();
        let mut store = MemoryStore::new();
        let a = p
            .add_block(&mut store, BlockDraft::new("A", at(10, 9, 0), at(10, 10, 0)), early())
            .unwrap();
        let b = p
            .add_block(&mut store, BlockDraft::new("B", at(10, 11, 0), at(10, 12, 0)), early())
            .unwrap();

        let changed = p
            .refresh_statuses(&mut store, DateRange::single(date(10)), at(10, 9, 30))
            .unwrap();
        assert_eq!(changed, vec![a.id.clone()]);
        assert_eq!(
            store.load_block(&a.id).unwrap().unwrap().status,
            BlockStatus::InProgress
        );

        // Past its end, A stays in progress and B never gets auto-skipped.
        let changed = p
            .refresh_statuses(&mut store, DateRange::single(date(10)), at(10, 23, 0))
            .unwrap();
        assert!(changed.is_empty());
        assert_eq!(
            store.load_block(&b.id).unwrap().unwrap().status,
            BlockStatus::NotStarted
        );
    }

    #[test]
    fn plan_error_messages_are_readable() {
        let err: PlanError<std::convert::Infallible> =
            PlanError::Invalid(vec![ValidationIssue::EmptyTitle, ValidationIssue::EndNotAfterStart]);
        assert_eq!(
            err.to_string(),
            format!(
                "invalid block: {}; {}",
                ValidationIssue::EmptyTitle,
                ValidationIssue::EndNotAfterStart
            )
        );
        let err: PlanError<std::convert::Infallible> = PlanError::PolicyDenied { date: date(10) };
        assert_eq!(err.to_string(), "no more blocks allowed on 2025-03-10");
    }
}
