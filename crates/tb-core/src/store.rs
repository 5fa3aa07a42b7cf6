//! Persistence port for blocks and daily progress.
//!
//! The core never owns storage. Callers hand the planner anything that
//! implements [`BlockStore`]; `tb-db` provides the SQLite implementation and
//! [`MemoryStore`] keeps everything in maps.

use std::collections::BTreeMap;
use std::convert::Infallible;

use chrono::NaiveDate;

use crate::block::TimeBlock;
use crate::calendar::{Calendar, DateRange};
use crate::progress::DailyProgress;
use crate::types::BlockId;

/// Storage for time blocks and their per-day summaries.
pub trait BlockStore {
    type Error: std::error::Error + 'static;

    /// Blocks whose start falls on a day of `range`, ordered by start.
    fn load_blocks(
        &self,
        range: DateRange,
        calendar: &Calendar,
    ) -> Result<Vec<TimeBlock>, Self::Error>;

    fn load_block(&self, id: &BlockId) -> Result<Option<TimeBlock>, Self::Error>;

    /// Stored summaries for days of `range`, ordered by date.
    fn load_progress(&self, range: DateRange) -> Result<Vec<DailyProgress>, Self::Error>;

    /// Inserts or replaces a block by ID.
    fn save_block(&mut self, block: &TimeBlock) -> Result<(), Self::Error>;

    /// Removes a block. Returns whether it existed.
    fn delete_block(&mut self, id: &BlockId) -> Result<bool, Self::Error>;

    /// Inserts or replaces the summary for `progress.date`.
    fn save_progress(&mut self, progress: &DailyProgress) -> Result<(), Self::Error>;

    /// Saves a block together with the recomputed summaries of the days it
    /// touches.
    ///
    /// Stores that support transactions override this so both land or
    /// neither does.
    fn save_block_with_progress(
        &mut self,
        block: &TimeBlock,
        progress: &[DailyProgress],
    ) -> Result<(), Self::Error> {
        self.save_block(block)?;
        for day in progress {
            self.save_progress(day)?;
        }
        Ok(())
    }

    /// Deletes a block and saves the recomputed summary of its day.
    fn delete_block_with_progress(
        &mut self,
        id: &BlockId,
        progress: &DailyProgress,
    ) -> Result<bool, Self::Error> {
        let existed = self.delete_block(id)?;
        self.save_progress(progress)?;
        Ok(existed)
    }
}

/// A [`BlockStore`] backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: BTreeMap<BlockId, TimeBlock>,
    progress: BTreeMap<NaiveDate, DailyProgress>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl BlockStore for MemoryStore {
    type Error = Infallible;

    fn load_blocks(&self, range: DateRange, calendar: &Calendar) -> Result<Vec<TimeBlock>, Infallible> {
        let mut blocks: Vec<TimeBlock> = self
            .blocks
            .values()
            .filter(|b| range.contains(b.day(calendar)))
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(blocks)
    }

    fn load_block(&self, id: &BlockId) -> Result<Option<TimeBlock>, Infallible> {
        Ok(self.blocks.get(id).cloned())
    }

    fn load_progress(&self, range: DateRange) -> Result<Vec<DailyProgress>, Infallible> {
        Ok(self
            .progress
            .range(range.start..=range.end)
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn save_block(&mut self, block: &TimeBlock) -> Result<(), Infallible> {
        self.blocks.insert(block.id.clone(), block.clone());
        Ok(())
    }

    fn delete_block(&mut self, id: &BlockId) -> Result<bool, Infallible> {
        Ok(self.blocks.remove(id).is_some())
    }

    fn save_progress(&mut self, progress: &DailyProgress) -> Result<(), Infallible> {
        self.progress.insert(progress.date, progress.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockDraft;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, 0, 0).unwrap()
    }

    fn block(day: u32, h: u32) -> TimeBlock {
        TimeBlock::new(
            BlockDraft::new("task", at(day, h), at(day, h) + Duration::hours(1)),
            at(1, 0),
            &Calendar::utc(),
        )
        .unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn load_blocks_filters_by_day_and_sorts() {
        let mut store = MemoryStore::new();
        let late = block(10, 15);
        let early = block(10, 9);
        let other_day = block(11, 9);
        for b in [&late, &early, &other_day] {
            store.save_block(b).unwrap();
        }

        let loaded = store
            .load_blocks(DateRange::single(date(10)), &Calendar::utc())
            .unwrap();
        let ids: Vec<&BlockId> = loaded.iter().map(|b| &b.id).collect();
        assert_eq!(ids, vec![&early.id, &late.id]);
    }

    #[test]
    fn load_blocks_uses_calendar_days() {
        let mut store = MemoryStore::new();
        // 23:00 UTC on the 10th is the 11th at UTC+2.
        store.save_block(&block(10, 23)).unwrap();
        let plus_two = Calendar::from_offset_seconds(2 * 3600).unwrap();
        assert!(store
            .load_blocks(DateRange::single(date(10)), &plus_two)
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .load_blocks(DateRange::single(date(11)), &plus_two)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn save_replaces_and_delete_reports_existence() {
        let mut store = MemoryStore::new();
        let mut b = block(10, 9);
        store.save_block(&b).unwrap();
        b.title = "renamed".to_string();
        store.save_block(&b).unwrap();
        assert_eq!(store.block_count(), 1);
        assert_eq!(store.load_block(&b.id).unwrap().unwrap().title, "renamed");

        assert!(store.delete_block(&b.id).unwrap());
        assert!(!store.delete_block(&b.id).unwrap());
        assert!(store.load_block(&b.id).unwrap().is_none());
    }

    #[test]
    fn progress_is_keyed_by_date() {
        let mut store = MemoryStore::new();
        store.save_progress(&DailyProgress::empty(date(9))).unwrap();
        let mut tenth = DailyProgress::empty(date(10));
        store.save_progress(&tenth).unwrap();
        tenth.total_blocks = 3;
        store.save_progress(&tenth).unwrap();

        let loaded = store
            .load_progress(DateRange::new(date(10), date(12)))
            .unwrap();
        assert_eq!(loaded, vec![tenth]);
    }
}
