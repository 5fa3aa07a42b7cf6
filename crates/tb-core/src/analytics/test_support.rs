//! Fixtures shared by the analytics tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::block::{BlockDraft, BlockStatus, TimeBlock};
use crate::calendar::Calendar;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    Calendar::utc().at(date, h, m)
}

pub fn block(
    date: NaiveDate,
    hour: u32,
    minutes: i64,
    category: Option<&str>,
    status: BlockStatus,
) -> TimeBlock {
    let start = at(date, hour, 0);
    let mut draft = BlockDraft::new("task", start, start + Duration::minutes(minutes));
    if let Some(category) = category {
        draft = draft.with_category(category);
    }
    let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut block = TimeBlock::new(draft, created, &Calendar::utc()).unwrap();
    block.status = status;
    block
}

/// `completed` completed blocks and `open` not-started blocks on `date`,
/// one per hour from 08:00.
pub fn day_of_blocks(date: NaiveDate, completed: u32, open: u32) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    for i in 0..completed + open {
        let status = if i < completed {
            BlockStatus::Completed
        } else {
            BlockStatus::NotStarted
        };
        blocks.push(block(date, 8 + i, 30, None, status));
    }
    blocks
}
