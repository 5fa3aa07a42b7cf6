//! Overlap detection between time blocks.
//!
//! Intervals are half-open: a block ending at 10:00 does not conflict with one
//! starting at 10:00. The test `a.start < b.end && b.start < a.end` covers
//! partial overlap on either edge and containment in either direction; a
//! "starts during" check alone would miss a block that fully contains another.

use chrono::NaiveDate;
use serde::Serialize;

use crate::block::{Scheduled, TimeBlock};
use crate::calendar::Calendar;
use crate::types::BlockId;

/// Whether two intervals intersect.
pub fn overlaps<A, B>(a: &A, b: &B) -> bool
where
    A: Scheduled + ?Sized,
    B: Scheduled + ?Sized,
{
    a.start() < b.end() && b.start() < a.end()
}

/// Finds the existing blocks a candidate would conflict with.
///
/// Only blocks on the candidate's calendar day are considered. The block
/// matching `excluding` (or the candidate's own ID, when it is a stored block)
/// is skipped so an edit is not reported as conflicting with itself. Results
/// are ordered by start time.
///
/// A non-empty result means the write must not go ahead as-is; it is returned
/// as data so the caller can prompt the user or pick another slot.
pub fn find_conflicts<'a, C>(
    candidate: &C,
    existing: &'a [TimeBlock],
    excluding: Option<&BlockId>,
    calendar: &Calendar,
) -> Vec<&'a TimeBlock>
where
    C: Scheduled + ?Sized,
{
    let day = calendar.day_of(candidate.start());
    let own_id = candidate.block_id();

    let mut conflicts: Vec<&TimeBlock> = existing
        .iter()
        .filter(|b| excluding != Some(&b.id) && own_id != Some(&b.id))
        .filter(|b| b.day(calendar) == day)
        .filter(|b| overlaps(candidate, *b))
        .collect();
    conflicts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    conflicts
}

/// Two stored blocks that overlap each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictPair {
    pub day: NaiveDate,
    /// The block that starts first.
    pub first: BlockId,
    pub second: BlockId,
}

/// Scans a set of blocks for every overlapping pair.
///
/// Blocks are sorted by day and start, then swept: each block is compared
/// with the following blocks of the same day until one starts at or after its
/// end.
pub fn find_all_conflicts(blocks: &[TimeBlock], calendar: &Calendar) -> Vec<ConflictPair> {
    let mut sorted: Vec<(NaiveDate, &TimeBlock)> =
        blocks.iter().map(|b| (b.day(calendar), b)).collect();
    sorted.sort_by(|(day_a, a), (day_b, b)| {
        day_a
            .cmp(day_b)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut pairs = Vec::new();
    for (i, (day, current)) in sorted.iter().enumerate() {
        for (other_day, other) in &sorted[i + 1..] {
            if other_day != day || other.start_time >= current.end_time {
                break;
            }
            if overlaps(*current, *other) {
                pairs.push(ConflictPair {
                    day: *day,
                    first: current.id.clone(),
                    second: other.id.clone(),
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDraft, Span};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, m, 0).unwrap()
    }

    fn span(h1: u32, m1: u32, h2: u32, m2: u32) -> Span {
        Span::new(at(10, h1, m1), at(10, h2, m2))
    }

    fn block(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> TimeBlock {
        TimeBlock::new(BlockDraft::new(title, start, end), at(1, 0, 0), &Calendar::utc()).unwrap()
    }

    #[test]
    fn overlap_cases_are_symmetric() {
        let base = span(9, 0, 10, 0);
        let cases = [
            (span(9, 30, 10, 30), true),  // overlaps end edge
            (span(8, 30, 9, 30), true),   // overlaps start edge
            (span(9, 15, 9, 45), true),   // contained
            (span(8, 0, 11, 0), true),    // contains
            (span(9, 0, 10, 0), true),    // identical
            (span(10, 0, 11, 0), false),  // touches end
            (span(8, 0, 9, 0), false),    // touches start
            (span(11, 0, 12, 0), false),  // disjoint
        ];
        for (other, expected) in cases {
            assert_eq!(overlaps(&base, &other), expected, "{other:?}");
            assert_eq!(overlaps(&other, &base), expected, "{other:?} reversed");
        }
    }

    #[test]
    fn find_conflicts_returns_every_overlapping_block() {
        let existing = vec![
            block("later", at(10, 11, 0), at(10, 12, 0)),
            block("inside", at(10, 9, 15), at(10, 9, 45)),
            block("before", at(10, 7, 0), at(10, 8, 0)),
            block("edge", at(10, 8, 30), at(10, 9, 5)),
        ];
        let candidate = BlockDraft::new("new", at(10, 9, 0), at(10, 10, 0));
        let conflicts = find_conflicts(&candidate, &existing, None, &Calendar::utc());
        let titles: Vec<&str> = conflicts.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["edge", "inside"]);
    }

    #[test]
    fn blocks_on_other_days_never_conflict() {
        let existing = vec![block("yesterday", at(9, 9, 0), at(9, 10, 0))];
        let candidate = span(9, 0, 10, 0);
        assert!(find_conflicts(&candidate, &existing, None, &Calendar::utc()).is_empty());
    }

    #[test]
    fn day_is_taken_from_calendar() {
        // In UTC+3, 22:00 UTC on the 9th is 01:00 on the 10th.
        let cal = Calendar::from_offset_seconds(3 * 3600).unwrap();
        let existing = vec![block("late", at(9, 22, 0), at(9, 23, 0))];
        let candidate = Span::new(at(9, 22, 30), at(9, 23, 30));
        assert_eq!(find_conflicts(&candidate, &existing, None, &cal).len(), 1);
    }

    #[test]
    fn excluding_id_supports_edit_in_place() {
        let existing = vec![block("a", at(10, 9, 0), at(10, 10, 0))];
        let moved = Span::new(at(10, 9, 30), at(10, 10, 30));
        let cal = Calendar::utc();
        assert_eq!(find_conflicts(&moved, &existing, None, &cal).len(), 1);
        assert!(find_conflicts(&moved, &existing, Some(&existing[0].id), &cal).is_empty());

        // A stored block is never reported against itself.
        assert!(find_conflicts(&existing[0], &existing, None, &cal).is_empty());
    }

    #[test]
    fn batch_scan_finds_all_pairs() {
        let blocks = vec![
            block("a", at(10, 9, 0), at(10, 12, 0)),
            block("b", at(10, 10, 0), at(10, 10, 30)),
            block("c", at(10, 11, 0), at(10, 13, 0)),
            block("d", at(10, 13, 0), at(10, 14, 0)),
            block("e", at(11, 9, 0), at(11, 10, 0)),
        ];
        let pairs = find_all_conflicts(&blocks, &Calendar::utc());
        let named: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| {
                let name = |id: &BlockId| {
                    blocks
                        .iter()
                        .find(|b| &b.id == id)
                        .map(|b| b.title.as_str())
                        .unwrap()
                };
                (name(&p.first), name(&p.second))
            })
            .collect();
        assert_eq!(named, vec![("a", "b"), ("a", "c")]);
    }

    #[test]
    fn batch_scan_of_clean_day_is_empty() {
        let blocks = vec![
            block("a", at(10, 9, 0), at(10, 10, 0)),
            block("b", at(10, 10, 0), at(10, 11, 0)),
        ];
        assert!(find_all_conflicts(&blocks, &Calendar::utc()).is_empty());
        assert!(find_all_conflicts(&[], &Calendar::utc()).is_empty());
    }

    /// A `(start minute, length)` pair that stays inside one day.
    fn same_day_interval() -> impl Strategy<Value = (i64, i64)> {
        (0i64..1439).prop_flat_map(|start| (Just(start), 1i64..=(1440 - start)))
    }

    fn minute_span(day: u32, start: i64, len: i64) -> Span {
        let start = at(day, 0, 0) + Duration::minutes(start);
        Span::new(start, start + Duration::minutes(len))
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric_for_same_day_pairs(
            (a_start, a_len) in same_day_interval(),
            (b_start, b_len) in same_day_interval()
        ) {
            let a = minute_span(10, a_start, a_len);
            let b = minute_span(10, b_start, b_len);
            let expected = a_start < b_start + b_len && b_start < a_start + a_len;
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
            prop_assert_eq!(overlaps(&a, &b), expected);
        }

        #[test]
        fn random_blocks_on_the_previous_day_never_conflict(
            (start, len) in same_day_interval(),
            existing in prop::collection::vec(same_day_interval(), 0..8)
        ) {
            let blocks: Vec<TimeBlock> = existing
                .iter()
                .map(|&(s, l)| {
                    let span = minute_span(10, s, l);
                    block("existing", span.start, span.end)
                })
                .collect();
            let candidate = minute_span(11, start, len);
            prop_assert!(find_conflicts(&candidate, &blocks, None, &Calendar::utc()).is_empty());
        }
    }
}
