//! Status transitions for time blocks.
//!
//! Status is partly derived from the wall clock: a block whose interval
//! contains "now" is in progress. Terminal outcomes (completed, skipped) are
//! only ever set by the user and are never overwritten by the clock. Nothing
//! here runs on a timer; callers decide when to refresh.

use chrono::{DateTime, Utc};

use crate::block::{BlockStatus, TimeBlock};
use crate::types::BlockId;

/// Computes the status a block should have at `now`.
///
/// - Terminal statuses are returned unchanged.
/// - `now < start` gives `NotStarted`.
/// - `start <= now < end` gives `InProgress`.
/// - `now >= end` leaves the current status as-is. An expired block that was
///   never started stays `NotStarted`; it is not auto-skipped.
pub fn derive_status(block: &TimeBlock, now: DateTime<Utc>) -> BlockStatus {
    if block.status.is_terminal() || now >= block.end_time {
        return block.status;
    }
    if now >= block.start_time {
        BlockStatus::InProgress
    } else {
        BlockStatus::NotStarted
    }
}

/// Sets a block's status, refreshing `updated_at` if it changed.
///
/// This is the only function that writes `status`. Explicit transitions from
/// the caller are authoritative, so any target status is accepted.
/// Returns whether the status changed.
pub fn apply_status(block: &mut TimeBlock, status: BlockStatus, now: DateTime<Utc>) -> bool {
    if block.status == status {
        return false;
    }
    tracing::debug!(
        block = %block.id,
        from = %block.status,
        to = %status,
        "block status changed"
    );
    block.status = status;
    block.updated_at = now;
    true
}

/// Returns a non-terminal block to `NotStarted`.
///
/// Terminal blocks are left alone; un-completing a block is an explicit
/// [`apply_status`] call. Returns whether the status changed.
pub fn reset_status(block: &mut TimeBlock, now: DateTime<Utc>) -> bool {
    if block.status.is_terminal() {
        return false;
    }
    apply_status(block, BlockStatus::NotStarted, now)
}

/// Re-derives the status of every non-terminal block at `now`.
///
/// Returns the IDs of blocks whose status changed, so the caller knows which
/// days need their progress recomputed.
pub fn refresh_all_for_now(blocks: &mut [TimeBlock], now: DateTime<Utc>) -> Vec<BlockId> {
    let mut changed = Vec::new();
    for block in blocks.iter_mut().filter(|b| !b.status.is_terminal()) {
        let derived = derive_status(block, now);
        if apply_status(block, derived, now) {
            changed.push(block.id.clone());
        }
    }
    changed
}
