//! Core domain logic for time block planning.
//!
//! This crate contains the fundamental types and logic for:
//! - Blocks: validated scheduled intervals and their lifecycle status
//! - Conflicts and slot suggestions within a calendar day
//! - Daily progress rollups and weekly/monthly analytics
//! - The planner write path over a pluggable [`BlockStore`]
//!
//! Nothing here performs I/O; storage lives behind [`BlockStore`].

pub mod analytics;
mod block;
mod calendar;
mod conflict;
mod planner;
mod progress;
mod slots;
mod status;
pub mod store;
pub mod types;

pub use block::{
    BlockDraft, BlockPatch, BlockStatus, MAX_BLOCK_MINUTES, MAX_CATEGORY_CHARS, MAX_NOTES_CHARS,
    MAX_TITLE_CHARS, Scheduled, Span, TimeBlock, ValidationIssue, validate,
};
pub use calendar::{Calendar, DateRange};
pub use conflict::{ConflictPair, find_all_conflicts, find_conflicts, overlaps};
pub use planner::{CreationPolicy, MaxBlocksPerDay, PlanError, Planner, Unlimited};
pub use progress::{DailyProgress, aggregate, aggregate_days};
pub use slots::{DaySegment, SlotOptions, SlotSuggestion, default_segments, suggest_slots};
pub use status::{apply_status, derive_status, refresh_all_for_now, reset_status};
pub use store::{BlockStore, MemoryStore};
pub use types::{BlockId, DayRating, ValidationError};
