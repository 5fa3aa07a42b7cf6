//! `tb edit`: change an existing block.

use std::io::Write;

use anyhow::Result;
use tb_core::{BlockPatch, TimeBlock};
use tb_db::Database;

use super::Session;
use super::util::{clock_of, explain, format_day, format_span, parse_clock, resolve_block};
use crate::cli::EditArgs;

/// Empty strings clear an optional field.
fn optional(value: Option<&String>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Translates the arguments into a patch against `block`.
///
/// Clock times that are not given keep the block's current ones, so
/// `--date` alone moves the block to the same time on another day.
pub fn patch_from_args(session: &Session, block: &TimeBlock, args: &EditArgs) -> Result<BlockPatch> {
    let calendar = &session.calendar;
    let current_day = block.day(calendar);
    let date = match &args.date {
        Some(date) => session.date(date)?,
        None => current_day,
    };
    let moved = date != current_day;

    let start_time = match (&args.start, moved) {
        (Some(start), _) => {
            let (hour, minute) = parse_clock(start)?;
            Some(calendar.at(date, hour, minute))
        }
        (None, true) => {
            let (hour, minute) = clock_of(block.start_time, calendar);
            Some(calendar.at(date, hour, minute))
        }
        (None, false) => None,
    };
    let end_time = match (&args.end, moved) {
        (Some(end), _) => {
            let (hour, minute) = parse_clock(end)?;
            Some(calendar.at(date, hour, minute))
        }
        (None, true) => Some(start_time.unwrap_or(block.start_time) + block.duration()),
        (None, false) => None,
    };

    Ok(BlockPatch {
        title: args.title.clone(),
        start_time,
        end_time,
        notes: optional(args.notes.as_ref()),
        category: optional(args.category.as_ref()),
        icon: optional(args.icon.as_ref()),
    })
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    args: &EditArgs,
) -> Result<TimeBlock> {
    let block = resolve_block(db, &args.id)?;
    let patch = patch_from_args(session, &block, args)?;
    if patch.is_empty() {
        writeln!(writer, "Nothing to change for {}", block.id.short(8))?;
        return Ok(block);
    }

    let updated = session
        .planner()
        .update_block(db, &block.id, &patch, session.now)
        .map_err(|err| explain(err, &session.calendar))?;
    writeln!(
        writer,
        "Updated {}  {} {}  {}",
        updated.id.short(8),
        format_day(updated.day(&session.calendar)),
        format_span(&updated, &session.calendar),
        updated.title
    )?;
    Ok(updated)
}
