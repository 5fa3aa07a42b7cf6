//! `tb add`: schedule a new block.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::Duration;
use tb_core::{BlockDraft, MAX_BLOCK_MINUTES, TimeBlock};
use tb_db::Database;

use super::Session;
use super::util::{explain, format_day, format_span, parse_clock};
use crate::cli::AddArgs;

/// Builds the draft described by the arguments.
pub fn draft_from_args(session: &Session, args: &AddArgs) -> Result<BlockDraft> {
    let date = session.date(&args.date)?;
    let (hour, minute) = parse_clock(&args.start)?;
    let start = session.calendar.at(date, hour, minute);
    let end = match &args.end {
        Some(end) => {
            let (hour, minute) = parse_clock(end)?;
            session.calendar.at(date, hour, minute)
        }
        None => {
            if args.minutes <= 0 || args.minutes > MAX_BLOCK_MINUTES {
                bail!("--minutes must be between 1 and {MAX_BLOCK_MINUTES}");
            }
            start + Duration::minutes(args.minutes)
        }
    };

    let mut draft = BlockDraft::new(args.title.clone(), start, end);
    if let Some(notes) = &args.notes {
        draft = draft.with_notes(notes.clone());
    }
    if let Some(category) = &args.category {
        draft = draft.with_category(category.clone());
    }
    if let Some(icon) = &args.icon {
        draft = draft.with_icon(icon.clone());
    }
    Ok(draft)
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    args: &AddArgs,
) -> Result<TimeBlock> {
    let draft = draft_from_args(session, args)?;
    let block = session
        .planner()
        .add_block(db, draft, session.now)
        .map_err(|err| explain(err, &session.calendar))?;

    writeln!(
        writer,
        "Added {}  {} {}  {}",
        block.id.short(8),
        format_day(block.day(&session.calendar)),
        format_span(&block, &session.calendar),
        block.title
    )?;
    Ok(block)
}
