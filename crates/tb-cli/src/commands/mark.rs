//! `tb mark` and `tb reset`: explicit status changes.

use std::io::Write;

use anyhow::Result;
use tb_core::{BlockStatus, TimeBlock};
use tb_db::Database;

use super::Session;
use super::util::{explain, format_span, resolve_block};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    id: &str,
    status: BlockStatus,
) -> Result<TimeBlock> {
    let block = resolve_block(db, id)?;
    let previous = block.status;
    let updated = session
        .planner()
        .set_status(db, &block.id, status, session.now)
        .map_err(|err| explain(err, &session.calendar))?;

    if previous == status {
        writeln!(writer, "{} is already {status}", updated.id.short(8))?;
    } else {
        writeln!(
            writer,
            "{}  {}  {}: {previous} -> {status}",
            updated.id.short(8),
            format_span(&updated, &session.calendar),
            updated.title
        )?;
    }
    Ok(updated)
}

pub fn reset<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    id: &str,
) -> Result<TimeBlock> {
    let block = resolve_block(db, id)?;
    let (updated, changed) = session
        .planner()
        .reset_block(db, &block.id, session.now)
        .map_err(|err| explain(err, &session.calendar))?;

    if changed {
        writeln!(writer, "{} reset to {}", updated.id.short(8), updated.status)?;
    } else if updated.status.is_terminal() {
        writeln!(
            writer,
            "{} is {}; use `tb mark {} not-started` to reopen it",
            updated.id.short(8),
            updated.status,
            updated.id.short(8)
        )?;
    } else {
        writeln!(writer, "{} is already {}", updated.id.short(8), updated.status)?;
    }
    Ok(updated)
}
