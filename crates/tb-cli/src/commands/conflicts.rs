//! `tb conflicts`: overlapping blocks already in the store.
//!
//! The planner refuses overlaps, so this only finds rows written by other
//! tools or by older versions.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, Result};
use tb_core::{BlockId, BlockStore, ConflictPair, DateRange, TimeBlock, find_all_conflicts};
use tb_db::Database;

use super::Session;
use super::util::{format_day, format_span};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    date: &str,
    days: u32,
    json: bool,
) -> Result<Vec<ConflictPair>> {
    let last = session.date(date)?;
    let range = DateRange::trailing(last, days);
    let blocks = db
        .load_blocks(range, &session.calendar)
        .context("failed to load blocks")?;
    let pairs = find_all_conflicts(&blocks, &session.calendar);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&pairs)?)?;
        return Ok(pairs);
    }

    if pairs.is_empty() {
        writeln!(
            writer,
            "No overlapping blocks between {} and {}",
            format_day(range.start),
            format_day(range.end)
        )?;
        return Ok(pairs);
    }

    let by_id: HashMap<&str, &TimeBlock> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();
    let describe = |id: &BlockId| match by_id.get(id.as_str()) {
        Some(block) => format!(
            "{}  {}  {}",
            id.short(8),
            format_span(block, &session.calendar),
            block.title
        ),
        None => id.short(8).to_string(),
    };

    writeln!(writer, "{} overlapping pair(s):", pairs.len())?;
    for pair in &pairs {
        writeln!(writer, "{}", format_day(pair.day))?;
        writeln!(writer, "  {}", describe(&pair.first))?;
        writeln!(writer, "  {}", describe(&pair.second))?;
    }
    Ok(pairs)
}
