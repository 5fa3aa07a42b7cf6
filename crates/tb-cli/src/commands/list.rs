//! `tb list`: blocks and progress, day by day.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tb_core::{BlockStore, DailyProgress, DateRange, TimeBlock};
use tb_db::Database;

use super::Session;
use super::util::{explain, format_day, format_span, percent, status_marker};

/// One day of `tb list --json`.
#[derive(Debug, Serialize)]
pub struct DayListing {
    pub date: NaiveDate,
    pub progress: DailyProgress,
    pub completion_rate: f64,
    pub blocks: Vec<TimeBlock>,
}

/// Loads `days` days starting at `first`, refreshing clock-driven statuses first.
pub fn listings(db: &mut Database, session: &Session, first: NaiveDate, days: u32) -> Result<Vec<DayListing>> {
    let days = days.max(1);
    let range = DateRange::trailing(first + Duration::days(i64::from(days) - 1), days);

    session
        .planner()
        .refresh_statuses(db, range, session.now)
        .map_err(|err| explain(err, &session.calendar))?;

    let blocks = db
        .load_blocks(range, &session.calendar)
        .context("failed to load blocks")?;
    let mut stored: BTreeMap<NaiveDate, DailyProgress> = db
        .load_progress(range)
        .context("failed to load daily progress")?
        .into_iter()
        .map(|p| (p.date, p))
        .collect();

    let listings = range
        .days()
        .map(|date| {
            let day_blocks: Vec<TimeBlock> = blocks
                .iter()
                .filter(|b| b.day(&session.calendar) == date)
                .cloned()
                .collect();
            let mut progress = stored.remove(&date).unwrap_or_else(|| DailyProgress::empty(date));
            progress.recompute(&day_blocks);
            DayListing {
                date,
                completion_rate: progress.completion_percentage(),
                progress,
                blocks: day_blocks,
            }
        })
        .collect();
    Ok(listings)
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    date: &str,
    days: u32,
    json: bool,
) -> Result<()> {
    let first = session.date(date)?;
    let days = listings(db, session, first, days)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&days)?)?;
        return Ok(());
    }

    for (i, day) in days.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        write_day(writer, day, session)?;
    }
    Ok(())
}

fn write_day<W: Write>(writer: &mut W, day: &DayListing, session: &Session) -> Result<()> {
    let progress = &day.progress;
    write!(writer, "{}", format_day(day.date))?;
    if progress.total_blocks > 0 {
        write!(
            writer,
            "  {}/{} done ({}%)",
            progress.completed_blocks,
            progress.total_blocks,
            percent(day.completion_rate)
        )?;
    }
    if let Some(rating) = progress.day_rating {
        write!(writer, "  rated {rating}")?;
    }
    writeln!(writer)?;

    if day.blocks.is_empty() {
        writeln!(writer, "  (no blocks)")?;
    }
    for block in &day.blocks {
        write!(
            writer,
            "  {} {}  {}",
            status_marker(block.status),
            format_span(block, &session.calendar),
            block.title
        )?;
        if let Some(category) = block.category_name() {
            write!(writer, "  #{category}")?;
        }
        writeln!(writer, "  {}", block.id.short(8))?;
    }
    if let Some(notes) = &progress.day_notes {
        writeln!(writer, "  note: {notes}")?;
    }
    Ok(())
}
