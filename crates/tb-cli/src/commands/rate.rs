//! `tb rate`: the user's 1-5 rating of a day.

use std::io::Write;

use anyhow::Result;
use tb_core::{DailyProgress, DayRating};
use tb_db::Database;

use super::Session;
use super::util::{explain, format_day};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    rating: u8,
    date: &str,
    notes: Option<String>,
) -> Result<DailyProgress> {
    let date = session.date(date)?;
    let rating = DayRating::new(rating)?;
    let progress = session
        .planner()
        .rate_day(db, date, Some(rating), notes)
        .map_err(|err| explain(err, &session.calendar))?;

    writeln!(
        writer,
        "Rated {} {rating} ({}/{} blocks done)",
        format_day(date),
        progress.completed_blocks,
        progress.total_blocks
    )?;
    Ok(progress)
}
