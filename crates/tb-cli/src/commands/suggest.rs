//! `tb suggest`: free slots for a block of a given length.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use serde::Serialize;
use tb_core::{BlockStore, DateRange, SlotSuggestion, suggest_slots};
use tb_db::Database;

use super::Session;
use super::util::{format_clock, format_day};

#[derive(Debug, Serialize)]
struct SuggestOutput<'a> {
    date: chrono::NaiveDate,
    minutes: i64,
    suggestions: &'a [SlotSuggestion],
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    date: &str,
    minutes: i64,
    json: bool,
) -> Result<Vec<SlotSuggestion>> {
    if minutes <= 0 {
        bail!("--minutes must be positive");
    }
    let date = session.date(date)?;
    let existing = db
        .load_blocks(DateRange::single(date), &session.calendar)
        .context("failed to load blocks")?;

    let mut options = session.config.slots.clone();
    if date == session.today() {
        options.not_before = Some(session.now);
    }
    let suggestions = suggest_slots(
        date,
        &existing,
        Duration::minutes(minutes),
        &session.config.segments,
        &options,
        &session.calendar,
    );

    if json {
        let out = SuggestOutput {
            date,
            minutes,
            suggestions: &suggestions,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&out)?)?;
        return Ok(suggestions);
    }

    if suggestions.is_empty() {
        writeln!(writer, "No free {minutes}-minute slots on {}", format_day(date))?;
        return Ok(suggestions);
    }

    writeln!(writer, "Free {minutes}-minute slots on {}:", format_day(date))?;
    for slot in &suggestions {
        write!(
            writer,
            "  {}-{}  {}",
            format_clock(slot.start, &session.calendar),
            format_clock(slot.end, &session.calendar),
            slot.segment
        )?;
        if slot.is_optimal {
            write!(writer, " (optimal)")?;
        }
        writeln!(writer)?;
    }
    Ok(suggestions)
}
