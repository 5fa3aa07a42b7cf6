//! Shared utilities for CLI commands.

use std::fmt::Write as _;
use std::sync::LazyLock;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Duration, Local, NaiveDate, Offset, Timelike, Utc};
use regex::Regex;
use tb_core::{BlockStatus, Calendar, PlanError, TimeBlock};
use tb_db::Database;

/// Pre-compiled regex for relative day parsing.
static RELATIVE_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s+(day|week)s?\s+ago|in\s+(\d+)\s+(day|week)s?)$")
        .expect("relative day pattern is valid")
});

/// Pre-compiled regex for wall-clock times.
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock pattern is valid"));

/// Conservative bound for relative day parsing (~100 years).
const MAX_RELATIVE_DAYS: i64 = 100 * 366;

/// The calendar for the machine's current UTC offset.
pub fn local_calendar(now: DateTime<Utc>) -> Calendar {
    Calendar::new(now.with_timezone(&Local).offset().fix())
}

/// The IANA name of the local timezone, for report headers.
pub fn timezone_name() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse a day relative to `today`.
///
/// Supports:
/// - Keywords: "today", "yesterday", "tomorrow"
/// - ISO 8601 dates: "2025-03-10"
/// - Relative: "3 days ago", "1 week ago", "in 2 days"
pub fn parse_date(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = input.trim().to_ascii_lowercase();
    match s.as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DAY_RE.captures(&s) else {
        bail!("Invalid date: {input}. Use YYYY-MM-DD, today, yesterday, tomorrow or 'N days ago'");
    };

    let (number, unit, sign) = match (caps.get(1), caps.get(3)) {
        (Some(n), _) => (n.as_str(), &caps[2], -1),
        (None, Some(n)) => (n.as_str(), &caps[4], 1),
        (None, None) => bail!("Invalid date: {input}"),
    };
    let n: i64 = number
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match unit {
        "day" => n,
        "week" => n.saturating_mul(7),
        other => bail!("Unknown date unit: {other}"),
    };
    if days > MAX_RELATIVE_DAYS {
        bail!("Relative date too far away: {input}");
    }
    Ok(today + Duration::days(sign * days))
}

/// Parse an `HH:MM` wall-clock time. `24:00` is accepted as end of day.
pub fn parse_clock(input: &str) -> anyhow::Result<(u32, u32)> {
    let Some(caps) = CLOCK_RE.captures(input.trim()) else {
        bail!("Invalid time: {input}. Use HH:MM, e.g. 09:30");
    };
    let hour: u32 = caps[1].parse().context("failed to parse hour")?;
    let minute: u32 = caps[2].parse().context("failed to parse minute")?;
    if minute >= 60 || hour > 24 || (hour == 24 && minute != 0) {
        bail!("Invalid time: {input}. Hours run 00-23 (or 24:00), minutes 00-59");
    }
    Ok((hour, minute))
}

/// Local `HH:MM` of an instant.
pub fn format_clock(instant: DateTime<Utc>, calendar: &Calendar) -> String {
    instant.with_timezone(&calendar.offset()).format("%H:%M").to_string()
}

/// Local hour and minute of an instant.
pub fn clock_of(instant: DateTime<Utc>, calendar: &Calendar) -> (u32, u32) {
    let local = instant.with_timezone(&calendar.offset());
    (local.hour(), local.minute())
}

/// `HH:MM-HH:MM` for a block, showing an end at midnight as `24:00`.
pub fn format_span(block: &TimeBlock, calendar: &Calendar) -> String {
    let end = if block.end_time == calendar.day_end(block.day(calendar)) {
        "24:00".to_string()
    } else {
        format_clock(block.end_time, calendar)
    };
    format!("{}-{end}", format_clock(block.start_time, calendar))
}

/// Formats minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

/// Rounds a rate in \[0, 1\] to a whole percentage.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "rate is clamped to [0, 1] first"
)]
pub fn percent(rate: f64) -> u32 {
    (rate.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Generates a 10-character progress bar for a rate in \[0, 1\].
/// Any non-zero rate gets at least one block for visibility.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "rate is clamped to [0, 1] first"
)]
pub fn progress_bar(rate: f64) -> String {
    let rate = rate.clamp(0.0, 1.0);
    let filled = if rate > 0.0 && rate < 0.05 {
        1
    } else {
        (rate * 10.0).round() as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Short status marker used in listings.
pub const fn status_marker(status: BlockStatus) -> &'static str {
    match status {
        BlockStatus::NotStarted => "[ ]",
        BlockStatus::InProgress => "[>]",
        BlockStatus::Completed => "[x]",
        BlockStatus::Skipped => "[-]",
    }
}

/// "Mon, Mar 10 2025"
pub fn format_day(date: NaiveDate) -> String {
    date.format("%a, %b %-d %Y").to_string()
}

/// Finds the single block whose ID starts with `prefix`.
pub fn resolve_block(db: &Database, prefix: &str) -> anyhow::Result<TimeBlock> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("Block ID cannot be empty");
    }
    let mut matches = db
        .find_blocks_by_prefix(prefix)
        .context("failed to look up block")?;
    match matches.len() {
        0 => bail!("No block matches '{prefix}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{prefix}' matches {n} blocks; use more of the ID"),
    }
}

/// Turns a planner refusal into a message worth showing a person.
pub fn explain<E>(err: PlanError<E>, calendar: &Calendar) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err {
        PlanError::Conflict { conflicts } => {
            let mut message = String::from("Block overlaps existing blocks:");
            for block in &conflicts {
                let _ = write!(
                    message,
                    "\n  {}  {}  {}",
                    block.id.short(8),
                    format_span(block, calendar),
                    block.title
                );
            }
            anyhow!(message)
        }
        PlanError::Invalid(issues) => {
            let mut message = String::from("Invalid block:");
            for issue in &issues {
                let _ = write!(message, "\n  - {issue}");
            }
            anyhow!(message)
        }
        other => anyhow::Error::new(other),
    }
}
