//! Report command for weekly and monthly completion reports.
//!
//! This module implements `tb report` with `--week` (default) and `--month`,
//! in human-readable or JSON form.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Serialize;
use tb_core::analytics::{
    CategoryPerformance, CompletionStatistics, MonthlyReport, TrendDirection, WeeklyReport,
    monthly_report, weekly_report,
};
use tb_core::{BlockStore, Calendar, DailyProgress, DateRange, TimeBlock};
use tb_db::Database;

use super::Session;
use super::util::{explain, format_day, format_minutes, percent, progress_bar, timezone_name};

/// How far back ratings and counters are read for streaks.
const STREAK_HISTORY_DAYS: u32 = 3650;

/// Report period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

/// JSON envelope: the report plus where it was generated.
#[derive(Debug, Serialize)]
struct JsonReport<'a, R> {
    #[serde(rename = "type")]
    period_type: Period,
    timezone: String,
    #[serde(flatten)]
    report: &'a R,
}

/// What a report needs from the store.
struct ReportInput {
    blocks: Vec<TimeBlock>,
    progress: Vec<DailyProgress>,
}

/// Refreshes statuses and loads blocks and progress for `period`.
///
/// Weekly reports also read last week, starting on its Monday, so the trend
/// has something to compare against.
fn load_input(db: &mut Database, session: &Session, period: Period) -> Result<ReportInput> {
    let today = session.today();
    let analytics = &session.config.analytics;
    let range = match period {
        Period::Week => {
            let window = DateRange::trailing(today, analytics.weekly_window_days);
            let last_monday = Calendar::week_start(today) - Duration::days(7);
            DateRange::new(window.start.min(last_monday), today)
        }
        Period::Month => DateRange::trailing(today, analytics.monthly_window_days),
    };

    session
        .planner()
        .refresh_statuses(db, range, session.now)
        .map_err(|err| explain(err, &session.calendar))?;

    let blocks = db
        .load_blocks(range, &session.calendar)
        .context("failed to load blocks")?;
    let progress = db
        .load_progress(DateRange::trailing(today, STREAK_HISTORY_DAYS))
        .context("failed to load daily progress")?;
    tracing::debug!(?period, start = %range.start, days = range.len_days(), blocks = blocks.len(), "loaded report input");
    Ok(ReportInput { blocks, progress })
}

pub fn weekly(db: &mut Database, session: &Session) -> Result<WeeklyReport> {
    let input = load_input(db, session, Period::Week)?;
    Ok(weekly_report(
        &input.blocks,
        &input.progress,
        session.now,
        &session.calendar,
        &session.config.analytics,
    ))
}

pub fn monthly(db: &mut Database, session: &Session) -> Result<MonthlyReport> {
    let input = load_input(db, session, Period::Month)?;
    Ok(monthly_report(
        &input.blocks,
        &input.progress,
        session.now,
        &session.calendar,
        &session.config.analytics,
    ))
}

// ========== Text Output ==========

fn period_title(period: DateRange) -> String {
    format!("{} - {}", period.start.format("%b %-d"), period.end.format("%b %-d, %Y"))
}

fn section<W: Write>(writer: &mut W, title: &str) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{title}")?;
    writeln!(writer, "{}", "─".repeat(title.chars().count()))?;
    Ok(())
}

fn write_summary<W: Write>(
    writer: &mut W,
    stats: &CompletionStatistics,
    current_streak: u32,
    longest_streak: u32,
) -> Result<()> {
    section(writer, "SUMMARY")?;
    writeln!(
        writer,
        "Completed:  {} of {} blocks ({}%)  {}",
        stats.completed_blocks,
        stats.total_blocks,
        percent(stats.completion_rate),
        progress_bar(stats.completion_rate)
    )?;
    writeln!(writer, "Skipped:    {}", stats.skipped_blocks)?;
    writeln!(
        writer,
        "Time done:  {} of {}",
        format_minutes(stats.completed_minutes),
        format_minutes(stats.scheduled_minutes)
    )?;
    let unit = if current_streak == 1 { "day" } else { "days" };
    writeln!(writer, "Streak:     {current_streak} {unit} (longest {longest_streak})")?;
    Ok(())
}

fn write_categories<W: Write>(writer: &mut W, categories: &[CategoryPerformance]) -> Result<()> {
    section(writer, "BY CATEGORY")?;
    for category in categories {
        writeln!(
            writer,
            "{:<16}  {}/{}  {:>3}%  {}",
            category.category,
            category.completed_blocks,
            category.total_blocks,
            percent(category.completion_rate),
            format_minutes(category.completed_minutes)
        )?;
    }
    Ok(())
}

fn write_progress_row<W: Write>(writer: &mut W, day: &DailyProgress) -> Result<()> {
    write!(writer, "{:<16}  ", format_day(day.date))?;
    if day.total_blocks == 0 {
        write!(writer, "(no blocks)")?;
    } else {
        let rate = day.completion_percentage();
        write!(
            writer,
            "{}/{}  {}  {:>3}%",
            day.completed_blocks,
            day.total_blocks,
            progress_bar(rate),
            percent(rate)
        )?;
    }
    if let Some(rating) = day.day_rating {
        write!(writer, "  rated {rating}")?;
    }
    writeln!(writer)?;
    Ok(())
}

const fn direction_word(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Improving => "improving",
        TrendDirection::Declining => "declining",
        TrendDirection::Stable => "stable",
    }
}

/// Formats the human-readable weekly report.
pub fn write_weekly<W: Write>(writer: &mut W, report: &WeeklyReport) -> Result<()> {
    writeln!(writer, "WEEKLY REPORT: {}", period_title(report.period))?;

    if report.statistics.total_blocks == 0 {
        writeln!(writer)?;
        writeln!(writer, "No blocks scheduled this week.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'tb add' to plan a block.")?;
        return Ok(());
    }

    write_summary(writer, &report.statistics, report.current_streak, report.longest_streak)?;

    section(writer, "BY DAY")?;
    for day in &report.daily_breakdown {
        write_progress_row(writer, day)?;
    }
    if let Some(best) = &report.best_day {
        writeln!(
            writer,
            "Best day: {} ({}/{}, {}%)",
            format_day(best.date),
            best.completed_blocks,
            best.total_blocks,
            percent(best.completion_rate)
        )?;
    }

    write_categories(writer, &report.category_performance)?;

    section(writer, "BEST HOURS")?;
    let hours = &report.time_of_day.most_productive_hours;
    if hours.is_empty() {
        writeln!(writer, "(not enough blocks in any one hour yet)")?;
    }
    for hour in hours {
        writeln!(
            writer,
            "{:02}:00  {}/{}  {:>3}%",
            hour.hour,
            hour.completed_blocks,
            hour.total_blocks,
            percent(hour.completion_rate)
        )?;
    }

    section(writer, "TREND")?;
    let trend = &report.trend;
    writeln!(
        writer,
        "This week {}%, last week {}%: {}",
        percent(trend.this_week_rate),
        percent(trend.last_week_rate),
        direction_word(trend.direction)
    )?;
    writeln!(writer, "{}", trend.message)?;
    Ok(())
}

/// Formats the human-readable monthly report.
pub fn write_monthly<W: Write>(writer: &mut W, report: &MonthlyReport) -> Result<()> {
    writeln!(writer, "MONTHLY REPORT: {}", period_title(report.period))?;

    if report.statistics.total_blocks == 0 {
        writeln!(writer)?;
        writeln!(writer, "No blocks scheduled this month.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'tb add' to plan a block.")?;
        return Ok(());
    }

    write_summary(writer, &report.statistics, report.current_streak, report.longest_streak)?;
    writeln!(
        writer,
        "Per day:    {:.1} blocks on {} active days",
        report.statistics.average_blocks_per_day, report.statistics.active_days
    )?;

    section(writer, "WEEKS")?;
    for week in &report.weekly_breakdown {
        writeln!(
            writer,
            "{:<16}  {}/{}  {}  {:>3}%  {}",
            format!("{} - {}", week.period.start.format("%b %-d"), week.period.end.format("%b %-d")),
            week.completed_blocks,
            week.total_blocks,
            progress_bar(week.completion_rate),
            percent(week.completion_rate),
            format_minutes(week.completed_minutes)
        )?;
    }

    write_categories(writer, &report.category_performance)?;

    section(writer, "SUGGESTIONS")?;
    if report.improvement_suggestions.is_empty() {
        writeln!(writer, "(none, keep it up)")?;
    }
    for suggestion in &report.improvement_suggestions {
        writeln!(writer, "[{}] {}", suggestion.severity.as_str(), suggestion.title)?;
        writeln!(writer, "  {}", suggestion.message)?;
    }

    section(writer, "PRODUCTIVE DAYS")?;
    if report.productive_days.is_empty() {
        writeln!(writer, "(none yet)")?;
    }
    for day in &report.productive_days {
        writeln!(
            writer,
            "{:<16}  {}/{}  {:>3}%",
            format_day(day.date),
            day.completed_blocks,
            day.total_blocks,
            percent(day.completion_rate)
        )?;
    }
    Ok(())
}

fn write_json<W: Write, R: Serialize>(writer: &mut W, period: Period, report: &R) -> Result<()> {
    let envelope = JsonReport {
        period_type: period,
        timezone: timezone_name(),
        report,
    };
    writeln!(writer, "{}", serde_json::to_string_pretty(&envelope)?)?;
    Ok(())
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    period: Period,
    json: bool,
) -> Result<()> {
    match period {
        Period::Week => {
            let report = weekly(db, session)?;
            if json {
                write_json(writer, period, &report)
            } else {
                write_weekly(writer, &report)
            }
        }
        Period::Month => {
            let report = monthly(db, session)?;
            if json {
                write_json(writer, period, &report)
            } else {
                write_monthly(writer, &report)
            }
        }
    }
}
