//! Consecutive-day streaks of completed work.

use chrono::NaiveDate;

use crate::progress::DailyProgress;

/// Days in a row, ending at or just before `today`, with some completion.
///
/// Walks progress backward from `today`. A day counts if its completion is
/// above zero and it is at most one day before the previously counted day
/// (today itself is the first anchor, so a streak may end yesterday if today
/// has no entry yet). The walk stops at the first gap or zero-completion day.
/// Entries after `today` are ignored.
pub fn current_streak(progress: &[DailyProgress], today: NaiveDate) -> u32 {
    let mut days: Vec<&DailyProgress> = progress.iter().filter(|p| p.date <= today).collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));

    let mut anchor = today;
    let mut streak = 0;
    for day in days {
        let gap = (anchor - day.date).num_days();
        if gap > 1 || day.completion_percentage() <= 0.0 {
            break;
        }
        streak += 1;
        anchor = day.date;
    }
    streak
}

/// The longest run of consecutive days with completion above zero.
pub fn longest_streak(progress: &[DailyProgress]) -> u32 {
    let mut days: Vec<&DailyProgress> = progress.iter().collect();
    days.sort_by_key(|p| p.date);

    let mut longest = 0;
    let mut running = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        if day.completion_percentage() <= 0.0 {
            running = 0;
            previous = None;
            continue;
        }
        running = match previous {
            Some(prev) if (day.date - prev).num_days() == 1 => running + 1,
            _ => 1,
        };
        previous = Some(day.date);
        longest = longest.max(running);
    }
    longest
}
