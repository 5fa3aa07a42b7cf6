//! CLI subcommand implementations.

pub mod add;
pub mod conflicts;
pub mod delete;
pub mod edit;
pub mod list;
pub mod mark;
pub mod rate;
pub mod report;
pub mod suggest;
pub mod util;

use chrono::{DateTime, NaiveDate, Utc};
use tb_core::{Calendar, CreationPolicy, Planner};

use crate::Config;

/// What every command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub calendar: Calendar,
    pub now: DateTime<Utc>,
}

impl Session {
    /// A session in the machine's local timezone.
    pub fn new(config: Config, now: DateTime<Utc>) -> Self {
        Self::with_calendar(config, util::local_calendar(now), now)
    }

    pub const fn with_calendar(config: Config, calendar: Calendar, now: DateTime<Utc>) -> Self {
        Self {
            config,
            calendar,
            now,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(self.now)
    }

    /// Parses a date argument relative to today.
    pub fn date(&self, input: &str) -> anyhow::Result<NaiveDate> {
        util::parse_date(input, self.today())
    }

    pub fn planner(&self) -> Planner<Box<dyn CreationPolicy>> {
        self.config.planner(self.calendar)
    }
}
