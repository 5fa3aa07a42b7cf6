//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tb_core::BlockStatus;

/// Time block planner.
///
/// Plans the day as a set of non-overlapping time blocks, tracks what got
/// done, and reports on completion over the week or month.
#[derive(Debug, Parser)]
#[command(name = "tb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Schedule a new block.
    Add(AddArgs),

    /// Change an existing block's title, time or details.
    Edit(EditArgs),

    /// Set a block's status.
    Mark {
        /// Block ID or unique prefix.
        id: String,

        /// New status.
        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Return a block that is not yet completed or skipped to not started.
    Reset {
        /// Block ID or unique prefix.
        id: String,
    },

    /// Delete a block.
    Delete {
        /// Block ID or unique prefix.
        id: String,
    },

    /// List blocks day by day.
    List {
        /// First day to list: today, yesterday, tomorrow, YYYY-MM-DD or "N days ago".
        #[arg(long, default_value = "today")]
        date: String,

        /// Number of days to list.
        #[arg(long, default_value_t = 1)]
        days: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Suggest open slots for a block of a given length.
    Suggest {
        /// Day to look at.
        #[arg(long, default_value = "today")]
        date: String,

        /// Block length in minutes.
        #[arg(long, default_value_t = 60)]
        minutes: i64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Find overlapping blocks already in the store.
    Conflicts {
        /// Last day to scan.
        #[arg(long, default_value = "today")]
        date: String,

        /// Number of days to scan, ending at --date.
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rate a day from 1 to 5.
    Rate {
        /// Rating, 1 (worst) to 5 (best).
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Day to rate.
        #[arg(long, default_value = "today")]
        date: String,

        /// Notes about the day.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a completion report.
    Report {
        /// Report on the last 7 days (default).
        #[arg(long, conflicts_with = "month")]
        week: bool,

        /// Report on the last 30 days.
        #[arg(long)]
        month: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for `tb add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// What the block is for.
    pub title: String,

    /// Day of the block.
    #[arg(long, default_value = "today")]
    pub date: String,

    /// Start time, HH:MM.
    #[arg(long)]
    pub start: String,

    /// End time, HH:MM (24:00 for midnight).
    #[arg(long, conflicts_with = "minutes")]
    pub end: Option<String>,

    /// Length in minutes, when no end time is given.
    #[arg(long, default_value_t = 60)]
    pub minutes: i64,

    /// Free-form notes.
    #[arg(long)]
    pub notes: Option<String>,

    /// Category used for grouping in reports.
    #[arg(long)]
    pub category: Option<String>,

    /// Icon token shown by front ends.
    #[arg(long)]
    pub icon: Option<String>,
}

/// Arguments for `tb edit`.
///
/// Passing an empty string for notes, category or icon clears it.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Block ID or unique prefix.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// Move the block to another day, keeping its clock times.
    #[arg(long)]
    pub date: Option<String>,

    /// New start time, HH:MM.
    #[arg(long)]
    pub start: Option<String>,

    /// New end time, HH:MM.
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub icon: Option<String>,
}

/// Block status as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

impl From<StatusArg> for BlockStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::NotStarted => Self::NotStarted,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Completed => Self::Completed,
            StatusArg::Skipped => Self::Skipped,
        }
    }
}
