//! Time block planner CLI library.
//!
//! This crate provides the `tb` command-line interface on top of the
//! planner in `tb-core` and the SQLite store in `tb-db`.

mod cli;
pub mod commands;
mod config;

pub use cli::{AddArgs, Cli, Commands, EditArgs, StatusArg};
pub use config::Config;
