use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tb_cli::commands::{Session, add, conflicts, delete, edit, list, mark, rate, report, suggest};
use tb_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tb_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tb_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so `--json` output stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let session = Session::new(config, Utc::now());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Add(args) => {
            add::run(&mut out, &mut db, &session, &args)?;
        }
        Commands::Edit(args) => {
            edit::run(&mut out, &mut db, &session, &args)?;
        }
        Commands::Mark { id, status } => {
            mark::run(&mut out, &mut db, &session, &id, status.into())?;
        }
        Commands::Reset { id } => {
            mark::reset(&mut out, &mut db, &session, &id)?;
        }
        Commands::Delete { id } => {
            delete::run(&mut out, &mut db, &session, &id)?;
        }
        Commands::List { date, days, json } => {
            list::run(&mut out, &mut db, &session, &date, days, json)?;
        }
        Commands::Suggest { date, minutes, json } => {
            suggest::run(&mut out, &db, &session, &date, minutes, json)?;
        }
        Commands::Conflicts { date, days, json } => {
            conflicts::run(&mut out, &db, &session, &date, days, json)?;
        }
        Commands::Rate {
            rating,
            date,
            notes,
        } => {
            rate::run(&mut out, &mut db, &session, rating, &date, notes)?;
        }
        Commands::Report { week: _, month, json } => {
            let period = if month {
                report::Period::Month
            } else {
                report::Period::Week
            };
            report::run(&mut out, &mut db, &session, period, json)?;
        }
    }

    out.flush()?;
    Ok(())
}
