use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::rollup::View;
use tally_cli::commands::{report, rollup, slices, status};
use tally_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays clean for reports and JSONL
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let today = Local::now().date_naive();
    let mut out = io::stdout().lock();

    match command {
        Commands::Report { by, query, json } => {
            report::run(&mut out, &config, by.into(), &query, json, today)?;
        }
        Commands::Timesheet { query, json } => {
            rollup::run(&mut out, &config, View::Timesheet, &query, json, today)?;
        }
        Commands::Summary { query, json } => {
            rollup::run(&mut out, &config, View::Summary, &query, json, today)?;
        }
        Commands::Slices { query } => {
            slices::run(&mut out, &config, &query, today)?;
        }
        Commands::Status { range } => {
            status::run(&mut out, &config, &range, today)?;
        }
    }

    Ok(())
}
