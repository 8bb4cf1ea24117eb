//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tally_core::GroupBy;

use crate::config::MAX_BREAK_MINUTES;

/// Timesheets from coding-session hook logs.
///
/// Reads the daily JSONL logs written by session hooks, slices each session
/// into active time separated by breaks, and rolls the result up by project,
/// ticket, model or day.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
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
    /// Active time grouped along one dimension.
    Report {
        /// Dimension to group by.
        #[arg(long, value_enum, default_value_t = ReportBy::Project)]
        by: ReportBy,

        #[command(flatten)]
        query: QueryArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Day, project and ticket breakdown.
    Timesheet {
        #[command(flatten)]
        query: QueryArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Project and ticket breakdown across the whole period.
    Summary {
        #[command(flatten)]
        query: QueryArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write the computed slices to stdout as JSONL.
    Slices {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show which logs exist and how much they contain.
    Status {
        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Grouping dimensions for `tally report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportBy {
    Project,
    Ticket,
    Model,
    Day,
    Session,
}

impl From<ReportBy> for GroupBy {
    fn from(by: ReportBy) -> Self {
        match by {
            ReportBy::Project => Self::Project,
            ReportBy::Ticket => Self::Ticket,
            ReportBy::Model => Self::Model,
            ReportBy::Day => Self::Day,
            ReportBy::Session => Self::Session,
        }
    }
}

/// Which days of logs to read. Defaults to the current week.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// Today only.
    #[arg(long, group = "period")]
    pub day: bool,

    /// Yesterday only.
    #[arg(long, group = "period")]
    pub last_day: bool,

    /// This week, Monday to today (default).
    #[arg(long, group = "period")]
    pub week: bool,

    /// Last week, Monday to Sunday.
    #[arg(long, group = "period")]
    pub last_week: bool,

    /// First day to include: YYYY-MM-DD, today, yesterday, or "N days ago".
    #[arg(long, conflicts_with = "period")]
    pub since: Option<String>,

    /// Last day to include (defaults to today).
    #[arg(long, conflicts_with = "period")]
    pub until: Option<String>,
}

/// Range, filters and slicing overrides shared by the report commands.
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Only include slices whose project contains this text (case-insensitive).
    #[arg(long)]
    pub project: Option<String>,

    /// Only include slices whose ticket contains this text (case-insensitive).
    #[arg(long)]
    pub ticket: Option<String>,

    /// Gaps of this many minutes or more count as a break.
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_BREAK_MINUTES))]
    pub break_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_defaults_to_project() {
        let cli = Cli::try_parse_from(["tally", "report"]).unwrap();
        let Some(Commands::Report { by, json, query }) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(by, ReportBy::Project);
        assert!(!json);
        assert!(query.project.is_none());
    }

    #[test]
    fn parses_filters_and_range() {
        let cli = Cli::try_parse_from([
            "tally",
            "timesheet",
            "--since",
            "2025-01-01",
            "--until",
            "2025-01-07",
            "--project",
            "billing",
            "--ticket",
            "PAY",
            "--break-minutes",
            "15",
            "--json",
        ])
        .unwrap();
        let Some(Commands::Timesheet { query, json }) = cli.command else {
            panic!("expected timesheet command");
        };
        assert!(json);
        assert_eq!(query.range.since.as_deref(), Some("2025-01-01"));
        assert_eq!(query.range.until.as_deref(), Some("2025-01-07"));
        assert_eq!(query.project.as_deref(), Some("billing"));
        assert_eq!(query.ticket.as_deref(), Some("PAY"));
        assert_eq!(query.break_minutes, Some(15));
    }

    #[test]
    fn period_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["tally", "summary", "--day", "--week"]).is_err());
        assert!(Cli::try_parse_from(["tally", "summary", "--day", "--since", "2025-01-01"]).is_err());
    }

    #[test]
    fn break_minutes_must_be_positive() {
        assert!(Cli::try_parse_from(["tally", "report", "--break-minutes", "0"]).is_err());
    }

    #[test]
    fn break_minutes_is_capped_at_one_week() {
        assert!(Cli::try_parse_from(["tally", "report", "--break-minutes", "10080"]).is_ok());
        assert!(Cli::try_parse_from(["tally", "report", "--break-minutes", "10081"]).is_err());
        assert!(
            Cli::try_parse_from([
                "tally",
                "report",
                "--break-minutes",
                "999999999999999999"
            ])
            .is_err()
        );
    }

    #[test]
    fn report_by_maps_to_group_by() {
        assert_eq!(GroupBy::from(ReportBy::Ticket), GroupBy::Ticket);
        assert_eq!(GroupBy::from(ReportBy::Day), GroupBy::Day);
        let cli = Cli::try_parse_from(["tally", "report", "--by", "model"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Report {
                by: ReportBy::Model,
                ..
            })
        ));
    }
}
