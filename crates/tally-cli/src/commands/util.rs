//! Shared utilities for CLI commands.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use tally_core::{Slice, SliceFilter, build_slices, filter_slices, read_event_logs};

use crate::cli::{QueryArgs, RangeArgs};
use crate::config::Config;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Every day in the range, in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

/// Named report periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    LastWeek,
    Day,
    LastDay,
}

impl Period {
    /// Days covered by this period, relative to `today`.
    ///
    /// The current week runs from Monday up to and including today.
    pub fn range(self, today: NaiveDate) -> DateRange {
        let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        match self {
            Self::Week => DateRange::new(monday, today),
            Self::LastWeek => DateRange::new(monday - Days::new(7), monday - Days::new(1)),
            Self::Day => DateRange::new(today, today),
            Self::LastDay => {
                let yesterday = today - Days::new(1);
                DateRange::new(yesterday, yesterday)
            }
        }
    }
}

/// Parse a date string as ISO `YYYY-MM-DD`, `today`, `yesterday`, or a
/// relative "N days ago" / "N weeks ago".
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let days = match &caps[2] {
        "day" => Some(n),
        "week" => n.checked_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    days.and_then(|days| today.checked_sub_days(Days::new(days)))
        .with_context(|| format!("Relative date out of range: {s}"))
}

/// Resolves the range flags into concrete days.
pub fn resolve_range(args: &RangeArgs, today: NaiveDate) -> Result<DateRange> {
    if args.since.is_some() || args.until.is_some() {
        let end = match &args.until {
            Some(until) => parse_date(until, today)?,
            None => today,
        };
        let start = match &args.since {
            Some(since) => parse_date(since, today)?,
            None => end,
        };
        if start > end {
            anyhow::bail!("--since {start} is after --until {end}");
        }
        return Ok(DateRange::new(start, end));
    }

    let period = if args.last_week {
        Period::LastWeek
    } else if args.day {
        Period::Day
    } else if args.last_day {
        Period::LastDay
    } else {
        Period::Week
    };
    Ok(period.range(today))
}

/// Day files that exist in the log directory for `range`.
pub fn log_files(config: &Config, range: DateRange) -> Vec<PathBuf> {
    range
        .days()
        .map(|day| config.log_path(day))
        .filter(|path| path.is_file())
        .collect()
}

/// Slices selected by a query, with what was read to produce them.
#[derive(Debug)]
pub struct Selection {
    pub range: DateRange,
    pub slices: Vec<Slice>,
    pub files_read: usize,
    pub skipped_lines: usize,
}

/// Reads the logs for a query's range, slices them, and applies its filters.
///
/// Fails when no day file exists for the range at all; a range whose files
/// produce no slices yields an empty selection.
pub fn load_slices(config: &Config, query: &QueryArgs, today: NaiveDate) -> Result<Selection> {
    let range = resolve_range(&query.range, today)?;
    let files = log_files(config, range);
    if files.is_empty() {
        anyhow::bail!(
            "no event logs found in {} for {range}",
            config.log_dir.display()
        );
    }

    let log = read_event_logs(&files).context("failed to read event logs")?;
    if log.skipped_lines > 0 {
        tracing::info!(skipped = log.skipped_lines, "skipped malformed log lines");
    }

    let slice_config = config.slice_config(query.break_minutes)?;
    let slices = build_slices(&log.events, &slice_config);
    let filter = SliceFilter::new(query.project.clone(), query.ticket.clone());
    let slices = filter_slices(&slices, &filter);

    tracing::debug!(
        %range,
        files = log.files_read,
        events = log.events.len(),
        slices = slices.len(),
        "loaded slices"
    );

    Ok(Selection {
        range,
        slices,
        files_read: log.files_read,
        skipped_lines: log.skipped_lines,
    })
}
