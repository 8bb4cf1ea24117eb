//! Status command for showing what the log directory holds.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::read_event_logs;

use super::util::{log_files, resolve_range};
use crate::Config;
use crate::cli::RangeArgs;

/// Day files in the log directory, oldest first.
///
/// Only names of the form `YYYY-MM-DD.<ext>` count. A missing directory has
/// no day files.
fn day_files(config: &Config) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let entries = match fs::read_dir(&config.log_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to read log directory {}", config.log_dir.display())
            });
        }
    };

    let suffix = format!(".{}", config.file_extension);
    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let stem = name.to_str()?.strip_suffix(&suffix)?;
            let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()?;
            Some((date, entry.path()))
        })
        .filter(|(_, path)| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    range: &RangeArgs,
    today: NaiveDate,
) -> Result<()> {
    let range = resolve_range(range, today)?;
    let all_files = day_files(config)?;

    writeln!(writer, "Tally status")?;
    writeln!(writer, "Log directory: {}", config.log_dir.display())?;
    writeln!(writer, "Day files: {}", all_files.len())?;

    let Some((_, newest)) = all_files.last() else {
        writeln!(writer, "No event logs found.")?;
        return Ok(());
    };
    writeln!(writer, "Newest file: {}", newest.display())?;

    let files = log_files(config, range);
    let log = read_event_logs(&files).context("failed to read event logs")?;
    let sessions: HashSet<_> = log
        .events
        .iter()
        .filter_map(|event| event.session_id.as_ref())
        .collect();

    writeln!(writer)?;
    writeln!(writer, "Range: {range} ({} files)", log.files_read)?;
    writeln!(writer, "Events: {}", log.events.len())?;
    writeln!(writer, "Skipped lines: {}", log.skipped_lines)?;
    writeln!(writer, "Sessions: {}", sessions.len())?;

    Ok(())
}
