//! Reading events from the append-only daily JSONL logs.
//!
//! Log files are written by a capture hook while reports may be running, so
//! the reader is deliberately forgiving: a line that does not parse (including
//! a half-written trailing line) is skipped and counted, and a file that does
//! not exist contributes nothing.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::event::Event;

/// Buffer size for `BufReader` (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read event log {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Events read from one or more log files, in file order then line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    pub events: Vec<Event>,
    /// Non-blank lines that could not be parsed as an event.
    pub skipped_lines: usize,
    /// Files that were opened and read (including empty ones).
    pub files_read: usize,
    /// Requested files that did not exist.
    pub missing_files: usize,
}

impl EventLog {
    fn extend(&mut self, other: Self) {
        self.events.extend(other.events);
        self.skipped_lines += other.skipped_lines;
        self.files_read += other.files_read;
        self.missing_files += other.missing_files;
    }
}

/// Parses a single log line, ignoring surrounding whitespace.
///
/// Returns `Ok(None)` for a blank line and an error for anything that is not
/// a JSON object.
pub fn parse_event_line(line: &str) -> Result<Option<Event>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Reads every file in `paths` and concatenates their events.
///
/// Files are parsed in parallel, but the result is always merged in the order
/// of `paths`.
pub fn read_event_logs<P>(paths: &[P]) -> Result<EventLog, StoreError>
where
    P: AsRef<Path> + Sync,
{
    let per_file: Vec<EventLog> = paths
        .par_iter()
        .map(|path| read_event_log(path.as_ref()))
        .collect::<Result<_, _>>()?;

    let mut log = EventLog::default();
    for file_log in per_file {
        log.extend(file_log);
    }

    tracing::debug!(
        events = log.events.len(),
        skipped = log.skipped_lines,
        files = log.files_read,
        missing = log.missing_files,
        "read event logs"
    );
    Ok(log)
}

/// Reads a single log file.
pub fn read_event_log(path: &Path) -> Result<EventLog, StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "event log not found");
            return Ok(EventLog {
                missing_files: 1,
                ..EventLog::default()
            });
        }
        Err(e) => return Err(io_err(e)),
    };
    let reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut log = EventLog {
        files_read: 1,
        ..EventLog::default()
    };

    for (line_num, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes.map_err(io_err)?;

        let Ok(line) = std::str::from_utf8(&bytes) else {
            tracing::debug!(
                path = %path.display(),
                line = line_num + 1,
                "skipping non-UTF-8 line"
            );
            log.skipped_lines += 1;
            continue;
        };

        match parse_event_line(line) {
            Ok(Some(event)) => log.events.push(event),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    line = line_num + 1,
                    error = %e,
                    "skipping malformed line"
                );
                log.skipped_lines += 1;
            }
        }
    }

    Ok(log)
}
