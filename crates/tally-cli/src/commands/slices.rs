//! Slices command: the filtered slices as JSONL.

use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::Slice;

use super::util::load_slices;
use crate::cli::QueryArgs;
use crate::config::Config;

fn write_slices<W: Write>(writer: &mut W, slices: &[Slice]) -> io::Result<()> {
    for slice in slices {
        serde_json::to_writer(&mut *writer, slice)?;
        writeln!(writer)?;
    }
    writer.flush()
}

/// Run the slices command.
///
/// Outputs one JSON object per slice, in session order. Stops quietly when
/// the reader goes away (e.g., when piped to `head`).
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    query: &QueryArgs,
    today: NaiveDate,
) -> Result<()> {
    let selection = load_slices(config, query, today)?;

    let mut writer = BufWriter::new(writer);
    match write_slices(&mut writer, &selection.slices) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("output closed early");
            Ok(())
        }
        result => result.context("failed to write slices"),
    }
}
