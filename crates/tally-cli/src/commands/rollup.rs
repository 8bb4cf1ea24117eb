//! Nested views: `tally timesheet` and `tally summary`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tally_core::{GroupBy, RollupNode, Slice, project_summary, timesheet, totals};

use super::format::{JsonReport, format_rollup, heading, json_tree};
use super::util::{DateRange, load_slices};
use crate::cli::QueryArgs;
use crate::config::Config;

/// Which nested view to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Day, project, ticket.
    Timesheet,
    /// Project, ticket.
    Summary,
}

impl View {
    pub const fn levels(self) -> &'static [GroupBy] {
        match self {
            Self::Timesheet => &[GroupBy::Day, GroupBy::Project, GroupBy::Ticket],
            Self::Summary => &[GroupBy::Project, GroupBy::Ticket],
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Timesheet => "TIMESHEET",
            Self::Summary => "SUMMARY",
        }
    }

    fn build(self, slices: &[Slice]) -> BTreeMap<String, RollupNode> {
        match self {
            Self::Timesheet => timesheet(slices),
            Self::Summary => project_summary(slices),
        }
    }
}

/// Formats the human-readable view.
pub fn format_view(view: View, range: DateRange, nodes: &BTreeMap<String, RollupNode>) -> String {
    let mut output = String::new();

    writeln!(output, "{}: {range}", view.title()).unwrap();
    writeln!(output).unwrap();

    if nodes.is_empty() {
        writeln!(output, "No activity recorded.").unwrap();
        return output;
    }

    output.push_str(&format_rollup(&heading(view.levels()), nodes));
    output
}

/// Runs the timesheet or summary command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    view: View,
    query: &QueryArgs,
    json: bool,
    today: NaiveDate,
) -> Result<()> {
    let selection = load_slices(config, query, today)?;
    let nodes = view.build(&selection.slices);

    if json {
        let report = JsonReport::new(
            Utc::now(),
            selection.range,
            view.levels(),
            json_tree(&nodes),
            totals(&selection.slices),
        );
        writeln!(writer, "{}", report.to_json()?)?;
    } else {
        write!(writer, "{}", format_view(view, selection.range, &nodes))?;
    }

    Ok(())
}
