//! Table and JSON rendering shared by the report commands.
//!
//! Groups are listed by descending active time, ties broken by key, at every
//! level of a view.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::{GroupBy, GroupStats, RollupNode};

use super::util::DateRange;

// ========== Duration Formatting ==========

/// Formats milliseconds as a duration string.
/// Returns "XhYYm" if >= 1 hour, "Xm" if < 1 hour. Minutes are floored and
/// negative durations render as 0m.
pub fn format_duration(ms: i64) -> String {
    if ms < 0 {
        return "0m".to_string();
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

// ========== Ordering ==========

/// Flat groups ordered for display.
pub fn sorted_groups(groups: &BTreeMap<String, GroupStats>) -> Vec<(&str, &GroupStats)> {
    let mut sorted: Vec<_> = groups.iter().map(|(key, stats)| (key.as_str(), stats)).collect();
    // Stable sort keeps the map's key order among ties.
    sorted.sort_by_key(|(_, stats)| Reverse(stats.active_ms));
    sorted
}

fn sorted_nodes(nodes: &BTreeMap<String, RollupNode>) -> Vec<(&str, &RollupNode)> {
    let mut sorted: Vec<_> = nodes.iter().map(|(key, node)| (key.as_str(), node)).collect();
    sorted.sort_by_key(|(_, node)| Reverse(node.stats.active_ms));
    sorted
}

// ========== Tables ==========

struct Row {
    label: String,
    stats: GroupStats,
}

fn write_row(output: &mut String, label: &str, stats: &GroupStats, width: usize) {
    writeln!(
        output,
        "{label:<width$}  {:>8}  {:>7}  {:>8}",
        stats.session_count,
        stats.prompt_count,
        format_duration(stats.active_ms)
    )
    .unwrap();
}

fn render_table(heading: &str, rows: &[Row], total: Option<&GroupStats>) -> String {
    let width = rows
        .iter()
        .map(|row| row.label.chars().count())
        .chain([heading.chars().count(), "TOTAL".len()])
        .max()
        .unwrap_or_default();

    let mut output = String::new();
    writeln!(
        output,
        "{heading:<width$}  {:>8}  {:>7}  {:>8}",
        "SESSIONS", "PROMPTS", "ACTIVE"
    )
    .unwrap();

    for row in rows {
        write_row(&mut output, &row.label, &row.stats, width);
    }

    if let Some(total) = total {
        writeln!(output, "{}", "─".repeat(width + 29)).unwrap();
        write_row(&mut output, "TOTAL", total, width);
    }

    output
}

/// Renders a flat view followed by a TOTAL row.
pub fn format_table(
    heading: &str,
    groups: &BTreeMap<String, GroupStats>,
    total: &GroupStats,
) -> String {
    let rows: Vec<Row> = sorted_groups(groups)
        .into_iter()
        .map(|(key, stats)| Row {
            label: key.to_string(),
            stats: *stats,
        })
        .collect();
    render_table(heading, &rows, Some(total))
}

fn push_rows(rows: &mut Vec<Row>, nodes: &BTreeMap<String, RollupNode>, depth: usize) {
    for (key, node) in sorted_nodes(nodes) {
        rows.push(Row {
            label: format!("{}{key}", "  ".repeat(depth)),
            stats: node.stats,
        });
        push_rows(rows, &node.children, depth + 1);
    }
}

/// Renders a nested view, indenting each level by two spaces.
pub fn format_rollup(heading: &str, nodes: &BTreeMap<String, RollupNode>) -> String {
    let mut rows = Vec::new();
    push_rows(&mut rows, nodes, 0);
    render_table(heading, &rows, None)
}

/// Column heading for a list of levels, e.g. "DAY / PROJECT / TICKET".
pub fn heading(levels: &[GroupBy]) -> String {
    levels
        .iter()
        .map(|level| level.as_str().to_uppercase())
        .collect::<Vec<_>>()
        .join(" / ")
}

// ========== JSON ==========

/// One group in JSON output.
#[derive(Debug, Serialize)]
pub struct JsonGroup {
    pub key: String,
    #[serde(flatten)]
    pub stats: GroupStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

/// Flat groups in display order.
pub fn json_groups(groups: &BTreeMap<String, GroupStats>) -> Vec<JsonGroup> {
    sorted_groups(groups)
        .into_iter()
        .map(|(key, stats)| JsonGroup {
            key: key.to_string(),
            stats: *stats,
            children: Vec::new(),
        })
        .collect()
}

/// Nested groups in display order.
pub fn json_tree(nodes: &BTreeMap<String, RollupNode>) -> Vec<JsonGroup> {
    sorted_nodes(nodes)
        .into_iter()
        .map(|(key, node)| JsonGroup {
            key: key.to_string(),
            stats: node.stats,
            children: json_tree(&node.children),
        })
        .collect()
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub timezone: String,
    pub period: JsonPeriod,
    pub group_by: Vec<&'static str>,
    pub groups: Vec<JsonGroup>,
    pub totals: GroupStats,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
}

impl JsonReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        range: DateRange,
        levels: &[GroupBy],
        groups: Vec<JsonGroup>,
        totals: GroupStats,
    ) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339(),
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
            period: JsonPeriod {
                start: range.start.format("%Y-%m-%d").to_string(),
                end: range.end.format("%Y-%m-%d").to_string(),
            },
            group_by: levels.iter().map(GroupBy::as_str).collect(),
            groups,
            totals,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
