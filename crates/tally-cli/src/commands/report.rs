//! Report command: active time grouped along one dimension.
//!
//! This module implements `tally report --by <dimension>` with the shared
//! range and filter flags and output formats (human-readable, JSON).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tally_core::{GroupBy, GroupStats, totals};

use super::format::{JsonReport, format_table, json_groups};
use super::util::{DateRange, load_slices};
use crate::cli::QueryArgs;
use crate::config::Config;

/// Formats the human-readable report output.
pub fn format_report(
    by: GroupBy,
    range: DateRange,
    groups: &BTreeMap<String, GroupStats>,
    total: &GroupStats,
) -> String {
    let heading = by.as_str().to_uppercase();
    let mut output = String::new();

    writeln!(output, "TIME BY {heading}: {range}").unwrap();
    writeln!(output).unwrap();

    if groups.is_empty() {
        writeln!(output, "No activity recorded.").unwrap();
        return output;
    }

    output.push_str(&format_table(&heading, groups, total));
    output
}

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    by: GroupBy,
    query: &QueryArgs,
    json: bool,
    today: NaiveDate,
) -> Result<()> {
    let selection = load_slices(config, query, today)?;
    let groups = by.aggregate(&selection.slices);
    let total = totals(&selection.slices);

    if json {
        let report = JsonReport::new(
            Utc::now(),
            selection.range,
            &[by],
            json_groups(&groups),
            total,
        );
        writeln!(writer, "{}", report.to_json()?)?;
    } else {
        write!(
            writer,
            "{}",
            format_report(by, selection.range, &groups, &total)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use insta::assert_snapshot;
    use tally_core::DayBoundary;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn write_log(dir: &TempDir, day: &str, lines: &[&str]) {
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(dir.path().join(format!("{day}.jsonl")), content).unwrap();
    }

    fn fixture() -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        write_log(
            &temp,
            "2025-01-29",
            &[
                r#"{"timestamp":"2025-01-29T09:00:00Z","event":"SessionStart","session_id":"a","project":"billing","model":"opus"}"#,
                r#"{"timestamp":"2025-01-29T09:05:00Z","event":"UserPromptSubmit","session_id":"a","project":"billing","ticket":"PAY-1","model":"opus"}"#,
                r#"{"timestamp":"2025-01-29T09:08:00Z","event":"UserPromptSubmit","session_id":"b","project":"infra","model":"haiku"}"#,
                r#"{"timestamp":"2025-01-29T09:08:00Z","event":"UserPromptSubmit","session_id":"a","project":"billing","ticket":"PAY-1","model":"opus"}"#,
                r#"{"timestamp":"2025-01-29T09:18:00Z","event":"SessionEnd","session_id":"a"}"#,
                r#"{"timestamp":"2025-01-29T09:20:00Z","event":"UserPromptSubmit","session_id":"b","project":"infra","model":"haiku"}"#,
            ],
        );
        let config = Config {
            log_dir: temp.path().to_path_buf(),
            day_boundary: DayBoundary::Utc,
            ..Config::default()
        };
        (temp, config)
    }

    fn run_to_string(config: &Config, by: GroupBy, query: &QueryArgs, json: bool) -> String {
        let mut out = Vec::new();
        run(&mut out, config, by, query, json, date(29)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_report_by_project() {
        let (_temp, config) = fixture();

        let output = run_to_string(&config, GroupBy::Project, &QueryArgs::default(), false);

        assert_snapshot!(output, @r"
        TIME BY PROJECT: 2025-01-27 to 2025-01-29

        PROJECT  SESSIONS  PROMPTS    ACTIVE
        billing         1        2       18m
        infra           1        2       12m
        ────────────────────────────────────
        TOTAL           2        4       30m
        ");
    }

    #[test]
    fn test_report_by_model() {
        let (_temp, config) = fixture();

        let output = run_to_string(&config, GroupBy::Model, &QueryArgs::default(), false);

        assert!(output.starts_with("TIME BY MODEL: "));
        assert!(output.contains("opus"));
        assert!(output.contains("haiku"));
    }

    #[test]
    fn test_report_filter_without_matches_is_empty() {
        let (_temp, config) = fixture();
        let query = QueryArgs {
            project: Some("nothing-matches".to_string()),
            ..QueryArgs::default()
        };

        let output = run_to_string(&config, GroupBy::Project, &query, false);

        assert_snapshot!(output, @r"
        TIME BY PROJECT: 2025-01-27 to 2025-01-29

        No activity recorded.
        ");
    }

    #[test]
    fn test_report_json() {
        let (_temp, config) = fixture();
        let query = QueryArgs {
            ticket: Some("pay".to_string()),
            ..QueryArgs::default()
        };

        let output = run_to_string(&config, GroupBy::Ticket, &query, true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["group_by"], serde_json::json!(["ticket"]));
        assert_eq!(value["groups"].as_array().unwrap().len(), 1);
        assert_eq!(value["groups"][0]["key"], "PAY-1");
        assert_eq!(value["groups"][0]["prompt_count"], 2);
        assert_eq!(value["groups"][0]["active_seconds"], 780.0);
        assert_eq!(value["totals"]["session_count"], 1);
    }

    #[test]
    fn test_report_break_override() {
        let (_temp, config) = fixture();
        let query = QueryArgs {
            break_minutes: Some(5),
            ..QueryArgs::default()
        };

        let output = run_to_string(&config, GroupBy::Project, &query, true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        // Only the 3-minute gap stays under a 5-minute threshold
        assert_eq!(value["totals"]["active_seconds"], 180.0);
    }

    #[test]
    fn test_report_without_logs_fails() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            log_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let mut out = Vec::new();

        let result = run(
            &mut out,
            &config,
            GroupBy::Project,
            &QueryArgs::default(),
            false,
            date(29),
        );

        assert!(result.is_err());
        assert!(out.is_empty());
    }
}
