//! Keyed aggregation of slices.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::slice::Slice;
use crate::types::SessionId;

/// Label for slices without a project.
///
/// Group keys are plain strings, so a project literally named `(unknown)`
/// shares this group with unattributed slices. The same holds for the other
/// labels below.
pub const UNKNOWN_PROJECT: &str = "(unknown)";

/// Label for slices without a ticket.
pub const UNTRACKED_TICKET: &str = "(untracked)";

/// Label for slices without a model.
pub const UNKNOWN_MODEL: &str = "(unknown)";

/// Summary statistics for one group of slices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Distinct sessions that contributed at least one slice.
    pub session_count: usize,

    /// Slices anchored at a prompt submission.
    pub prompt_count: usize,

    /// Total attributed time, serialized as fractional seconds.
    #[serde(rename = "active_seconds", with = "ms_as_seconds")]
    pub active_ms: i64,
}

/// Running totals for a group while folding slices.
#[derive(Debug, Default)]
pub(crate) struct Accumulator<'a> {
    sessions: HashSet<&'a SessionId>,
    prompts: usize,
    active_ms: i64,
}

impl<'a> Accumulator<'a> {
    pub(crate) fn add(&mut self, slice: &'a Slice) {
        self.sessions.insert(&slice.session_id);
        if slice.is_prompt {
            self.prompts += 1;
        }
        self.active_ms += slice.duration_ms;
    }

    pub(crate) fn finish(&self) -> GroupStats {
        GroupStats {
            session_count: self.sessions.len(),
            prompt_count: self.prompts,
            active_ms: self.active_ms,
        }
    }
}

/// Groups `slices` by `key_fn` and summarizes each group.
///
/// Slices for which `key_fn` returns `None` are left out of every group.
pub fn aggregate<K, F>(slices: &[Slice], key_fn: F) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    F: Fn(&Slice) -> Option<K>,
{
    let mut groups: BTreeMap<K, Accumulator<'_>> = BTreeMap::new();
    for slice in slices {
        if let Some(key) = key_fn(slice) {
            groups.entry(key).or_default().add(slice);
        }
    }
    groups
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

/// Summarizes all slices as a single group.
pub fn totals(slices: &[Slice]) -> GroupStats {
    let mut acc = Accumulator::default();
    for slice in slices {
        acc.add(slice);
    }
    acc.finish()
}

/// The standard grouping dimensions.
///
/// Every key function falls back to a sentinel label, so no slice is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    Project,
    Ticket,
    Model,
    Day,
    Session,
}

impl GroupBy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Ticket => "ticket",
            Self::Model => "model",
            Self::Day => "day",
            Self::Session => "session",
        }
    }

    /// The grouping key for `slice`.
    ///
    /// Missing attribution maps to [`UNKNOWN_PROJECT`], [`UNTRACKED_TICKET`]
    /// or [`UNKNOWN_MODEL`]. A value equal to its label is not told apart.
    pub fn key(self, slice: &Slice) -> String {
        match self {
            Self::Project => label_or(slice.project.as_deref(), UNKNOWN_PROJECT),
            Self::Ticket => label_or(slice.ticket.as_deref(), UNTRACKED_TICKET),
            Self::Model => label_or(slice.model.as_deref(), UNKNOWN_MODEL),
            Self::Day => slice.date.format("%Y-%m-%d").to_string(),
            Self::Session => slice.session_id.to_string(),
        }
    }

    /// Aggregates `slices` along this dimension.
    pub fn aggregate(self, slices: &[Slice]) -> BTreeMap<String, GroupStats> {
        aggregate(slices, |slice| Some(self.key(slice)))
    }
}

fn label_or(value: Option<&str>, fallback: &str) -> String {
    value.unwrap_or(fallback).to_string()
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "ticket" => Ok(Self::Ticket),
            "model" => Ok(Self::Model),
            "day" => Ok(Self::Day),
            "session" => Ok(Self::Session),
            _ => Err(format!("invalid grouping: {s}")),
        }
    }
}

/// Serializes integer milliseconds as fractional seconds, and back.
mod ms_as_seconds {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_precision_loss)]
    pub fn serialize<S>(ms: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*ms as f64 / 1000.0)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Ok((seconds * 1000.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn slice(session: &str, project: Option<&str>, duration_ms: i64, is_prompt: bool) -> Slice {
        Slice {
            session_id: SessionId::new(session).unwrap(),
            started_at: Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            duration_ms,
            is_prompt,
            project: project.map(String::from),
            ticket: None,
            model: None,
        }
    }

    #[test]
    fn project_named_like_the_label_shares_its_group() {
        let slices = vec![
            slice("s1", None, 60_000, true),
            slice("s2", Some(UNKNOWN_PROJECT), 120_000, true),
            slice("s3", Some("alpha"), 30_000, true),
        ];

        let groups = GroupBy::Project.aggregate(&slices);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[UNKNOWN_PROJECT].session_count, 2);
        assert_eq!(groups[UNKNOWN_PROJECT].active_ms, 180_000);
    }

    #[test]
    fn session_count_is_distinct_sessions() {
        let slices = vec![
            slice("s1", Some("alpha"), 60_000, true),
            slice("s1", Some("alpha"), 120_000, true),
            slice("s1", Some("alpha"), 0, true),
        ];

        let groups = GroupBy::Project.aggregate(&slices);

        assert_eq!(
            groups["alpha"],
            GroupStats {
                session_count: 1,
                prompt_count: 3,
                active_ms: 180_000,
            }
        );
    }

    #[test]
    fn active_time_includes_non_prompt_slices() {
        let slices = vec![
            slice("s1", Some("alpha"), 300_000, false),
            slice("s1", Some("alpha"), 180_000, true),
            slice("s2", Some("alpha"), 60_000, false),
        ];

        let stats = GroupBy::Project.aggregate(&slices)["alpha"];

        assert_eq!(stats.session_count, 2);
        assert_eq!(stats.prompt_count, 1);
        assert_eq!(stats.active_ms, 540_000);
    }

    #[test]
    fn missing_project_uses_unknown_label() {
        let slices = vec![
            slice("s1", None, 60_000, true),
            slice("s2", Some("alpha"), 60_000, true),
        ];

        let groups = GroupBy::Project.aggregate(&slices);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[UNKNOWN_PROJECT].active_ms, 60_000);
        assert_eq!(groups["alpha"].active_ms, 60_000);
    }

    #[test]
    fn none_key_excludes_slice() {
        let slices = vec![
            slice("s1", None, 60_000, true),
            slice("s2", Some("alpha"), 30_000, true),
        ];

        let groups = aggregate(&slices, |s| s.project.clone());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups["alpha"].session_count, 1);
    }

    #[test]
    fn custom_key_function() {
        let slices = vec![
            slice("s1", Some("alpha"), 1_000, true),
            slice("s2", Some("beta"), 2_000, false),
            slice("s3", Some("alpha"), 4_000, false),
        ];

        let by_prompt = aggregate(&slices, |s| Some(s.is_prompt));

        assert_eq!(by_prompt[&true].active_ms, 1_000);
        assert_eq!(by_prompt[&false].active_ms, 6_000);
        assert_eq!(by_prompt[&false].session_count, 2);
    }

    #[test]
    fn totals_counts_distinct_sessions_overall() {
        let slices = vec![
            slice("s1", Some("alpha"), 60_000, true),
            slice("s1", Some("beta"), 60_000, false),
            slice("s2", Some("beta"), 60_000, true),
        ];

        let total = totals(&slices);

        assert_eq!(total.session_count, 2);
        assert_eq!(total.prompt_count, 2);
        assert_eq!(total.active_ms, 180_000);
        assert_eq!(totals(&[]), GroupStats::default());
    }

    #[test]
    fn day_and_session_keys() {
        let s = slice("sess-9", None, 0, true);
        assert_eq!(GroupBy::Day.key(&s), "2025-01-15");
        assert_eq!(GroupBy::Session.key(&s), "sess-9");
        assert_eq!(GroupBy::Ticket.key(&s), UNTRACKED_TICKET);
        assert_eq!(GroupBy::Model.key(&s), UNKNOWN_MODEL);
    }

    #[test]
    fn group_by_parse_roundtrip() {
        for by in [
            GroupBy::Project,
            GroupBy::Ticket,
            GroupBy::Model,
            GroupBy::Day,
            GroupBy::Session,
        ] {
            assert_eq!(by.to_string().parse::<GroupBy>().unwrap(), by);
        }
        assert!("week".parse::<GroupBy>().is_err());
    }

    #[test]
    fn stats_serialize_as_seconds() {
        let stats = GroupStats {
            session_count: 2,
            prompt_count: 5,
            active_ms: 301_500,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"session_count":2,"prompt_count":5,"active_seconds":301.5}"#
        );

        let parsed: GroupStats = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats);
    }

    #[test]
    fn stats_roundtrip_keeps_milliseconds() {
        for active_ms in [0, 1, 999, 1_001, 86_399_999, 123_456_789_012] {
            let stats = GroupStats {
                session_count: 1,
                prompt_count: 1,
                active_ms,
            };
            let json = serde_json::to_string(&stats).unwrap();
            let parsed: GroupStats = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.active_ms, active_ms, "{json}");
        }
    }
}
