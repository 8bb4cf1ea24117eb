//! Slicing session events into attributed active time.
//!
//! # Algorithm Summary
//!
//! 1. Partition events by session ID (events without one are dropped)
//! 2. Stable-sort each session's events by timestamp
//! 3. Walk consecutive pairs; a gap shorter than the break threshold becomes
//!    an active slice anchored at the earlier event, a longer gap is a break
//! 4. Prompts are always counted, even when followed by a break or nothing
//!
//! Attribution (project, ticket, model) always comes from the anchor event, so
//! a ticket switch mid-session splits time between the old and new ticket, and
//! concurrent sessions never bleed into each other.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::types::SessionId;

/// Which calendar a slice's `date` is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// The machine's local timezone.
    #[default]
    Local,
    Utc,
}

impl DayBoundary {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Utc => "utc",
        }
    }

    /// Calendar day of `timestamp` under this boundary.
    pub fn date_of(self, timestamp: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => timestamp.with_timezone(&Local).date_naive(),
            Self::Utc => timestamp.date_naive(),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            _ => Err(format!("invalid day boundary: {s}")),
        }
    }
}

/// Configuration for slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceConfig {
    /// Longest gap between consecutive events still counted as working.
    /// A gap of exactly this length is a break.
    /// Default: 1800000 (30 minutes).
    pub break_threshold_ms: i64,

    /// Calendar used for `Slice::date`.
    pub day_boundary: DayBoundary,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            break_threshold_ms: 1_800_000, // 30 minutes
            day_boundary: DayBoundary::Local,
        }
    }
}

impl SliceConfig {
    /// Convenience constructor from a threshold in minutes.
    ///
    /// Saturates at `i64::MAX` milliseconds instead of overflowing.
    pub const fn with_break_minutes(mut self, minutes: i64) -> Self {
        self.break_threshold_ms = minutes.saturating_mul(60_000);
        self
    }

    pub const fn with_day_boundary(mut self, day_boundary: DayBoundary) -> Self {
        self.day_boundary = day_boundary;
        self
    }
}

/// A unit of attributed elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub session_id: SessionId,

    /// Timestamp of the anchor event.
    pub started_at: DateTime<Utc>,

    /// Calendar day on which the slice begins.
    pub date: NaiveDate,

    /// Elapsed time attributed to this slice. Zero for prompts followed by a
    /// break and for trailing prompts.
    pub duration_ms: i64,

    /// Whether the anchor event is a prompt submission.
    pub is_prompt: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Slice {
    fn anchored(
        session_id: &SessionId,
        anchor: &Event,
        started_at: DateTime<Utc>,
        duration_ms: i64,
        config: &SliceConfig,
    ) -> Self {
        Self {
            session_id: session_id.clone(),
            started_at,
            date: config.day_boundary.date_of(started_at),
            duration_ms,
            is_prompt: anchor.kind.is_prompt(),
            project: anchor.project.clone(),
            ticket: anchor.ticket.clone(),
            model: anchor.model.clone(),
        }
    }

    /// Duration in (fractional) seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// One session's events, in timestamp order.
#[derive(Debug)]
struct SessionEvents<'a> {
    id: &'a SessionId,
    events: Vec<&'a Event>,
}

/// Groups events by session in order of each session's first appearance,
/// then stable-sorts each group by timestamp.
///
/// Events without a timestamp sort ahead of every timed event.
fn partition_by_session(events: &[Event]) -> Vec<SessionEvents<'_>> {
    let mut index: HashMap<&SessionId, usize> = HashMap::new();
    let mut sessions: Vec<SessionEvents<'_>> = Vec::new();

    for event in events {
        let Some(id) = event.session_id.as_ref() else {
            continue;
        };
        let slot = *index.entry(id).or_insert_with(|| {
            sessions.push(SessionEvents {
                id,
                events: Vec::new(),
            });
            sessions.len() - 1
        });
        sessions[slot].events.push(event);
    }

    for session in &mut sessions {
        session.events.sort_by_key(|e| e.timestamp);
    }

    sessions
}

/// Walks one session's sorted events, appending its slices to `out`.
fn slice_session(session: &SessionEvents<'_>, config: &SliceConfig, out: &mut Vec<Slice>) {
    for pair in session.events.windows(2) {
        let (curr, next) = (pair[0], pair[1]);

        // An untimed event can neither anchor nor close a gap.
        let (Some(start), Some(end)) = (curr.timestamp, next.timestamp) else {
            continue;
        };

        let gap_ms = (end - start).num_milliseconds();
        let active = gap_ms == 0 || (gap_ms > 0 && gap_ms < config.break_threshold_ms);

        if active {
            out.push(Slice::anchored(session.id, curr, start, gap_ms, config));
        } else if curr.kind.is_prompt() {
            // The prompt still counts, but the idle gap after it does not.
            out.push(Slice::anchored(session.id, curr, start, 0, config));
        }
    }

    // A trailing prompt has nothing to measure against but is still a prompt.
    if let Some(last) = session.events.last().filter(|e| e.kind.is_prompt()) {
        if let Some(at) = last.timestamp {
            out.push(Slice::anchored(session.id, last, at, 0, config));
        }
    }
}

/// Converts a flat event collection into attributed slices.
///
/// Sessions are sliced independently and appear in order of first appearance
/// in `events`; slices within a session are chronological.
pub fn build_slices(events: &[Event], config: &SliceConfig) -> Vec<Slice> {
    let sessions = partition_by_session(events);
    let mut slices = Vec::new();
    for session in &sessions {
        slice_session(session, config, &mut slices);
    }

    tracing::debug!(
        events = events.len(),
        sessions = sessions.len(),
        slices = slices.len(),
        "built slices"
    );
    slices
}
