//! Hook event kinds as the single source of truth for event name strings.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The lifecycle hook that produced an event.
///
/// Unrecognized names are preserved in [`EventKind::Other`] so that new hook
/// types in the log never make a line unparseable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionStart,
    UserPromptSubmit,
    SessionEnd,
    Other(String),
}

impl EventKind {
    /// Canonical hook name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SessionStart => "SessionStart",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::SessionEnd => "SessionEnd",
            Self::Other(name) => name,
        }
    }

    /// Returns true for prompt submissions, the only kind that counts as a prompt.
    pub const fn is_prompt(&self) -> bool {
        matches!(self, Self::UserPromptSubmit)
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SessionStart" | "session_start" => Self::SessionStart,
            "UserPromptSubmit" | "user_prompt_submit" => Self::UserPromptSubmit,
            "SessionEnd" | "session_end" => Self::SessionEnd,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(kind) = s.parse::<Self>();
        Ok(kind)
    }
}
