//! Project/ticket filtering of slices.

use crate::slice::Slice;

/// Case-insensitive substring filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceFilter {
    pub project: Option<String>,
    pub ticket: Option<String>,
}

impl SliceFilter {
    pub const fn new(project: Option<String>, ticket: Option<String>) -> Self {
        Self { project, ticket }
    }

    /// Returns true if no filter is set.
    pub const fn is_empty(&self) -> bool {
        self.project.is_none() && self.ticket.is_none()
    }

    /// Returns true if `slice` satisfies every set filter.
    ///
    /// A slice with no project (or ticket) is matched as the empty string, so
    /// it only passes an empty needle.
    pub fn matches(&self, slice: &Slice) -> bool {
        contains_ignore_case(slice.project.as_deref(), self.project.as_deref())
            && contains_ignore_case(slice.ticket.as_deref(), self.ticket.as_deref())
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: Option<&str>) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    haystack
        .unwrap_or_default()
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Returns the slices matching `filter`, preserving order.
pub fn filter_slices(slices: &[Slice], filter: &SliceFilter) -> Vec<Slice> {
    if filter.is_empty() {
        return slices.to_vec();
    }
    slices
        .iter()
        .filter(|slice| filter.matches(slice))
        .cloned()
        .collect()
}
