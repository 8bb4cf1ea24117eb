//! Nested aggregations: day → project → ticket and project → ticket.
//!
//! Every level uses the same accumulation as [`aggregate`](crate::aggregate()),
//! keyed independently, so a node's `prompt_count` and `active_ms` equal the
//! sums over its children. `session_count` is distinct per node: a session
//! that worked on two tickets counts once for the project and once per ticket.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{Accumulator, GroupBy, GroupStats};
use crate::slice::Slice;

/// One group in a rollup, with its nested subgroups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupNode {
    #[serde(flatten)]
    pub stats: GroupStats,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, RollupNode>,
}

/// Accumulating counterpart of [`RollupNode`].
#[derive(Debug, Default)]
struct RollupAcc<'a> {
    acc: Accumulator<'a>,
    children: BTreeMap<String, RollupAcc<'a>>,
}

impl RollupAcc<'_> {
    fn finish(&self) -> RollupNode {
        RollupNode {
            stats: self.acc.finish(),
            children: self
                .children
                .iter()
                .map(|(key, child)| (key.clone(), child.finish()))
                .collect(),
        }
    }
}

/// Aggregates `slices` into a tree with one level per entry of `levels`.
///
/// Each slice updates exactly one node per level in a single pass.
pub fn rollup(slices: &[Slice], levels: &[GroupBy]) -> BTreeMap<String, RollupNode> {
    let mut roots: BTreeMap<String, RollupAcc<'_>> = BTreeMap::new();

    for slice in slices {
        let mut groups = &mut roots;
        for level in levels {
            let node = groups.entry(level.key(slice)).or_default();
            node.acc.add(slice);
            groups = &mut node.children;
        }
    }

    roots
        .iter()
        .map(|(key, node)| (key.clone(), node.finish()))
        .collect()
}

/// Day → project → ticket.
pub fn timesheet(slices: &[Slice]) -> BTreeMap<String, RollupNode> {
    rollup(slices, &[GroupBy::Day, GroupBy::Project, GroupBy::Ticket])
}

/// Project → ticket.
pub fn project_summary(slices: &[Slice]) -> BTreeMap<String, RollupNode> {
    rollup(slices, &[GroupBy::Project, GroupBy::Ticket])
}
