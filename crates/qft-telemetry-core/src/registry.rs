//! Node registry: the filtering and lifecycle authority.
//!
//! The registry maps tree-node identities to [`TrackedNode`] instances and
//! owns all of them for the run. Entries are created on the first
//! qualifying entered-event and never removed: a looped node re-enters
//! many times and reuses its entry, starting each iteration with counters
//! already reset by the prior exit.
//!
//! All three operations are no-ops for unknown or filtered-out nodes;
//! nothing here can fail in a way the host run would see.

use std::collections::HashMap;

use crate::filter::ObservationFilter;
use crate::metric::{MetricRecord, RecordStatus};
use crate::node::{AncestorSegment, NodeCategory, TrackedNode};
use crate::signal::Severity;

/// Category-specific display-name input for [`NodeRegistry::track`].
#[derive(Debug, Clone, Copy)]
pub enum NameSource<'a> {
    /// Dot-qualified test case or test set name.
    Qualified(&'a str),
    /// Plain procedure call name.
    Plain(&'a str),
    /// Root-to-node ancestor chain for the sequence fallback.
    Ancestors(&'a [AncestorSegment]),
}

impl NameSource<'_> {
    /// Best-effort flat name; empty for ancestor-chain sources.
    fn as_name(&self) -> &str {
        match self {
            Self::Qualified(name) | Self::Plain(name) => name,
            Self::Ancestors(_) => "",
        }
    }

    /// Best-effort ancestor chain; empty for flat-name sources.
    fn ancestors(&self) -> &[AncestorSegment] {
        match self {
            Self::Ancestors(chain) => chain,
            Self::Qualified(_) | Self::Plain(_) => &[],
        }
    }
}

/// Mapping from tree-node identity to its tracked state.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, TrackedNode>,
    filter: ObservationFilter,
}

impl NodeRegistry {
    /// Creates a registry with the given observation filter.
    #[must_use]
    pub fn new(filter: ObservationFilter) -> Self {
        Self {
            entries: HashMap::new(),
            filter,
        }
    }

    /// The active observation filter.
    #[must_use]
    pub const fn filter(&self) -> &ObservationFilter {
        &self.filter
    }

    /// Replaces the observation filter.
    ///
    /// Only affects future entered-evaluations; nodes already tracked
    /// stay tracked.
    pub fn set_filter(&mut self, filter: ObservationFilter) {
        self.filter = filter;
    }

    /// Number of tracked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no node is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the identity is tracked.
    #[must_use]
    pub fn contains(&self, node_id: &str) -> bool {
        self.entries.contains_key(node_id)
    }

    /// Returns the tracked node for an identity, if present.
    #[must_use]
    pub fn get(&self, node_id: &str) -> Option<&TrackedNode> {
        self.entries.get(node_id)
    }

    /// Starts tracking a node.
    ///
    /// No-op when the identity is already tracked (idempotent re-entry)
    /// or the type does not satisfy the filter. Missing or mismatched
    /// display-name inputs degrade to best-effort path segments.
    pub fn track(&mut self, node_id: &str, node_type: &str, name: NameSource<'_>) {
        if !self.filter.matches(node_type) || self.entries.contains_key(node_id) {
            return;
        }
        let node = match NodeCategory::from_node_type(node_type) {
            NodeCategory::TestCase => TrackedNode::test_case(name.as_name()),
            NodeCategory::TestSet => TrackedNode::test_set(name.as_name()),
            NodeCategory::Procedure => TrackedNode::procedure(name.as_name()),
            NodeCategory::Sequence => TrackedNode::sequence(name.ancestors()),
        };
        self.entries.insert(node_id.to_string(), node);
    }

    /// Increments the counter matching the severity for a tracked node.
    ///
    /// Silently ignores unknown identities; the caller walks ancestor
    /// chains without checking membership first.
    pub fn signal(&mut self, node_id: &str, severity: Severity) {
        if let Some(node) = self.entries.get_mut(node_id) {
            node.counters_mut().increment(severity);
        }
    }

    /// Produces the exit record set for a tracked node and resets its
    /// counters.
    ///
    /// Returns `None` for untracked identities or non-matching types.
    /// The counter reset happens with record construction, regardless of
    /// whether downstream delivery later succeeds: the accounting epoch
    /// is the node's execution span.
    #[allow(clippy::too_many_arguments)]
    pub fn emit(
        &mut self,
        node_id: &str,
        node_type: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
        status: &RecordStatus,
        realtime_s: f64,
        duration_s: f64,
        local_state: u32,
    ) -> Option<Vec<MetricRecord>> {
        if !self.filter.matches(node_type) {
            return None;
        }
        let node = self.entries.get_mut(node_id)?;
        let records = node.render_records(timestamp, status, realtime_s, duration_s, local_state);
        node.counters_mut().reset();
        Some(records)
    }
}
