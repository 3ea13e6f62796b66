//! Tracked node variants and metric path construction.
//!
//! Every observed tree node is represented by one [`TrackedNode`] holding
//! a fixed base path and the signal counters for the node's open scope.
//! The category decides both how the base path is built and which record
//! set the node emits at exit:
//!
//! | Category | base path | records at exit |
//! |----------|-----------|-----------------|
//! | `TestCase` | `QF-Test/Testcase/<qualified name>` | 6 |
//! | `TestSet` | `QF-Test/Testset/<qualified name>` | 6 |
//! | `Procedure` | `QF-Test/Procedure/<call name>` | 3 |
//! | `Sequence` | `QF-Test/Testcase/<ancestor segments>` | 6 |
//!
//! Sequences have no qualified name of their own, so their path is
//! reconstructed from the ancestor chain at discovery time: named
//! containers (test cases, test sets, procedure calls) contribute their
//! short name, anonymous structural nodes their full tree name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metric::{MetricKind, MetricRecord, RecordStatus};
use crate::signal::SignalCounters;

/// Root segment prefixed to every metric path.
pub const ROOT_SEGMENT: &str = "QF-Test";

/// Category of a tracked node, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// A procedure call; reports duration, realtime and state only.
    Procedure,
    /// A test case; reports the full six-record set.
    TestCase,
    /// A test set; reports the full six-record set.
    TestSet,
    /// Fallback for sequence-like nodes; behaves like a test case with a
    /// different path construction rule.
    Sequence,
}

impl NodeCategory {
    /// Derives the category from the host's node type string.
    #[must_use]
    pub fn from_node_type(node_type: &str) -> Self {
        match node_type {
            "TestCase" => Self::TestCase,
            "TestSet" => Self::TestSet,
            "ProcedureCall" => Self::Procedure,
            _ => Self::Sequence,
        }
    }

    /// Returns `true` if exit records include the counter snapshots.
    #[must_use]
    pub const fn reports_counters(self) -> bool {
        !matches!(self, Self::Procedure)
    }
}

/// One ancestor in the root-to-node chain used for sequence paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorSegment {
    /// The host's node type string for this ancestor.
    pub node_type: String,
    /// Short display name.
    pub name: String,
    /// Full tree-qualified name.
    pub tree_name: String,
}

impl AncestorSegment {
    /// Creates a segment from its three display inputs.
    #[must_use]
    pub fn new(
        node_type: impl Into<String>,
        name: impl Into<String>,
        tree_name: impl Into<String>,
    ) -> Self {
        Self {
            node_type: node_type.into(),
            name: name.into(),
            tree_name: tree_name.into(),
        }
    }

    /// The segment this ancestor contributes to a sequence path.
    ///
    /// Named containers use their short name, anonymous structural nodes
    /// their full tree name.
    fn path_segment(&self) -> &str {
        match self.node_type.as_str() {
            "TestCase" | "TestSet" | "ProcedureCall" => &self.name,
            _ => &self.tree_name,
        }
    }
}

/// A tree node under observation: category, fixed base path, counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedNode {
    category: NodeCategory,
    base_path: Vec<String>,
    counters: SignalCounters,
}

impl TrackedNode {
    /// Creates a tracked test case from its dot-qualified name.
    #[must_use]
    pub fn test_case(qualified_name: &str) -> Self {
        Self::with_qualified_path(NodeCategory::TestCase, "Testcase", qualified_name)
    }

    /// Creates a tracked test set from its dot-qualified name.
    #[must_use]
    pub fn test_set(qualified_name: &str) -> Self {
        Self::with_qualified_path(NodeCategory::TestSet, "Testset", qualified_name)
    }

    /// Creates a tracked procedure from its call name.
    #[must_use]
    pub fn procedure(call_name: &str) -> Self {
        Self::with_qualified_path(NodeCategory::Procedure, "Procedure", call_name)
    }

    /// Creates a tracked sequence from the root-to-node ancestor chain.
    ///
    /// Ancestors with empty display segments are skipped rather than
    /// producing empty path elements; an empty chain degrades to the bare
    /// `QF-Test/Testcase` prefix.
    #[must_use]
    pub fn sequence(ancestors: &[AncestorSegment]) -> Self {
        let mut base_path = vec![ROOT_SEGMENT.to_string(), "Testcase".to_string()];
        for ancestor in ancestors {
            let segment = ancestor.path_segment();
            if !segment.is_empty() {
                base_path.push(segment.to_string());
            }
        }
        Self {
            category: NodeCategory::Sequence,
            base_path,
            counters: SignalCounters::new(),
        }
    }

    fn with_qualified_path(category: NodeCategory, prefix: &str, name: &str) -> Self {
        let mut base_path = vec![ROOT_SEGMENT.to_string(), prefix.to_string()];
        base_path.extend(
            name.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
        Self {
            category,
            base_path,
            counters: SignalCounters::new(),
        }
    }

    /// The node's category.
    #[must_use]
    pub const fn category(&self) -> NodeCategory {
        self.category
    }

    /// The node's fixed base path.
    #[must_use]
    pub fn base_path(&self) -> &[String] {
        &self.base_path
    }

    /// The node's signal counters.
    #[must_use]
    pub const fn counters(&self) -> &SignalCounters {
        &self.counters
    }

    /// Mutable access to the node's signal counters.
    pub fn counters_mut(&mut self) -> &mut SignalCounters {
        &mut self.counters
    }

    /// Full metric path for one record kind.
    #[must_use]
    pub fn metric_path(&self, kind: MetricKind) -> Vec<String> {
        let mut path = self.base_path.clone();
        path.extend(kind.suffix().iter().map(|s| (*s).to_string()));
        path
    }

    /// Renders the node's exit record set.
    ///
    /// Duration, realtime and state are always present; test cases, test
    /// sets and sequences additionally snapshot their exception, error and
    /// warning counters. Pure data assembly, never fails.
    #[must_use]
    pub fn render_records(
        &self,
        timestamp: DateTime<Utc>,
        status: &RecordStatus,
        realtime_s: f64,
        duration_s: f64,
        local_state: u32,
    ) -> Vec<MetricRecord> {
        let record = |kind: MetricKind, value: f64| {
            MetricRecord::new(
                self.metric_path(kind),
                timestamp,
                kind.unit(),
                value,
                status.clone(),
            )
        };

        let mut records = vec![
            record(MetricKind::Duration, duration_s),
            record(MetricKind::Realtime, realtime_s),
            record(MetricKind::State, f64::from(local_state)),
        ];
        if self.category.reports_counters() {
            records.push(record(MetricKind::Exceptions, f64::from(self.counters.exceptions)));
            records.push(record(MetricKind::Errors, f64::from(self.counters.errors)));
            records.push(record(MetricKind::Warnings, f64::from(self.counters.warnings)));
        }
        records
    }
}
