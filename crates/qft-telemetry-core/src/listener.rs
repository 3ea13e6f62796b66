//! Run listener: boundary glue between host lifecycle events and the core.
//!
//! The listener receives the three host callbacks (node entered, problem
//! occurred, node exited), delegates registry work, walks ancestor chains
//! for problem propagation, and ships finished records to the collector.
//!
//! # Event Flow
//!
//! ```text
//! NodeEntered   --> NodeRegistry::track
//! ProblemOccurred --> signal every tracked ancestor (child -> root)
//!                 --> immediate incident record (Error/Exception only)
//! NodeExited    --> NodeRegistry::emit --> Collector::add_records
//! ```
//!
//! # Contract
//!
//! Every entry point returns `()`: best-effort telemetry must never become
//! a test-blocking dependency. Collector faults are logged via `tracing`
//! and swallowed; counter resets are not rolled back on delivery failure.
//!
//! All calls arrive on the single thread driving the host run, strictly
//! ordered entered -> problems -> exited per node, so no locking is
//! needed here.

use chrono::{DateTime, Utc};

use crate::collector::Collector;
use crate::config::{RecordContext, TelemetryConfig};
use crate::filter::FilterError;
use crate::metric::{MetricRecord, RecordStatus};
use crate::node::{AncestorSegment, NodeCategory, ROOT_SEGMENT};
use crate::registry::{NameSource, NodeRegistry};
use crate::signal::{ProblemState, Severity};

/// Host-provided view of one node in the execution tree.
///
/// The core does not own the tree and cannot traverse it beyond "ask for
/// my parent"; the host keeps these accessors valid for the duration of
/// the callback.
pub trait TreeNode {
    /// Unique identity of this node instance within the run.
    fn id(&self) -> &str;

    /// The host's node type string, e.g. `"TestCase"`.
    fn node_type(&self) -> &str;

    /// Short display name.
    fn name(&self) -> &str;

    /// Full tree-qualified name.
    fn tree_name(&self) -> &str;

    /// Dot-qualified name, where the host knows one for this node.
    fn qualified_name(&self) -> Option<String> {
        None
    }

    /// Parent node, `None` at the root.
    fn parent(&self) -> Option<&dyn TreeNode> {
        None
    }
}

/// A node-entered lifecycle event.
#[derive(Clone, Copy)]
pub struct EnteredEvent<'a> {
    /// The node being entered.
    pub node: &'a dyn TreeNode,
}

/// A problem reported while some node's scope is open.
pub struct ProblemEvent<'a> {
    /// The node at which the problem was raised.
    pub node: &'a dyn TreeNode,
    /// The host's numeric state index for the problem.
    ///
    /// Mapped via [`ProblemState::from_state_code`]; unknown codes make
    /// the whole event a no-op.
    pub state_code: u32,
    /// The problem message.
    pub message: String,
    /// When the problem occurred.
    pub timestamp: DateTime<Utc>,
    /// The test case currently executing, if any (incident path input).
    pub current_test_case: Option<&'a dyn TreeNode>,
}

/// A node-exited lifecycle event with its timing inputs.
pub struct ExitedEvent<'a> {
    /// The node being exited.
    pub node: &'a dyn TreeNode,
    /// When the node was exited.
    pub timestamp: DateTime<Utc>,
    /// Exit status for the records of this snapshot.
    pub status: RecordStatus,
    /// Numeric local state code of the node at exit.
    pub local_state: u32,
    /// Time spent executing user actions, in seconds.
    pub realtime_s: f64,
    /// Wall-clock time including pauses, in seconds.
    pub duration_s: f64,
}

/// Translates host lifecycle events into metric records.
pub struct RunListener<C> {
    registry: NodeRegistry,
    collector: C,
    context: RecordContext,
}

impl<C: Collector> RunListener<C> {
    /// Creates a listener from a configuration and a collector.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if the configured observed-nodes pattern
    /// does not compile.
    pub fn new(config: &TelemetryConfig, mut collector: C) -> Result<Self, FilterError> {
        let registry = NodeRegistry::new(config.filter()?);
        let context = config.context();
        collector.context_changed(&context);
        Ok(Self {
            registry,
            collector,
            context,
        })
    }

    /// The per-run record context (instance id and platform tags).
    #[must_use]
    pub const fn context(&self) -> &RecordContext {
        &self.context
    }

    /// Read access to the registry, mainly for assertions and inspection.
    #[must_use]
    pub const fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The wrapped collector.
    #[must_use]
    pub const fn collector(&self) -> &C {
        &self.collector
    }

    /// Consumes the listener, returning the collector.
    pub fn into_collector(self) -> C {
        self.collector
    }

    /// Adopts the host's run id as the instance identifier for this run.
    ///
    /// The updated context is announced to the collector so all further
    /// records are tagged with the new id. An unchanged or empty id
    /// leaves the collector untouched.
    pub fn run_started(&mut self, run_id: &str) {
        if run_id.is_empty() || run_id == self.context.instance_id {
            return;
        }
        self.context.instance_id = run_id.to_string();
        self.collector.context_changed(&self.context);
    }

    /// Handles a node-entered event.
    ///
    /// Derives the category-specific display name and delegates to the
    /// registry; everything else (filtering, idempotent re-entry) happens
    /// there.
    pub fn node_entered(&mut self, event: &EnteredEvent<'_>) {
        let node = event.node;
        match NodeCategory::from_node_type(node.node_type()) {
            NodeCategory::TestCase | NodeCategory::TestSet => {
                // Fall back to the short name when no qualified name is known.
                let name = node
                    .qualified_name()
                    .unwrap_or_else(|| node.name().to_string());
                self.registry
                    .track(node.id(), node.node_type(), NameSource::Qualified(&name));
            },
            NodeCategory::Procedure => {
                self.registry
                    .track(node.id(), node.node_type(), NameSource::Plain(node.name()));
            },
            NodeCategory::Sequence => {
                let chain = ancestor_chain(node);
                self.registry
                    .track(node.id(), node.node_type(), NameSource::Ancestors(&chain));
            },
        }
    }

    /// Handles a problem event.
    ///
    /// Walks the ancestor chain from the raising node to the root,
    /// incrementing every tracked ancestor: counts are cumulative across
    /// nesting, never exclusive. Errors and exceptions additionally send
    /// an immediate incident record; warnings aggregate only.
    pub fn problem_occurred(&mut self, event: &ProblemEvent<'_>) {
        let Some(state) = ProblemState::from_state_code(event.state_code) else {
            tracing::debug!(
                state_code = event.state_code,
                node_id = event.node.id(),
                "ignoring problem with unknown state code"
            );
            return;
        };
        let Some(severity) = state.severity() else {
            // Informational states do not aggregate.
            return;
        };

        let mut current: Option<&dyn TreeNode> = Some(event.node);
        while let Some(step) = current {
            self.registry.signal(step.id(), severity);
            current = step.parent();
        }

        if matches!(severity, Severity::Warning) {
            // Warnings aggregate into counters but trigger no incident.
            return;
        }

        let record = self.incident_record(event, state, severity);
        if let Err(err) = self.collector.add_record(record) {
            tracing::warn!(
                error = %err,
                node_id = event.node.id(),
                severity = severity.name(),
                "failed to deliver incident record"
            );
        }
    }

    /// Handles a node-exited event.
    ///
    /// Emits the node's record set and ships it as one batch. Counter
    /// reset happened inside `emit`; a delivery failure is logged and
    /// does not roll it back.
    pub fn node_exited(&mut self, event: &ExitedEvent<'_>) {
        let node = event.node;
        let Some(records) = self.registry.emit(
            node.id(),
            node.node_type(),
            event.timestamp,
            &event.status,
            event.realtime_s,
            event.duration_s,
            event.local_state,
        ) else {
            return;
        };

        let count = records.len();
        if let Err(err) = self.collector.add_records(records) {
            tracing::warn!(
                error = %err,
                node_id = node.id(),
                records = count,
                "failed to deliver node-exit records"
            );
        } else {
            tracing::debug!(node_id = node.id(), records = count, "node-exit records delivered");
        }
    }

    /// Builds the immediate incident record for an error or exception.
    ///
    /// Path: `QF-Test/Incidents/<severity>/<test case>/<raising node tree
    /// name>`, with the tree name split on `/` into further segments.
    fn incident_record(
        &self,
        event: &ProblemEvent<'_>,
        state: ProblemState,
        severity: Severity,
    ) -> MetricRecord {
        let mut path = vec![
            ROOT_SEGMENT.to_string(),
            "Incidents".to_string(),
            severity.name().to_string(),
        ];
        if let Some(test_case) = event.current_test_case {
            if !test_case.name().is_empty() {
                path.push(test_case.name().to_string());
            }
        }
        path.extend(
            event
                .node
                .tree_name()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );

        MetricRecord::new(
            path,
            event.timestamp,
            severity.incident_unit(),
            1.0,
            RecordStatus::fail(state.status_code(), event.message.clone()),
        )
    }
}

/// Collects the root-to-node ancestor chain via the parent accessor.
fn ancestor_chain(node: &dyn TreeNode) -> Vec<AncestorSegment> {
    let mut chain = Vec::new();
    let mut current: Option<&dyn TreeNode> = Some(node);
    while let Some(step) = current {
        chain.push(AncestorSegment::new(
            step.node_type(),
            step.name(),
            step.tree_name(),
        ));
        current = step.parent();
    }
    chain.reverse();
    chain
}
