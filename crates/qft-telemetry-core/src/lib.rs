//! Observed-node registry and metric data model for QF-Test run telemetry.
//!
//! This crate observes a hierarchical test-execution run (nested test sets,
//! test cases, procedure calls, sequences) and translates its lifecycle
//! events into flat, timestamped metric records for an external measurement
//! collector.
//!
//! # Architecture
//!
//! ```text
//! Host run events --> RunListener --> NodeRegistry --> MetricRecords --> Collector
//!                         |               |
//!                   ancestor walk    SignalCounters
//! ```
//!
//! # Key Concepts
//!
//! - **`MetricRecord`**: one (path, timestamp, unit, value, status) fact
//!   about one node at one point in time
//! - **`TrackedNode`**: a tracked tree node owning its metric path and
//!   per-scope signal counters
//! - **`NodeRegistry`**: the filtering and lifecycle authority, keyed by
//!   tree-node identity and retained for the whole run
//! - **`RunListener`**: thin glue that receives host lifecycle events,
//!   walks ancestor chains for problem propagation, and ships records to
//!   the collector
//!
//! # Delivery Contract
//!
//! The core is best-effort telemetry, never a test-blocking dependency.
//! No failure inside this crate escapes to the host run: collector faults
//! are logged and swallowed, missing display names degrade to best-effort
//! path segments, and events for unknown or filtered-out nodes are no-ops.
//!
//! # Example
//!
//! ```rust
//! use qft_telemetry_core::{NameSource, NodeRegistry, RecordStatus, Severity};
//!
//! let mut registry = NodeRegistry::default();
//! registry.track("node-1", "TestCase", NameSource::Qualified("Suite.Login"));
//! registry.signal("node-1", Severity::Error);
//!
//! let records = registry
//!     .emit(
//!         "node-1",
//!         "TestCase",
//!         chrono::Utc::now(),
//!         &RecordStatus::pass(),
//!         2.0,
//!         2.5,
//!         0,
//!     )
//!     .unwrap();
//! assert_eq!(records.len(), 6);
//! ```

pub mod collector;
pub mod config;
pub mod filter;
pub mod listener;
pub mod metric;
pub mod node;
pub mod registry;
pub mod signal;

#[cfg(test)]
mod tests;

pub use collector::{Collector, CollectorError, RecordingCollector};
pub use config::{ConfigError, RecordContext, TelemetryConfig};
pub use filter::{FilterError, ObservationFilter, DEFAULT_OBSERVED_NODES};
pub use listener::{EnteredEvent, ExitedEvent, ProblemEvent, RunListener, TreeNode};
pub use metric::{MetricKind, MetricRecord, RecordState, RecordStatus};
pub use node::{AncestorSegment, NodeCategory, TrackedNode};
pub use registry::{NameSource, NodeRegistry};
pub use signal::{ProblemState, Severity, SignalCounters};
