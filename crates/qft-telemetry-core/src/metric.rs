//! Metric record data model.
//!
//! A [`MetricRecord`] is one fact about one node at one point in time.
//! Records are immutable once constructed; the receiving collector is
//! responsible for any aggregation across observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome state attached to a metric record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    /// The observation belongs to a passing scope.
    Pass,
    /// The observation belongs to a failing scope.
    Fail,
}

/// Status block carried by every metric record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatus {
    /// Pass/fail classification.
    pub state: RecordState,
    /// Status code, e.g. `"0"` or `"QF-Test.ERROR"`.
    pub code: String,
    /// Human-readable message, empty for passing records.
    pub message: String,
}

impl RecordStatus {
    /// Creates the passing status used for regular node-exit records.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            state: RecordState::Pass,
            code: "0".to_string(),
            message: String::new(),
        }
    }

    /// Creates a failing status with the given code and message.
    #[must_use]
    pub fn fail(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: RecordState::Fail,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the status is passing.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self.state, RecordState::Pass)
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::pass()
    }
}

/// The metric kinds a tracked node can report at exit.
///
/// Each kind contributes a fixed path suffix appended to the node's base
/// path, and a fixed unit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Wall-clock time spent in the node, including pauses.
    Duration,
    /// Time spent executing user actions inside the node.
    Realtime,
    /// Numeric local state code of the node at exit.
    State,
    /// Accumulated exception count for the node's scope.
    Exceptions,
    /// Accumulated error count for the node's scope.
    Errors,
    /// Accumulated warning count for the node's scope.
    Warnings,
}

impl MetricKind {
    /// Path segments appended after the node's base path.
    #[must_use]
    pub const fn suffix(self) -> &'static [&'static str] {
        match self {
            Self::Duration => &["Duration"],
            Self::Realtime => &["Realtime"],
            Self::State => &["Result", "State"],
            Self::Exceptions => &["Result", "Exceptions"],
            Self::Errors => &["Result", "Errors"],
            Self::Warnings => &["Result", "Warnings"],
        }
    }

    /// Unit string reported alongside the value.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Duration | Self::Realtime => "s",
            Self::State => "code",
            Self::Exceptions => "exceptions",
            Self::Errors => "errors",
            Self::Warnings => "warnings",
        }
    }
}

/// One timestamped measurement destined for the external collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Hierarchical path identifying the measurement.
    pub path: Vec<String>,
    /// Moment the observation was made.
    pub timestamp: DateTime<Utc>,
    /// Unit of the value, e.g. `"s"` or `"errors"`.
    pub unit: String,
    /// Observed value.
    pub value: f64,
    /// Pass/fail status of the observed scope.
    pub status: RecordStatus,
}

impl MetricRecord {
    /// Creates a new metric record.
    #[must_use]
    pub fn new(
        path: Vec<String>,
        timestamp: DateTime<Utc>,
        unit: impl Into<String>,
        value: f64,
        status: RecordStatus,
    ) -> Self {
        Self {
            path,
            timestamp,
            unit: unit.into(),
            value,
            status,
        }
    }

    /// Returns the path joined with `/`, as collectors usually display it.
    #[must_use]
    pub fn path_display(&self) -> String {
        self.path.join("/")
    }
}
