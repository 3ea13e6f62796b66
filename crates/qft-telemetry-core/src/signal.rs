//! Signal counters and problem severity classification.
//!
//! Each tracked node owns one [`SignalCounters`] instance. Counters
//! accumulate while the node's scope is open and are reset to zero when
//! the node's exit records are emitted, so the accounting epoch is one
//! execution span, not the run's lifetime.

use serde::{Deserialize, Serialize};

/// Problem severities that aggregate into per-node counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// A reported error.
    Error,
    /// A thrown exception.
    Exception,
    /// A reported warning.
    Warning,
}

impl Severity {
    /// Display name used in incident record paths.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Exception => "Exception",
            Self::Warning => "Warning",
        }
    }

    /// Unit string used for immediate incident records.
    #[must_use]
    pub const fn incident_unit(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Exception => "exception",
            Self::Warning => "warnings",
        }
    }
}

/// The full set of run states the host can report for a problem event.
///
/// Only `Error`, `Exception` and `Warning` aggregate into counters; the
/// informational states are intentionally not aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemState {
    /// Nominal state, nothing to report.
    Ok,
    /// A warning was reported.
    Warning,
    /// An error was reported.
    Error,
    /// An exception was thrown.
    Exception,
    /// The node was skipped.
    Skipped,
    /// The node is not implemented.
    NotImplemented,
}

impl ProblemState {
    /// Maps the host's numeric state index to a problem state.
    #[must_use]
    pub const fn from_state_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            3 => Some(Self::Exception),
            4 => Some(Self::Skipped),
            5 => Some(Self::NotImplemented),
            _ => None,
        }
    }

    /// The host's numeric state index.
    #[must_use]
    pub const fn state_code(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Exception => 3,
            Self::Skipped => 4,
            Self::NotImplemented => 5,
        }
    }

    /// Status code string carried in record statuses.
    #[must_use]
    pub const fn status_code(self) -> &'static str {
        match self {
            Self::Ok => "QF-Test.OK",
            Self::Warning => "QF-Test.WARNING",
            Self::Error => "QF-Test.ERROR",
            Self::Exception => "QF-Test.EXCEPTION",
            Self::Skipped => "QF-Test.SKIPPED",
            Self::NotImplemented => "QF-Test.NOT_IMPLEMENTED",
        }
    }

    /// The aggregating severity for this state, if any.
    ///
    /// Informational states (`Ok`, `Skipped`, `NotImplemented`) return
    /// `None` and are dropped by problem propagation.
    #[must_use]
    pub const fn severity(self) -> Option<Severity> {
        match self {
            Self::Error => Some(Severity::Error),
            Self::Exception => Some(Severity::Exception),
            Self::Warning => Some(Severity::Warning),
            Self::Ok | Self::Skipped | Self::NotImplemented => None,
        }
    }
}

/// Per-node counters for problems observed while the node's scope is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounters {
    /// Number of errors signalled into this scope.
    pub errors: u32,
    /// Number of exceptions signalled into this scope.
    pub exceptions: u32,
    /// Number of warnings signalled into this scope.
    pub warnings: u32,
}

impl SignalCounters {
    /// Creates counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter matching the given severity.
    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Exception => self.exceptions += 1,
            Severity::Warning => self.warnings += 1,
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` if all counters are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.errors == 0 && self.exceptions == 0 && self.warnings == 0
    }
}
