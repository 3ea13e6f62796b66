//! External collector seam.
//!
//! The transport client, endpoint discovery and retry policy are owned by
//! the collector implementation, not by the core. The core only hands
//! over finished records and logs delivery failures; it never retries.

use thiserror::Error;

use crate::config::RecordContext;
use crate::metric::MetricRecord;

/// Errors a collector implementation can report on delivery.
///
/// Opaque to the core: every variant is logged and swallowed at the
/// listener boundary, never surfaced to the host run.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The collector endpoint is not reachable or not configured.
    #[error("collector endpoint unavailable: {reason}")]
    Unavailable {
        /// Why the endpoint is unavailable.
        reason: String,
    },

    /// The collector rejected the records.
    #[error("collector rejected records: {reason}")]
    Rejected {
        /// The collector's rejection message.
        reason: String,
    },

    /// Transport-level failure while sending.
    #[error("collector transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

/// Sink for finished metric records.
///
/// Implementations wrap the external measurement collector's client.
/// Delivery is fire-and-forget from the core's point of view: a returned
/// error is logged and the records are discarded.
pub trait Collector {
    /// Announces the per-run record context.
    ///
    /// Called once at listener construction and again whenever the
    /// context changes (the host run id arriving at run start).
    /// Implementations tag all subsequent records with it, typically by
    /// rebuilding their client session. The default does nothing.
    fn context_changed(&mut self, context: &RecordContext) {
        let _ = context;
    }

    /// Delivers a single immediate record (incident reporting).
    ///
    /// # Errors
    ///
    /// Returns a [`CollectorError`] if delivery fails; the core swallows
    /// it.
    fn add_record(&mut self, record: MetricRecord) -> Result<(), CollectorError>;

    /// Delivers an ordered batch of records (node-exit snapshot).
    ///
    /// # Errors
    ///
    /// Returns a [`CollectorError`] if delivery fails; the core swallows
    /// it.
    fn add_records(&mut self, records: Vec<MetricRecord>) -> Result<(), CollectorError>;
}

/// In-memory collector capturing records for assertions.
///
/// Test double used throughout the crate's tests; `fail_deliveries`
/// exercises the swallow path.
#[derive(Debug, Default)]
pub struct RecordingCollector {
    /// All records received, in delivery order.
    pub records: Vec<MetricRecord>,
    /// Number of batch deliveries received.
    pub batches: usize,
    /// The most recently announced record context.
    pub context: Option<RecordContext>,
    /// Number of context announcements received.
    pub context_changes: usize,
    /// When `true`, every delivery fails with an unavailable error.
    pub fail_deliveries: bool,
}

impl RecordingCollector {
    /// Creates an empty recording collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector that fails every delivery.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_deliveries: true,
            ..Self::default()
        }
    }
}

impl Collector for RecordingCollector {
    fn context_changed(&mut self, context: &RecordContext) {
        self.context = Some(context.clone());
        self.context_changes += 1;
    }

    fn add_record(&mut self, record: MetricRecord) -> Result<(), CollectorError> {
        if self.fail_deliveries {
            return Err(CollectorError::Unavailable {
                reason: "recording collector set to fail".to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    fn add_records(&mut self, records: Vec<MetricRecord>) -> Result<(), CollectorError> {
        if self.fail_deliveries {
            return Err(CollectorError::Unavailable {
                reason: "recording collector set to fail".to_string(),
            });
        }
        self.batches += 1;
        self.records.extend(records);
        Ok(())
    }
}
