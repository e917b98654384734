//! Diagnostic events emitted by the orchestrator.
//!
//! The orchestrator reports what it does through an [`EventSink`] handed to
//! it at construction instead of logging inline. [`TracingSink`] forwards
//! events to `tracing`; [`RecordingSink`] keeps them for inspection.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::DataSource;
use crate::strategy::StrategyKind;

/// Something the orchestrator did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AcquisitionEvent {
    /// The query failed validation; nothing was sent.
    Rejected { reason: String },

    AttemptStarted {
        strategy: String,
        kind: StrategyKind,
        attempt: u32,
    },

    AttemptFailed {
        strategy: String,
        attempt: u32,
        error: String,
        retryable: bool,
    },

    /// A strategy used up its attempts; the chain moves on.
    StrategyExhausted { strategy: String, attempts: u32 },

    Succeeded {
        strategy: String,
        attempt: u32,
        records: usize,
        source: DataSource,
    },

    /// Every strategy failed and substitute data was generated.
    FellBack {
        region: String,
        records: usize,
        attempts: u32,
        reason: String,
    },
}

/// Receives orchestrator events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AcquisitionEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AcquisitionEvent) {
        match event {
            AcquisitionEvent::Rejected { reason } => {
                warn!(reason = %reason, "Query rejected");
            }
            AcquisitionEvent::AttemptStarted {
                strategy,
                kind,
                attempt,
            } => {
                debug!(strategy = %strategy, kind = ?kind, attempt, "Attempt started");
            }
            AcquisitionEvent::AttemptFailed {
                strategy,
                attempt,
                error,
                retryable,
            } => {
                warn!(strategy = %strategy, attempt, retryable, error = %error, "Attempt failed");
            }
            AcquisitionEvent::StrategyExhausted { strategy, attempts } => {
                warn!(strategy = %strategy, attempts, "Strategy exhausted");
            }
            AcquisitionEvent::Succeeded {
                strategy,
                attempt,
                records,
                source,
            } => {
                info!(strategy = %strategy, attempt, records, source = ?source, "Data acquired");
            }
            AcquisitionEvent::FellBack {
                region,
                records,
                attempts,
                reason,
            } => {
                warn!(
                    region = %region,
                    records,
                    attempts,
                    reason = %reason,
                    "All strategies failed, serving substitute data"
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AcquisitionEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AcquisitionEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, AcquisitionEvent::AttemptStarted { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AcquisitionEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
