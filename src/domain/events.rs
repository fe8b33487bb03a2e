//! Lifecycle events and the sinks that receive them.
//!
//! Decision code never logs directly. It publishes `LifecycleEvent`s to an
//! `EventSink` supplied by the host; `TracingSink` turns them into structured
//! `tracing` records.

use crate::domain::position::ExitReason;

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Entered {
        token_id: String,
        timestamp: i64,
        price: f64,
        size: f64,
    },
    EntryRejected {
        token_id: String,
        timestamp: i64,
        reason: String,
    },
    Exited {
        token_id: String,
        timestamp: i64,
        price: f64,
        reason: ExitReason,
    },
    CloseFailed {
        token_id: String,
        timestamp: i64,
        reason: String,
    },
    BarIgnored {
        token_id: String,
        timestamp: i64,
        last_timestamp: i64,
    },
}

impl LifecycleEvent {
    pub fn token_id(&self) -> &str {
        match self {
            LifecycleEvent::Entered { token_id, .. }
            | LifecycleEvent::EntryRejected { token_id, .. }
            | LifecycleEvent::Exited { token_id, .. }
            | LifecycleEvent::CloseFailed { token_id, .. }
            | LifecycleEvent::BarIgnored { token_id, .. } => token_id,
        }
    }
}

pub trait EventSink {
    fn emit(&mut self, event: LifecycleEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Entered {
                token_id,
                timestamp,
                price,
                size,
            } => tracing::info!(token = %token_id, timestamp, price, size, "entered position"),
            LifecycleEvent::EntryRejected {
                token_id,
                timestamp,
                reason,
            } => tracing::warn!(token = %token_id, timestamp, %reason, "entry rejected"),
            LifecycleEvent::Exited {
                token_id,
                timestamp,
                price,
                reason,
            } => tracing::info!(token = %token_id, timestamp, price, %reason, "exited position"),
            LifecycleEvent::CloseFailed {
                token_id,
                timestamp,
                reason,
            } => tracing::warn!(token = %token_id, timestamp, %reason, "close failed"),
            LifecycleEvent::BarIgnored {
                token_id,
                timestamp,
                last_timestamp,
            } => tracing::debug!(
                token = %token_id,
                timestamp,
                last_timestamp,
                "ignoring out-of-order bar"
            ),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<LifecycleEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LifecycleEvent::Entered { .. }))
            .count()
    }

    pub fn exits(&self) -> Vec<ExitReason> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LifecycleEvent::Exited { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: LifecycleEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: LifecycleEvent) {}
}
