// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Audit event shaping and recorder sinks

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::detector::Detection;

/// What happened to a document during masking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    /// A field's value was rewritten; carries every detection for the field.
    Masked {
        field: String,
        detections: Vec<Detection>,
    },
    /// The document was rejected in strict mode; carries the distinct rule
    /// names that matched.
    Blocked { rules: Vec<String> },
}

/// One recorded masking or blocking event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub index: String,
    pub document_id: String,
    #[serde(flatten)]
    pub action: AuditAction,
}

impl AuditEvent {
    pub fn masked(
        index: impl Into<String>,
        document_id: impl Into<String>,
        field: impl Into<String>,
        detections: Vec<Detection>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            index: index.into(),
            document_id: document_id.into(),
            action: AuditAction::Masked {
                field: field.into(),
                detections,
            },
        }
    }

    pub fn blocked(
        index: impl Into<String>,
        document_id: impl Into<String>,
        rules: Vec<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            index: index.into(),
            document_id: document_id.into(),
            action: AuditAction::Blocked { rules },
        }
    }
}

/// Recorder for masking and blocking events.
///
/// Fire-and-forget: implementations must not panic back into the masking
/// path. The engine attempts delivery once per event; retries and sink
/// failures belong to the sink.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

impl<S: AuditSink> AuditSink for Arc<S> {
    fn record(&self, event: AuditEvent) {
        (**self).record(event);
    }
}

/// Sink that emits each event to the operational log under the `pii_audit`
/// target, one line per detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        match &event.action {
            AuditAction::Masked { field, detections } => {
                for detection in detections {
                    info!(
                        target: "pii_audit",
                        event_id = %event.event_id,
                        timestamp = %event.timestamp.to_rfc3339(),
                        action = "masked",
                        index = %event.index,
                        doc_id = %event.document_id,
                        field = %field,
                        rule = %detection.rule,
                        original = %detection.original_value,
                        masked = %detection.masked_value,
                        "masked field value"
                    );
                }
            }
            AuditAction::Blocked { rules } => {
                info!(
                    target: "pii_audit",
                    event_id = %event.event_id,
                    timestamp = %event.timestamp.to_rfc3339(),
                    action = "blocked",
                    index = %event.index,
                    doc_id = %event.document_id,
                    rules = %rules.join(","),
                    "blocked document"
                );
            }
        }
    }
}

/// In-memory sink that captures events, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All recorded events, in delivery order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.lock().push(event);
    }
}
