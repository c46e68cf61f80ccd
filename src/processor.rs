// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Document-level masking: field traversal and the mask-or-block policy

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::audit::{AuditEvent, AuditSink};
use crate::config::PiiConfiguration;
use crate::detector::{Detection, PiiDetector};

/// Host-side document abstraction.
///
/// Paths are dotted (`user.email` addresses `{"user": {"email": ...}}`).
/// `get_str` returns `None` for absent fields and for fields that exist but
/// are not strings; both are skipped silently during processing.
pub trait Document {
    fn id(&self) -> &str;
    fn index(&self) -> &str;
    fn has_field(&self, path: &str) -> bool;
    fn get_str(&self, path: &str) -> Option<&str>;
    fn set_str(&mut self, path: &str, value: String);
}

/// Outcome of processing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome<D> {
    /// The document passed through, with any detected PII masked in place.
    Accepted(D),
    /// Strict mode rejected the document; no field was modified. Carries the
    /// distinct names of the rules that matched, in first-seen order.
    Blocked { rules: Vec<String> },
}

/// A document backed by a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    pub id: String,
    pub index: String,
    pub body: Value,
}

impl JsonDocument {
    pub fn new(id: impl Into<String>, index: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            body,
        }
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.body, |value, key| value.as_object()?.get(key))
    }
}

impl Document for JsonDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> &str {
        &self.index
    }

    fn has_field(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.lookup(path)?.as_str()
    }

    fn set_str(&mut self, path: &str, value: String) {
        let mut current = &mut self.body;
        let mut parts = path.split('.').peekable();

        while let Some(part) = parts.next() {
            let Some(object) = current.as_object_mut() else {
                return;
            };
            if parts.peek().is_none() {
                object.insert(part.to_string(), Value::String(value));
                return;
            }
            match object.get_mut(part) {
                Some(next) => current = next,
                None => return,
            }
        }
    }
}

/// Applies the configured rules to a document's fields and decides whether
/// to mask and continue or to block.
///
/// Built from one configuration snapshot; a processor never observes a
/// configuration change mid-document. Immutable and shareable across
/// threads once constructed.
pub struct MaskingProcessor<S: AuditSink> {
    config: Arc<PiiConfiguration>,
    detector: PiiDetector,
    audit: S,
}

impl<S: AuditSink> MaskingProcessor<S> {
    pub fn new(config: Arc<PiiConfiguration>, audit: S) -> Self {
        let detector = PiiDetector::new(&config.masking);
        Self {
            config,
            detector,
            audit,
        }
    }

    pub fn detector(&self) -> &PiiDetector {
        &self.detector
    }

    /// Scan the configured fields of `doc` in order.
    ///
    /// In strict mode the first field with any detection rejects the whole
    /// document: remaining fields are not scanned, nothing is written, and a
    /// block event is recorded. Otherwise each field with detections is
    /// rewritten with its masked text and a mask event is recorded per
    /// field. Fields that are absent or not strings are skipped.
    pub fn process<D: Document>(&self, mut doc: D) -> DocumentOutcome<D> {
        if !self.config.enabled {
            return DocumentOutcome::Accepted(doc);
        }

        for path in &self.config.fields_to_check {
            if !doc.has_field(path) {
                continue;
            }
            let Some(text) = doc.get_str(path) else {
                continue;
            };

            let result = self.detector.detect_and_mask(text);
            if !result.has_pii() {
                continue;
            }

            if self.config.strict_mode {
                let rules = distinct_rule_names(&result.detections);
                debug!(
                    doc_id = %doc.id(),
                    field = %path,
                    rules = %rules.join(","),
                    "blocking document in strict mode"
                );
                self.audit
                    .record(AuditEvent::blocked(doc.index(), doc.id(), rules.clone()));
                return DocumentOutcome::Blocked { rules };
            }

            let masked = result.masked_text.into_owned();
            let detections = result.detections;
            doc.set_str(path, masked);
            debug!(
                doc_id = %doc.id(),
                field = %path,
                count = detections.len(),
                "masked field"
            );
            self.audit.record(AuditEvent::masked(
                doc.index(),
                doc.id(),
                path.clone(),
                detections,
            ));
        }

        DocumentOutcome::Accepted(doc)
    }
}

fn distinct_rule_names(detections: &[Detection]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for detection in detections {
        if !names.iter().any(|name| *name == detection.rule) {
            names.push(detection.rule.clone());
        }
    }
    names
}
