// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Rule-driven PII detection and masking for document pipelines

//! Scans configured string fields of structured documents for sensitive-data
//! patterns (emails, national IDs, card numbers, phone numbers, custom
//! rules), replaces matches with per-rule mask tokens, and shapes every
//! detection into an audit event. In strict mode a document with any match
//! is rejected instead of masked.
//!
//! Rules apply sequentially in rule-set order, each scanning the previous
//! rule's output; see [`PiiDetector::detect_and_mask`] for the ordering
//! contract.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pii_masking::{
//!     DocumentOutcome, JsonDocument, LogAuditSink, MaskingProcessor, PiiConfiguration,
//! };
//!
//! let config = Arc::new(PiiConfiguration::default());
//! let processor = MaskingProcessor::new(config, LogAuditSink);
//!
//! let doc = JsonDocument::new(
//!     "doc-1",
//!     "app-logs",
//!     serde_json::json!({"message": "Contact john.doe@example.com for more info"}),
//! );
//!
//! match processor.process(doc) {
//!     DocumentOutcome::Accepted(doc) => {
//!         assert_eq!(doc.body["message"], "Contact ****@example.com for more info");
//!     }
//!     DocumentOutcome::Blocked { rules } => panic!("unexpected block: {rules:?}"),
//! }
//! ```

pub mod audit;
pub mod config;
pub mod detector;
pub mod patterns;
pub mod processor;

pub use audit::{AuditAction, AuditEvent, AuditSink, LogAuditSink, MemoryAuditSink};
pub use config::{ConfigError, ConfigHandle, MaskingRule, PiiConfiguration, RuleSet};
pub use detector::{Detection, MaskingResult, PiiDetector};
pub use patterns::{compile_rules, CompiledRule, CompiledRules, RuleError, SkippedRule};
pub use processor::{Document, DocumentOutcome, JsonDocument, MaskingProcessor};
