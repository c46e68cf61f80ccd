// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration model for the PII masking engine

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns;

/// A single masking rule: what to find and what to replace it with.
///
/// The pattern text is not validated here; rules with invalid patterns are
/// dropped (with a diagnostic) when the rule set is compiled, so one broken
/// rule never takes down the rest of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingRule {
    pub pattern: String,
    pub mask: String,
}

impl MaskingRule {
    pub fn new(pattern: impl Into<String>, mask: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mask: mask.into(),
        }
    }
}

/// Named masking rules in configuration-document order.
///
/// Insertion order is the order rules are applied during a scan, so rule
/// authors control the sequential masking behavior by ordering the `masking`
/// object in the configuration document.
pub type RuleSet = IndexMap<String, MaskingRule>;

/// Errors from parsing a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine configuration, mirroring the JSON configuration document.
///
/// Every field has a default so a partial document parses. A configuration
/// is an immutable value: live updates replace the whole value through a
/// [`ConfigHandle`], never mutate one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiConfiguration {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audit_index")]
    pub audit_index: String,
    #[serde(default = "patterns::default_rule_set")]
    pub masking: RuleSet,
    #[serde(default = "default_fields_to_check")]
    pub fields_to_check: Vec<String>,
    #[serde(default)]
    pub strict_mode: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_audit_index() -> String {
    "pii-audit-log".to_string()
}

fn default_fields_to_check() -> Vec<String> {
    vec![
        "message".to_string(),
        "user.email".to_string(),
        "details".to_string(),
    ]
}

impl Default for PiiConfiguration {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            audit_index: default_audit_index(),
            masking: patterns::default_rule_set(),
            fields_to_check: default_fields_to_check(),
            strict_mode: false,
        }
    }
}

impl PiiConfiguration {
    /// Parse a configuration document, filling in defaults for absent fields.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }
}

/// Shared slot holding the current configuration snapshot.
///
/// Readers get an `Arc` to a complete, immutable snapshot; `replace` swaps
/// the whole value with last-writer-wins semantics. An in-flight scan keeps
/// using whichever snapshot it was built with.
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<PiiConfiguration>>,
}

impl ConfigHandle {
    pub fn new(config: PiiConfiguration) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The current configuration snapshot.
    pub fn current(&self) -> Arc<PiiConfiguration> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the current configuration with a new snapshot.
    pub fn replace(&self, config: PiiConfiguration) {
        let mut slot = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Arc::new(config);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(PiiConfiguration::default())
    }
}
