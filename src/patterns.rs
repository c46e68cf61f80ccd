// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Per-rule pattern compilation
// Invalid patterns are skipped with a diagnostic, never fatal

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use thiserror::Error;
use tracing::warn;

use crate::config::{MaskingRule, RuleSet};

/// Why a rule was left out of the compiled set.
#[derive(Debug, Error)]
#[error("invalid pattern `{pattern}`: {source}")]
pub struct RuleError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A rule that failed to compile, with the reason the caller can surface.
#[derive(Debug)]
pub struct SkippedRule {
    pub name: String,
    pub reason: RuleError,
}

/// A rule whose pattern compiled, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub regex: Regex,
    pub mask: String,
}

/// All compiled rules, in rule-set order.
///
/// The `RegexSet` spans the same patterns and backs the presence check;
/// `skipped` records the rules that were dropped at compile time.
#[derive(Debug)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
    regex_set: Option<RegexSet>,
    skipped: Vec<SkippedRule>,
}

impl CompiledRules {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if any compiled rule matches, short-circuiting at the first hit.
    pub fn any_match(&self, text: &str) -> bool {
        match &self.regex_set {
            Some(set) => set.is_match(text),
            None => self.rules.iter().any(|rule| rule.regex.is_match(text)),
        }
    }
}

/// Compile a rule set, keeping only the rules whose pattern text compiles.
///
/// Compilation failures are a configuration-authoring error: the rule is
/// skipped, a warning is logged, and the failure is retained in
/// [`CompiledRules::skipped`]. The output is always a subset of the input
/// keys and construction itself never fails.
pub fn compile_rules(rules: &RuleSet) -> CompiledRules {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut pattern_texts = Vec::with_capacity(rules.len());
    let mut skipped = Vec::new();

    for (name, rule) in rules {
        match Regex::new(&rule.pattern) {
            Ok(regex) => {
                pattern_texts.push(rule.pattern.clone());
                compiled.push(CompiledRule {
                    name: name.clone(),
                    regex,
                    mask: rule.mask.clone(),
                });
            }
            Err(source) => {
                warn!(rule = %name, error = %source, "skipping rule with invalid pattern");
                skipped.push(SkippedRule {
                    name: name.clone(),
                    reason: RuleError {
                        pattern: rule.pattern.clone(),
                        source,
                    },
                });
            }
        }
    }

    // Every pattern already compiled individually, so the set compiles too
    // unless the combined program exceeds the regex size limit. Fall back to
    // per-rule scanning in that case rather than losing matches.
    let regex_set = if pattern_texts.is_empty() {
        None
    } else {
        match RegexSet::new(&pattern_texts) {
            Ok(set) => Some(set),
            Err(error) => {
                warn!(%error, "combined matcher too large; presence checks scan per rule");
                None
            }
        }
    };

    CompiledRules {
        rules: compiled,
        regex_set,
        skipped,
    }
}

/// Default rule definitions (name, pattern, mask).
type RuleDef = (&'static str, &'static str, &'static str);

static DEFAULT_RULES: Lazy<Vec<RuleDef>> = Lazy::new(|| {
    vec![
        (
            "email",
            r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
            "****@example.com",
        ),
        ("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "***-**-****"),
        (
            "credit_card",
            r"\b(?:\d[ -]*?){13,16}\b",
            "****-****-****-****",
        ),
        ("phone", r"\b\d{3}-\d{3}-\d{4}\b", "***-***-****"),
    ]
});

/// The rule set shipped as the starting configuration.
pub fn default_rule_set() -> RuleSet {
    DEFAULT_RULES
        .iter()
        .map(|(name, pattern, mask)| (name.to_string(), MaskingRule::new(*pattern, *mask)))
        .collect()
}
