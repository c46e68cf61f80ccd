// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Core PII detection and masking logic
// Sequential scan-and-replace with copy-on-write output

use std::borrow::Cow;

use serde::Serialize;

use crate::config::RuleSet;
use crate::patterns::{compile_rules, CompiledRules, SkippedRule};

/// A single occurrence of a rule match, before and after masking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// Name of the rule that matched.
    pub rule: String,
    /// The matched substring as it appeared in the scanned text.
    pub original_value: String,
    /// The literal mask that replaced it.
    pub masked_value: String,
}

/// Result of one scan over a text value.
///
/// `masked_text` borrows the input when nothing matched, so the no-PII path
/// allocates nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskingResult<'a> {
    pub masked_text: Cow<'a, str>,
    pub detections: Vec<Detection>,
}

impl MaskingResult<'_> {
    pub fn has_pii(&self) -> bool {
        !self.detections.is_empty()
    }
}

/// Detector holding the compiled matchers for one rule set.
///
/// Immutable after construction and safe to share across threads; every
/// scan runs against the same compiled state with no per-call mutation.
///
/// # Example
///
/// ```
/// use pii_masking::{patterns, PiiDetector};
///
/// let detector = PiiDetector::new(&patterns::default_rule_set());
/// let result = detector.detect_and_mask("SSN: 123-45-6789");
///
/// assert_eq!(result.masked_text, "SSN: ***-**-****");
/// assert_eq!(result.detections[0].rule, "ssn");
/// ```
#[derive(Debug)]
pub struct PiiDetector {
    compiled: CompiledRules,
}

impl PiiDetector {
    /// Build a detector from a rule set.
    ///
    /// Never fails: rules with invalid patterns are dropped and reported
    /// through [`skipped_rules`](Self::skipped_rules).
    pub fn new(rules: &RuleSet) -> Self {
        Self {
            compiled: compile_rules(rules),
        }
    }

    /// Rules that were dropped at compile time, with their failure reasons.
    pub fn skipped_rules(&self) -> &[SkippedRule] {
        self.compiled.skipped()
    }

    /// Scan `text` and replace every match with its rule's mask string.
    ///
    /// Rules apply sequentially in rule-set order, each scanning the output
    /// of the previous rule, not the original text. Within one rule the scan
    /// is the usual leftmost non-overlapping pass: after a match, scanning
    /// resumes immediately past the matched span. The mask is spliced in
    /// verbatim, never interpreted as a replacement template.
    ///
    /// The sequential order is contractual: a later rule can match inside an
    /// earlier rule's mask output, and an earlier mask can consume a span a
    /// later rule would otherwise have matched. Rule authors order rules and
    /// choose mask strings with that in mind.
    pub fn detect_and_mask<'a>(&self, text: &'a str) -> MaskingResult<'a> {
        if text.is_empty() {
            return MaskingResult {
                masked_text: Cow::Borrowed(text),
                detections: Vec::new(),
            };
        }

        let mut working: Cow<'a, str> = Cow::Borrowed(text);
        let mut detections = Vec::new();

        for rule in self.compiled.rules() {
            let mut rewritten: Option<String> = None;
            let mut last_end = 0;

            for mat in rule.regex.find_iter(&working) {
                detections.push(Detection {
                    rule: rule.name.clone(),
                    original_value: mat.as_str().to_string(),
                    masked_value: rule.mask.clone(),
                });

                let out = rewritten.get_or_insert_with(|| String::with_capacity(working.len()));
                out.push_str(&working[last_end..mat.start()]);
                out.push_str(&rule.mask);
                last_end = mat.end();
            }

            // This rule's output becomes the next rule's input.
            if let Some(mut out) = rewritten {
                out.push_str(&working[last_end..]);
                working = Cow::Owned(out);
            }
        }

        MaskingResult {
            masked_text: working,
            detections,
        }
    }

    /// True iff any rule matches `text`, without materializing a masked copy.
    ///
    /// Short-circuits at the first match; match order is unspecified.
    pub fn contains_pii(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.compiled.any_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskingRule;
    use crate::patterns::default_rule_set;

    fn rule_set(rules: &[(&str, &str, &str)]) -> RuleSet {
        rules
            .iter()
            .map(|(name, pattern, mask)| (name.to_string(), MaskingRule::new(*pattern, *mask)))
            .collect()
    }

    #[test]
    fn test_email_masking() {
        let detector = PiiDetector::new(&default_rule_set());
        let result = detector.detect_and_mask("Contact john.doe@example.com for more info");

        assert!(result.has_pii());
        assert_eq!(result.masked_text, "Contact ****@example.com for more info");
        assert_eq!(result.detections.len(), 1);
        assert_eq!(
            result.detections[0],
            Detection {
                rule: "email".to_string(),
                original_value: "john.doe@example.com".to_string(),
                masked_value: "****@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_ssn_masking() {
        let detector = PiiDetector::new(&default_rule_set());
        let result = detector.detect_and_mask("SSN: 123-45-6789");

        assert_eq!(result.masked_text, "SSN: ***-**-****");
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].rule, "ssn");
        assert_eq!(result.detections[0].original_value, "123-45-6789");
    }

    #[test]
    fn test_no_pii_returns_input_unchanged() {
        let detector = PiiDetector::new(&default_rule_set());
        let text = "This is a normal message with no sensitive data";
        let result = detector.detect_and_mask(text);

        assert!(!result.has_pii());
        assert_eq!(result.masked_text, text);
        // No allocation on the clean path.
        assert!(matches!(result.masked_text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_input() {
        let detector = PiiDetector::new(&default_rule_set());
        let result = detector.detect_and_mask("");

        assert_eq!(result.masked_text, "");
        assert!(result.detections.is_empty());
        assert!(!detector.contains_pii(""));
    }

    #[test]
    fn test_one_detection_per_occurrence() {
        let detector = PiiDetector::new(&rule_set(&[("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "***")]));
        let result = detector.detect_and_mask("123-45-6789 and 987-65-4321 and 111-22-3333");

        assert_eq!(result.detections.len(), 3);
        assert_eq!(result.masked_text, "*** and *** and ***");
        assert_eq!(result.detections[1].original_value, "987-65-4321");
    }

    #[test]
    fn test_later_rule_matches_inside_earlier_mask() {
        // Rule A's mask looks like an SSN, so rule B re-masks it. Locks in
        // the sequential re-scan contract.
        let detector = PiiDetector::new(&rule_set(&[
            ("codeword", "alpha", "999-99-9999"),
            ("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "***-**-****"),
        ]));
        let result = detector.detect_and_mask("the word alpha is restricted");

        assert_eq!(result.masked_text, "the word ***-**-**** is restricted");
        assert_eq!(result.detections.len(), 2);
        assert_eq!(result.detections[0].rule, "codeword");
        assert_eq!(result.detections[1].rule, "ssn");
        assert_eq!(result.detections[1].original_value, "999-99-9999");
    }

    #[test]
    fn test_earlier_mask_consumes_later_rule_span() {
        let detector = PiiDetector::new(&rule_set(&[
            ("digits", r"\d+", "#"),
            ("exact", "123-45-6789", "never"),
        ]));
        let result = detector.detect_and_mask("123-45-6789");

        // The digits rule rewrites the text first, so the exact rule finds
        // nothing to match.
        assert_eq!(result.masked_text, "#-#-#");
        assert!(result.detections.iter().all(|d| d.rule == "digits"));
    }

    #[test]
    fn test_mask_is_literal_not_a_template() {
        let detector = PiiDetector::new(&rule_set(&[("num", r"\d+", "$0${1}\\1")]));
        let result = detector.detect_and_mask("order 42");

        assert_eq!(result.masked_text, "order $0${1}\\1");
    }

    #[test]
    fn test_invalid_rule_does_not_block_others() {
        let detector = PiiDetector::new(&rule_set(&[
            ("broken", "(unclosed", "*"),
            ("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "***-**-****"),
        ]));

        assert_eq!(detector.skipped_rules().len(), 1);
        assert_eq!(detector.skipped_rules()[0].name, "broken");

        let result = detector.detect_and_mask("SSN: 123-45-6789");
        assert_eq!(result.masked_text, "SSN: ***-**-****");
        assert!(detector.contains_pii("SSN: 123-45-6789"));
    }

    #[test]
    fn test_contains_pii_agrees_with_detect_and_mask() {
        let detector = PiiDetector::new(&default_rule_set());
        let samples = [
            "Contact john.doe@example.com for more info",
            "SSN: 123-45-6789",
            "card 4111-1111-1111-1111 on file",
            "call 555-123-4567",
            "This is a normal message with no sensitive data",
            "",
        ];

        for text in samples {
            assert_eq!(
                detector.contains_pii(text),
                detector.detect_and_mask(text).has_pii(),
                "disagreement on {text:?}"
            );
        }
    }

    #[test]
    fn test_no_rules_means_no_detections() {
        let detector = PiiDetector::new(&RuleSet::new());
        let result = detector.detect_and_mask("SSN: 123-45-6789");

        assert!(!result.has_pii());
        assert_eq!(result.masked_text, "SSN: 123-45-6789");
        assert!(!detector.contains_pii("SSN: 123-45-6789"));
    }
}
