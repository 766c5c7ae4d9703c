//! Validation engine - parses once, then runs the backbone check and every rule

use crate::config::Config;
use crate::diagnostics::{BrexResult, CombinedResult, Violation};
use crate::parser::Document;
use crate::rules::{ExtractError, RuleSet};
use crate::structure::validate_structure;
use crate::Severity;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Statistics about validation results
#[derive(Debug, Default, Clone)]
pub struct Statistics {
    /// Count per rule ID
    pub per_rule: HashMap<String, usize>,
    /// Count per severity
    pub per_severity: HashMap<Severity, usize>,
    /// Total documents validated
    pub files_validated: usize,
    /// Documents failing either check
    pub files_invalid: usize,
    /// Documents that were not well-formed
    pub files_unparsable: usize,
    /// Missing backbone elements across all documents
    pub structure_errors: usize,
}

impl Statistics {
    /// Record one document's result
    pub fn record(&mut self, result: &CombinedResult) {
        self.files_validated += 1;
        if !result.is_valid() {
            self.files_invalid += 1;
        }
        if result.is_parse_failure() {
            self.files_unparsable += 1;
            return;
        }
        self.structure_errors += result.schema_errors.len();
        for violation in &result.violations {
            *self.per_rule.entry(violation.rule.id.clone()).or_insert(0) += 1;
            *self.per_severity.entry(violation.severity()).or_insert(0) += 1;
        }
    }

    /// Merge another statistics into this one
    pub fn merge(&mut self, other: &Statistics) {
        for (rule, count) in &other.per_rule {
            *self.per_rule.entry(rule.clone()).or_insert(0) += count;
        }
        for (severity, count) in &other.per_severity {
            *self.per_severity.entry(*severity).or_insert(0) += count;
        }
        self.files_validated += other.files_validated;
        self.files_invalid += other.files_invalid;
        self.files_unparsable += other.files_unparsable;
        self.structure_errors += other.structure_errors;
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        *self.per_severity.get(&Severity::Error).unwrap_or(&0)
    }

    /// Get warning count
    pub fn warning_count(&self) -> usize {
        *self.per_severity.get(&Severity::Warning).unwrap_or(&0)
    }

    /// Get info count
    pub fn info_count(&self) -> usize {
        *self.per_severity.get(&Severity::Info).unwrap_or(&0)
    }
}

/// The validation entry point
///
/// Holds the active rule set behind a swappable reference: a call to
/// [`Validator::validate`] takes a snapshot of the current set up front, so a
/// concurrent [`Validator::load_rules`] is seen either entirely or not at all.
pub struct Validator {
    rules: RwLock<Arc<RuleSet>>,
    config: Config,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Validator {
    /// Create a validator seeded with the built-in rules
    pub fn new(config: Config) -> Self {
        Self::with_rules(RuleSet::builtin(), config)
    }

    /// Create a validator with an explicit rule set
    pub fn with_rules(rules: RuleSet, config: Config) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the active rule set
    pub fn rules(&self) -> Arc<RuleSet> {
        let guard = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the active rule set, returning the previous one
    pub fn replace_rules(&self, rules: RuleSet) -> Arc<RuleSet> {
        let next = Arc::new(rules);
        let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Replace the active rules with those extracted from a rule document
    ///
    /// If extraction fails the active set becomes empty and the failure is
    /// returned; the call never panics.
    pub fn load_rules(&self, rule_document: &str) -> Result<usize, ExtractError> {
        match RuleSet::from_brex(rule_document) {
            Ok(rules) => {
                let count = rules.len();
                self.replace_rules(rules);
                info!("Loaded {} rules from rule document", count);
                Ok(count)
            }
            Err(e) => {
                self.replace_rules(RuleSet::default());
                warn!("Rule document rejected, no business rules active: {}", e);
                Err(e)
            }
        }
    }

    /// Validate a document against today's date
    pub fn validate(&self, text: &str) -> CombinedResult {
        self.validate_at(text, Local::now().date_naive())
    }

    /// Validate a document, treating `today` as the current date
    pub fn validate_at(&self, text: &str, today: NaiveDate) -> CombinedResult {
        let rules = self.rules();
        validate_with(&rules, &self.config, text, today)
    }
}

/// Validate `text` against an explicit rule set
pub fn validate_with(
    rules: &RuleSet,
    config: &Config,
    text: &str,
    today: NaiveDate,
) -> CombinedResult {
    let doc = match Document::parse_str(text) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Document rejected by parser: {}", e);
            return CombinedResult::parse_failure(e.to_string());
        }
    };

    let structure = validate_structure(&doc.root);

    let mut violations = Vec::new();
    for rule in rules {
        if !config.is_rule_enabled(&rule.id) || doc.suppressions.is_suppressed(&rule.id) {
            continue;
        }

        match rule.check(&doc.root, today) {
            Ok(Some(location)) => {
                debug!("Rule '{}' fired at {}", rule.id, location);
                let mut rule = rule.clone();
                rule.severity = config.get_severity(&rule.id, rule.severity);
                violations.push(Violation::new(rule, location));
            }
            Ok(None) => {}
            Err(e) => warn!("Skipping rule '{}': {}", rule.id, e),
        }
    }

    CombinedResult::new(structure, BrexResult::from_violations(violations))
}
