//! Severity levels and validation result types

use crate::rules::Rule;
use serde::Serialize;
use std::str::FromStr;

/// Severity level of a business rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational hint
    #[default]
    Info,
    /// Warning - potential issue
    Warning,
    /// Error - definite problem
    Error,
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" | "hint" => Ok(Severity::Info),
            _ => Ok(Severity::Info), // Default to Info for unknown
        }
    }
}

impl Severity {
    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Get colored display name for terminal output
    pub fn colored(&self) -> String {
        match self {
            Severity::Error => "\x1b[1;31merror\x1b[0m".to_string(),
            Severity::Warning => "\x1b[1;33mwarning\x1b[0m".to_string(),
            Severity::Info => "\x1b[1;36minfo\x1b[0m".to_string(),
        }
    }
}

/// A business rule that fired against a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: Rule,
    /// Deterministic location token (the rule's context path)
    pub location: String,
}

impl Violation {
    pub fn new(rule: Rule, location: impl Into<String>) -> Self {
        Self {
            rule,
            location: location.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.rule.severity
    }
}

/// Outcome of the structural backbone check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl StructureResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Outcome of business rule evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrexResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl BrexResult {
    /// Only an `Error` violation makes the document non-compliant
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            is_valid: !violations.iter().any(|v| v.severity() == Severity::Error),
            violations,
        }
    }
}

/// Both validation outcomes for one document, reported independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    pub schema_valid: bool,
    pub schema_errors: Vec<String>,
    pub brex_valid: bool,
    pub violations: Vec<Violation>,
    /// Parser message when the text was not well-formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl CombinedResult {
    pub fn new(structure: StructureResult, brex: BrexResult) -> Self {
        Self {
            schema_valid: structure.is_valid,
            schema_errors: structure.errors,
            brex_valid: brex.is_valid,
            violations: brex.violations,
            parse_error: None,
        }
    }

    /// Result for text that is not well-formed XML
    pub fn parse_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let rule = Rule::new("parse-error", Severity::Error, "", message.clone());
        Self {
            schema_valid: false,
            schema_errors: vec![message.clone()],
            brex_valid: false,
            violations: vec![Violation::new(rule, "")],
            parse_error: Some(message),
        }
    }

    /// Whether the document was rejected before any rule ran
    pub fn is_parse_failure(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Both flags clean
    pub fn is_valid(&self) -> bool {
        self.schema_valid && self.brex_valid
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity() == severity)
            .count()
    }

    pub fn structure(&self) -> StructureResult {
        StructureResult {
            is_valid: self.schema_valid,
            errors: self.schema_errors.clone(),
        }
    }

    pub fn brex(&self) -> BrexResult {
        BrexResult {
            is_valid: self.brex_valid,
            violations: self.violations.clone(),
        }
    }
}
