//! Default rule set used until a rule document is loaded

use super::{Assertion, Rule};
use crate::Severity;

/// ISO 639-1 codes accepted by the default language rule
pub const ACCEPTED_LANGUAGES: &[&str] = &["en", "fr", "de", "es", "it"];

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "BREX-001",
            Severity::Error,
            "//dmTitle/techName",
            "Technical name must not exceed 64 characters",
        )
        .with_assertion(Assertion::MaxLength { max: 64 }),
        Rule::new(
            "BREX-002",
            Severity::Error,
            "//dmCode/@modelIdentCode",
            "Model identifier code must be between 1 and 14 characters",
        )
        .with_assertion(Assertion::LengthRange { min: 1, max: 14 }),
        Rule::new(
            "BREX-003",
            Severity::Warning,
            "//issueDate",
            "Issue date should not be in the future",
        )
        .with_assertion(Assertion::NotAfterToday),
        Rule::new(
            "BREX-004",
            Severity::Error,
            "//language/@languageIsoCode",
            "Language code must be a valid ISO 639-1 code",
        )
        .with_assertion(Assertion::OneOf {
            values: ACCEPTED_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }),
    ]
}
