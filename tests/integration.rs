//! Integration tests for s1000d-lint

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use s1000d_lint::{
    config::Config,
    diagnostics::Severity,
    engine::Validator,
    output::{format_json, format_text, FileReport},
    parser::Document,
    rules::{ExtractError, RuleSet},
    session::{Offer, ValidationSession},
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixtures_path().join(name)).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn rule_ids(validator: &Validator, text: &str) -> Vec<String> {
    validator
        .validate_at(text, today())
        .violations
        .into_iter()
        .map(|v| v.rule.id)
        .collect()
}

#[test]
fn test_parse_valid_file() {
    let doc = Document::parse_file(&fixtures_path().join("valid.xml")).unwrap();
    assert_eq!(doc.root.name(), Some("dmodule"));
    assert!(doc.suppressions.is_empty());
}

#[test]
fn test_parse_file_with_disable_comment() {
    let doc = Document::parse_file(&fixtures_path().join("with-disable.xml")).unwrap();
    assert!(doc.suppressions.is_suppressed("BREX-003"));
    assert!(!doc.suppressions.is_suppressed("BREX-001"));
}

#[test]
fn test_parse_missing_file() {
    assert!(Document::parse_file(&fixtures_path().join("does-not-exist.xml")).is_err());
}

#[test]
fn test_default_template_is_clean() {
    let result = Validator::default().validate_at(&fixture("valid.xml"), today());
    assert!(result.schema_valid);
    assert!(result.schema_errors.is_empty());
    assert!(result.brex_valid);
    assert!(result.violations.is_empty());
}

#[test]
fn test_future_issue_date_is_warning_only() {
    let result = Validator::default().validate_at(&fixture("future-date.xml"), today());
    assert!(result.schema_valid);
    assert!(result.brex_valid);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule.id, "BREX-003");
    assert_eq!(result.violations[0].severity(), Severity::Warning);
}

#[test]
fn test_future_issue_date_against_clock() {
    let result = Validator::default().validate(&fixture("future-date.xml"));
    assert_eq!(result.count(Severity::Warning), 1);
}

#[test]
fn test_rule_errors_in_rule_order() {
    let validator = Validator::default();
    let result = validator.validate_at(&fixture("rule-errors.xml"), today());

    assert!(result.schema_valid);
    assert!(!result.brex_valid);
    assert_eq!(rule_ids(&validator, &fixture("rule-errors.xml")), vec!["BREX-002", "BREX-004"]);
    assert_eq!(result.violations[0].location, "//dmCode/@modelIdentCode");
    assert_eq!(result.violations[1].location, "//language/@languageIsoCode");
}

#[test]
fn test_absent_code_attributes_are_errors() {
    let xml = fixture("valid.xml")
        .replace(r#"modelIdentCode="DEMO" "#, "")
        .replace(r#"languageIsoCode="en" "#, "");
    let validator = Validator::default();
    let result = validator.validate_at(&xml, today());

    assert!(result.schema_valid);
    assert!(!result.brex_valid);
    assert_eq!(rule_ids(&validator, &xml), vec!["BREX-002", "BREX-004"]);
}

#[test]
fn test_missing_identifier_is_structural_only() {
    let result = Validator::default().validate_at(&fixture("missing-ident.xml"), today());
    assert!(!result.schema_valid);
    assert_eq!(
        result.schema_errors,
        vec!["Missing required element <dmIdent> in <dmAddress>".to_string()]
    );
    assert!(result.brex_valid);
    assert!(result.violations.is_empty());
}

#[test]
fn test_unterminated_document() {
    let result = Validator::default().validate_at(&fixture("unterminated.xml"), today());
    assert!(!result.schema_valid);
    assert!(!result.brex_valid);
    assert_eq!(result.schema_errors.len(), 1);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].severity(), Severity::Error);
    assert_eq!(result.violations[0].location, "");
    assert!(result.is_parse_failure());
}

#[test]
fn test_suppression_comment() {
    let result = Validator::default().validate_at(&fixture("with-disable.xml"), today());
    assert!(result.violations.is_empty());
}

#[test]
fn test_empty_input_never_panics() {
    let validator = Validator::default();
    for text in ["", "   ", "not xml at all", "<", "<dmodule>"] {
        let result = validator.validate_at(text, today());
        assert!(!result.schema_valid, "{:?} should not be schema-valid", text);
        assert!(!result.brex_valid, "{:?} should not be brex-valid", text);
    }
}

#[test]
fn test_extract_rules_from_brex_fixture() {
    let rules = RuleSet::from_brex(&fixture("brex.xml")).unwrap();
    let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["DEMO-001", "DEMO-002", "DEMO-003", "DEMO-004", "DEMO-005"]);

    let info = rules.get("DEMO-003").unwrap();
    assert_eq!(info.severity, Severity::Info);
    assert_eq!(info.context, "//infoName");
    assert_eq!(info.message, "Info names are optional");
    assert!(info.assertion.is_none());
}

#[test]
fn test_loaded_rules_replace_defaults() {
    let validator = Validator::default();
    assert_eq!(validator.load_rules(&fixture("brex.xml")).unwrap(), 5);

    // DEMO-004 has an unsupported path and is skipped; DEMO-005 never matches
    let result = validator.validate_at(&fixture("future-date.xml"), today());
    let ids: Vec<&str> = result.violations.iter().map(|v| v.rule.id.as_str()).collect();
    assert_eq!(ids, vec!["DEMO-001", "DEMO-002", "DEMO-003"]);
    assert!(!result.brex_valid);
    assert!(result.schema_valid);
}

#[test]
fn test_malformed_rule_document_disables_rules() {
    let validator = Validator::default();
    assert!(matches!(
        validator.load_rules(&fixture("malformed-brex.xml")),
        Err(ExtractError::MissingContainer)
    ));
    assert!(validator.rules().is_empty());

    let result = validator.validate_at(&fixture("rule-errors.xml"), today());
    assert!(result.brex_valid);
    assert!(result.violations.is_empty());
    assert!(result.schema_valid);
}

#[test]
fn test_unterminated_rule_document() {
    let validator = Validator::default();
    assert!(matches!(
        validator.load_rules(&fixture("unterminated.xml")),
        Err(ExtractError::Parse(_))
    ));
    assert!(validator.rules().is_empty());
}

#[test]
fn test_reload_after_failure() {
    let validator = Validator::default();
    assert!(validator.load_rules("<brex").is_err());
    assert!(validator.load_rules(&fixture("brex.xml")).is_ok());
    assert_eq!(validator.rules().len(), 5);
}

#[test]
fn test_config_disables_and_overrides() {
    let mut config = Config::default();
    config.disabled_rules = vec!["BREX-004".to_string()];
    config.severity_overrides.insert("BREX-002".to_string(), Severity::Warning);

    let result = Validator::new(config).validate_at(&fixture("rule-errors.xml"), today());
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule.id, "BREX-002");
    assert_eq!(result.violations[0].severity(), Severity::Warning);
    assert!(result.brex_valid);
}

#[test]
fn test_concurrent_reload_is_atomic() {
    let validator = Arc::new(Validator::default());
    let brex = fixture("brex.xml");
    let document = fixture("future-date.xml");

    let builtin_ids = vec!["BREX-003".to_string()];
    let loaded_ids = vec![
        "DEMO-001".to_string(),
        "DEMO-002".to_string(),
        "DEMO-003".to_string(),
    ];

    let writer = {
        let validator = Arc::clone(&validator);
        thread::spawn(move || {
            for i in 0..50 {
                if i % 2 == 0 {
                    validator.load_rules(&brex).unwrap();
                } else {
                    validator.replace_rules(RuleSet::builtin());
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let validator = Arc::clone(&validator);
            let document = document.clone();
            let builtin_ids = builtin_ids.clone();
            let loaded_ids = loaded_ids.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let ids = rule_ids(&validator, &document);
                    assert!(ids == builtin_ids || ids == loaded_ids, "mixed rule sets: {:?}", ids);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_session_discards_stale_results() {
    let session = ValidationSession::new(Arc::new(Validator::default()));
    let first_edit = session.begin();
    let second_edit = session.begin();

    assert_eq!(session.run(second_edit, &fixture("valid.xml")), Offer::Accepted);
    assert!(matches!(
        session.run(first_edit, &fixture("unterminated.xml")),
        Offer::Stale { .. }
    ));
    assert!(session.latest().unwrap().is_valid());
}

#[test]
fn test_text_report() {
    let validator = Validator::default();
    let reports = vec![
        FileReport {
            file: PathBuf::from("rule-errors.xml"),
            result: validator.validate_at(&fixture("rule-errors.xml"), today()),
        },
        FileReport {
            file: PathBuf::from("missing-ident.xml"),
            result: validator.validate_at(&fixture("missing-ident.xml"), today()),
        },
    ];

    let text = format_text(&reports, Severity::Info);
    assert!(text.contains("[BREX-002]"));
    assert!(text.contains("[BREX-004]"));
    assert!(text.contains("[structure]"));
    assert!(text.contains("missing-ident.xml"));
}

#[test]
fn test_json_report() {
    let validator = Validator::default();
    let reports = vec![
        FileReport {
            file: PathBuf::from("valid.xml"),
            result: validator.validate_at(&fixture("valid.xml"), today()),
        },
        FileReport {
            file: PathBuf::from("future-date.xml"),
            result: validator.validate_at(&fixture("future-date.xml"), today()),
        },
        FileReport {
            file: PathBuf::from("unterminated.xml"),
            result: validator.validate_at(&fixture("unterminated.xml"), today()),
        },
    ];

    let json = format_json(&reports, Severity::Info).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["summary"]["files"], 3);
    assert_eq!(value["summary"]["invalidFiles"], 1);
    assert_eq!(value["summary"]["warnings"], 1);
    assert_eq!(value["files"][0]["schemaValid"], true);
    assert_eq!(value["files"][1]["violations"][0]["ruleId"], "BREX-003");
    assert_eq!(value["files"][2]["violations"][0]["ruleId"], "parse-error");
}
