//! Output formatters for validation results

use crate::diagnostics::{CombinedResult, Severity};
use crate::rules::RuleSet;
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

/// A validated file and its result
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: PathBuf,
    pub result: CombinedResult,
}

/// Human-readable report; violations below `min_severity` are left out
pub fn format_text(reports: &[FileReport], min_severity: Severity) -> String {
    let mut out = String::new();

    for report in reports {
        let file = report.file.display();
        let result = &report.result;

        if let Some(ref message) = result.parse_error {
            let _ = writeln!(
                out,
                "{}[parse-error]: {}\n  \x1b[1;34m-->\x1b[0m {}\n",
                Severity::Error.colored(),
                message,
                file
            );
            continue;
        }

        for error in &result.schema_errors {
            let _ = writeln!(
                out,
                "{}[structure]: {}\n  \x1b[1;34m-->\x1b[0m {}\n",
                Severity::Error.colored(),
                error,
                file
            );
        }

        for violation in result.violations.iter().filter(|v| v.severity() >= min_severity) {
            let rule = &violation.rule;
            let _ = writeln!(
                out,
                "{}[{}]: {}",
                rule.severity.colored(),
                rule.id,
                rule.message
            );
            let _ = writeln!(
                out,
                "  \x1b[1;34m-->\x1b[0m {} at {}",
                file, violation.location
            );
            if let Some(ref assertion) = rule.assertion {
                let _ = writeln!(
                    out,
                    "   \x1b[1;34m=\x1b[0m \x1b[1mexpected\x1b[0m: {}",
                    assertion
                );
            }
            let _ = writeln!(out);
        }
    }

    out
}

/// JSON output format
#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile<'a> {
    file: String,
    schema_valid: bool,
    schema_errors: &'a [String],
    brex_valid: bool,
    violations: Vec<JsonViolation<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonViolation<'a> {
    rule_id: &'a str,
    severity: &'a str,
    message: &'a str,
    context: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files: usize,
    invalid_files: usize,
    schema_errors: usize,
    errors: usize,
    warnings: usize,
    info: usize,
}

/// Machine-readable report; violations below `min_severity` are left out
pub fn format_json(reports: &[FileReport], min_severity: Severity) -> serde_json::Result<String> {
    let files: Vec<JsonFile> = reports
        .iter()
        .map(|r| JsonFile {
            file: r.file.display().to_string(),
            schema_valid: r.result.schema_valid,
            schema_errors: &r.result.schema_errors,
            brex_valid: r.result.brex_valid,
            violations: r
                .result
                .violations
                .iter()
                .filter(|v| v.severity() >= min_severity)
                .map(|v| JsonViolation {
                    rule_id: &v.rule.id,
                    severity: v.rule.severity.as_str(),
                    message: &v.rule.message,
                    context: &v.rule.context,
                    location: &v.location,
                })
                .collect(),
        })
        .collect();

    let count = |severity: Severity| {
        reports
            .iter()
            .map(|r| r.result.count(severity))
            .sum::<usize>()
    };

    let summary = JsonSummary {
        files: reports.len(),
        invalid_files: reports.iter().filter(|r| !r.result.is_valid()).count(),
        schema_errors: reports.iter().map(|r| r.result.schema_errors.len()).sum(),
        errors: count(Severity::Error),
        warnings: count(Severity::Warning),
        info: count(Severity::Info),
    };

    serde_json::to_string_pretty(&JsonOutput { files, summary })
}

/// One line per rule, for `--list-rules`
pub fn format_rules(rules: &RuleSet) -> String {
    let mut out = String::new();
    for rule in rules {
        let id = if rule.id.is_empty() { "(no id)" } else { rule.id.as_str() };
        let _ = write!(out, "{:<12} {:<8} {}", id, rule.severity.as_str(), rule.context);
        if let Some(ref assertion) = rule.assertion {
            let _ = write!(out, " [{}]", assertion);
        }
        if !rule.message.is_empty() {
            let _ = write!(out, " - {}", rule.message);
        }
        out.push('\n');
    }
    out
}
