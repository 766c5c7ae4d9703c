//! Configuration handling for s1000d-lint

use crate::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("Failed to parse JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("Failed to parse YAML config: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Only run these rules (if Some)
    pub enabled_rules: Option<Vec<String>>,
    /// Skip these rules
    pub disabled_rules: Vec<String>,
    /// Minimum severity to print; does not affect validity flags
    pub min_severity: Severity,
    /// Verbose output
    pub verbose: bool,
    /// Show statistics at the end
    pub statistics: bool,
    /// File patterns to exclude
    pub exclude_patterns: GlobSet,
    /// Severity overrides per rule
    pub severity_overrides: HashMap<String, Severity>,
    /// Rule document replacing the built-in rules
    pub brex: Option<PathBuf>,
    /// Number of parallel jobs (0 = auto)
    pub jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_rules: None,
            disabled_rules: Vec::new(),
            min_severity: Severity::Info,
            verbose: false,
            statistics: false,
            exclude_patterns: GlobSet::empty(),
            severity_overrides: HashMap::new(),
            brex: None,
            jobs: 0,
        }
    }
}

/// CLI options to merge into config
#[derive(Debug, Default)]
pub struct CliOptions {
    /// Rules to enable (replaces config if set)
    pub enabled_rules: Option<Vec<String>>,
    /// Rules to disable (adds to config)
    pub disabled_rules: Vec<String>,
    /// Minimum severity level
    pub min_severity: Option<Severity>,
    /// Rule document (replaces config if set)
    pub brex: Option<PathBuf>,
    /// Verbose output
    pub verbose: bool,
    /// Show statistics
    pub statistics: bool,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Configuration file format (.s1000dlintrc.json or .s1000dlintrc.yaml)
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Rules to enable (if specified, only these run)
    #[serde(default)]
    pub select: Vec<String>,

    /// Rules to ignore/disable
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Additional rules to ignore (added to ignore, not replacing)
    #[serde(default)]
    pub extend_ignore: Vec<String>,

    /// Minimum severity: "error", "warning", or "info"
    #[serde(default)]
    pub min_severity: Option<String>,

    /// File/folder patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Severity overrides: {"BREX-003": "error"}
    #[serde(default)]
    pub severity: HashMap<String, String>,

    /// Rule document path, relative to the config file
    #[serde(default)]
    pub brex: Option<PathBuf>,

    /// Number of parallel jobs (0 = auto)
    #[serde(default)]
    pub jobs: usize,
}

const CONFIG_NAMES: &[&str] = &[
    ".s1000dlintrc.json",
    ".s1000dlintrc.yaml",
    ".s1000dlintrc.yml",
    ".s1000dlintrc",
    "s1000dlint.json",
    "s1000dlint.yaml",
];

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config_file: ConfigFile =
            if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
                serde_yaml::from_str(&content)?
            } else {
                serde_json::from_str(&content)?
            };

        if let (Some(brex), Some(dir)) = (config_file.brex.as_mut(), path.parent()) {
            if brex.is_relative() {
                *brex = dir.join(&*brex);
            }
        }

        Self::from_config_file(config_file)
    }

    /// Try to find and load config from standard locations
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut current = start_dir.to_path_buf();
        loop {
            for name in CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    let config = Self::from_file(&config_path)?;
                    return Ok(Some((config_path, config)));
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Build config from a ConfigFile
    fn from_config_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut exclude_builder = GlobSetBuilder::new();
        for pattern in &file.exclude {
            exclude_builder.add(Glob::new(pattern)?);
        }
        let exclude_patterns = exclude_builder.build()?;

        let severity_overrides = file
            .severity
            .iter()
            .map(|(rule, sev)| (rule.clone(), sev.parse().unwrap_or_default()))
            .collect();

        let min_severity = file
            .min_severity
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Severity::Info);

        let mut disabled_rules = file.ignore;
        disabled_rules.extend(file.extend_ignore);

        Ok(Self {
            enabled_rules: if file.select.is_empty() {
                None
            } else {
                Some(file.select)
            },
            disabled_rules,
            min_severity,
            verbose: false,
            statistics: false,
            exclude_patterns,
            severity_overrides,
            brex: file.brex,
            jobs: file.jobs,
        })
    }

    /// Merge CLI options into this config (CLI takes precedence)
    pub fn merge_cli(&mut self, opts: CliOptions) {
        if opts.enabled_rules.is_some() {
            self.enabled_rules = opts.enabled_rules;
        }

        self.disabled_rules.extend(opts.disabled_rules);

        if let Some(sev) = opts.min_severity {
            self.min_severity = sev;
        }

        if opts.brex.is_some() {
            self.brex = opts.brex;
        }

        self.verbose = opts.verbose;
        self.statistics = opts.statistics;

        if let Some(j) = opts.jobs {
            self.jobs = j;
        }
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.disabled_rules.iter().any(|r| r == rule_id) {
            return false;
        }

        if let Some(ref enabled) = self.enabled_rules {
            return enabled.iter().any(|r| r == rule_id);
        }

        true
    }

    /// Check if a file should be excluded
    pub fn is_file_excluded(&self, file_path: &Path) -> bool {
        self.exclude_patterns.is_match(file_path)
    }

    /// Get effective severity for a rule (considering overrides)
    pub fn get_severity(&self, rule_id: &str, default: Severity) -> Severity {
        self.severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default)
    }

    /// Check if a severity should be reported
    pub fn should_report(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }
}
