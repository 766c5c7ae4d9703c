//! s1000d-lint CLI entry point

use clap::Parser;
use log::{info, warn};
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use s1000d_lint::config::CliOptions;
use s1000d_lint::output::{self, FileReport};
use s1000d_lint::{CombinedResult, Config, Severity, Statistics, Validator};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "s1000d-lint")]
#[command(author, version, about = "Structural and BREX validation for S1000D data modules", long_about = None)]
struct Cli {
    /// Data module files or glob patterns. Use "-" for stdin.
    #[arg(required_unless_present = "list_rules")]
    files: Vec<PathBuf>,

    /// BREX rule document replacing the built-in rules
    #[arg(long, env = "S1000D_BREX", value_name = "FILE")]
    brex: Option<PathBuf>,

    /// Config file path (default: auto-detect .s1000dlintrc.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable specific rule (can be used multiple times)
    #[arg(short, long = "rule", value_name = "RULE")]
    rules: Vec<String>,

    /// Disable specific rule (can be used multiple times)
    #[arg(short, long = "ignore", value_name = "RULE")]
    ignore: Vec<String>,

    /// Minimum severity level to report
    #[arg(short, long, value_enum)]
    severity: Option<SeverityFilter>,

    /// Only output errors (equivalent to --severity=error)
    #[arg(short, long)]
    quiet: bool,

    /// Show statistics at the end
    #[arg(long)]
    statistics: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the active rule set and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SeverityFilter {
    Error,
    Warning,
    Info,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path).into_diagnostic()?
    } else {
        let start_dir = std::env::current_dir().into_diagnostic()?;
        match Config::find_and_load(&start_dir) {
            Ok(Some((path, cfg))) => {
                info!("Using config: {}", path.display());
                cfg
            }
            Ok(None) => Config::default(),
            Err(e) => {
                warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    };

    let cli_severity = if cli.quiet {
        Some(Severity::Error)
    } else {
        cli.severity.map(|s| match s {
            SeverityFilter::Error => Severity::Error,
            SeverityFilter::Warning => Severity::Warning,
            SeverityFilter::Info => Severity::Info,
        })
    };

    config.merge_cli(CliOptions {
        enabled_rules: if cli.rules.is_empty() { None } else { Some(cli.rules) },
        disabled_rules: cli.ignore,
        min_severity: cli_severity,
        brex: cli.brex,
        verbose: cli.verbose,
        statistics: cli.statistics,
        jobs: cli.jobs,
    });

    let validator = Validator::new(config.clone());

    if let Some(ref brex_path) = config.brex {
        let text = fs::read_to_string(brex_path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read rule document {}", brex_path.display()))?;
        if let Err(e) = validator.load_rules(&text) {
            eprintln!(
                "Warning: {} is not a usable rule document ({}); no business rules active",
                brex_path.display(),
                e
            );
        }
    }

    if cli.list_rules {
        print!("{}", output::format_rules(&validator.rules()));
        return Ok(ExitCode::from(0));
    }

    let files = collect_files(&cli.files, &config)?;
    if files.is_empty() {
        eprintln!("No files to validate");
        return Ok(ExitCode::from(0));
    }

    if config.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build_global()
            .ok();
    }

    let outcomes: Vec<(PathBuf, Result<CombinedResult>)> = files
        .par_iter()
        .map(|file| {
            info!("Validating: {}", file.display());
            (file.clone(), validate_single_file(file, &validator))
        })
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut unreadable = 0;
    for (file, outcome) in outcomes {
        match outcome {
            Ok(result) => reports.push(FileReport { file, result }),
            Err(e) => {
                eprintln!("Failed to validate {}: {:?}", file.display(), e);
                unreadable += 1;
            }
        }
    }

    let mut stats = Statistics::default();
    for report in &reports {
        stats.record(&report.result);
    }

    match cli.format {
        OutputFormat::Text => print!("{}", output::format_text(&reports, config.min_severity)),
        OutputFormat::Json => {
            println!(
                "{}",
                output::format_json(&reports, config.min_severity).into_diagnostic()?
            );
        }
    }

    if config.statistics {
        print_statistics(&stats);
    }

    if !cli.quiet {
        print_summary(&stats);
    }

    if stats.files_invalid > 0 || unreadable > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::from(0))
    }
}

fn collect_files(patterns: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();

        if pattern_str == "-" {
            files.push(PathBuf::from("-"));
            continue;
        }

        if pattern_str.contains(['*', '?', '[']) {
            let entries = glob::glob(&pattern_str)
                .map_err(|e| miette!("Invalid pattern {}: {}", pattern_str, e))?;
            for entry in entries {
                let path = entry.into_diagnostic()?;
                if !config.is_file_excluded(&path) {
                    files.push(path);
                }
            }
        } else if !config.is_file_excluded(pattern) {
            files.push(pattern.clone());
        }
    }

    Ok(files)
}

fn validate_single_file(file: &Path, validator: &Validator) -> Result<CombinedResult> {
    let content = if file.to_string_lossy() == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content).into_diagnostic()?;
        content
    } else {
        fs::read_to_string(file).into_diagnostic()?
    };

    Ok(validator.validate(&content))
}

fn print_summary(stats: &Statistics) {
    let file_count = stats.files_validated;
    let file_word = if file_count == 1 { "file" } else { "files" };

    if stats.files_invalid == 0 && stats.warning_count() == 0 {
        eprintln!("\nAll {} {} valid", file_count, file_word);
    } else {
        eprintln!(
            "\n{} of {} {} invalid ({} structure error{}, {} rule error{}, {} warning{})",
            stats.files_invalid,
            file_count,
            file_word,
            stats.structure_errors,
            if stats.structure_errors == 1 { "" } else { "s" },
            stats.error_count(),
            if stats.error_count() == 1 { "" } else { "s" },
            stats.warning_count(),
            if stats.warning_count() == 1 { "" } else { "s" },
        );
    }
}

fn print_statistics(stats: &Statistics) {
    eprintln!("\n\x1b[1mStatistics:\x1b[0m");
    eprintln!("  Files validated: {}", stats.files_validated);
    eprintln!("  Files invalid: {}", stats.files_invalid);
    eprintln!("  Files not well-formed: {}", stats.files_unparsable);
    eprintln!("  Structure errors: {}", stats.structure_errors);
    eprintln!();

    if !stats.per_rule.is_empty() {
        eprintln!("  \x1b[1mBy rule:\x1b[0m");
        let mut rules: Vec<_> = stats.per_rule.iter().collect();
        rules.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (rule, count) in rules {
            eprintln!("    {:40} {}", rule, count);
        }
    }

    eprintln!();
    eprintln!("  \x1b[1mBy severity:\x1b[0m");
    eprintln!("    \x1b[1;31mErrors:\x1b[0m   {}", stats.error_count());
    eprintln!("    \x1b[1;33mWarnings:\x1b[0m {}", stats.warning_count());
    eprintln!("    \x1b[1;36mInfo:\x1b[0m     {}", stats.info_count());
}
