//! Reasoning Harness - reasoning model comparison tool
//!
//! A CLI tool that sends a fixed set of prompts to one or more reasoning
//! model backends, records every answer and compares the models.
//!
//! ## Features
//!
//! - Ollama and OpenAI-compatible backends, plus local static/echo backends
//! - `<think>` reasoning traces kept apart from the final answer
//! - Optional expected answers graded per result
//! - Sequential or bounded-parallel execution with per-call timeouts
//! - Append-only JSONL result log per run
//! - Comparison reports in text or Markdown
//!
//! ## Usage
//!
//! ```bash
//! # Write an example suite
//! reasoning-harness config init
//!
//! # Run every case against every backend
//! reasoning-harness run
//!
//! # Run two cases against one backend, four calls at a time
//! reasoning-harness run --backend deepseek-r1 --case arithmetic --case bat-and-ball -j 4
//!
//! # Compare the models from the latest run
//! reasoning-harness results report latest --format markdown
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod backend;
mod cli;
mod config;
mod executor;
mod http;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::{AppConfig, EnvConfig, SuiteFile};
use executor::{PromptRunner, RunSettings};
use models::RunSummary;
use output::{OutputFormat, ResultFormatter};
use results::{
    generate_run_id, ExportFormat, ReportFormat, ReportGenerator, ResultLog, ResultsStorage,
};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let dotenv = config::load_dotenv();
    let env = EnvConfig::load();

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    let level = args
        .log_level
        .as_deref()
        .and_then(LogLevel::from_str)
        .unwrap_or_else(|| LogLevel::from_verbose(verbose));
    init_logger(level);

    match dotenv {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    if let Some(requested) = args.log_level.as_deref() {
        if LogLevel::from_str(requested).is_none() {
            warn!("Unknown log level '{}', using {:?}", requested, level);
        }
    }

    match args.command {
        cli::Command::Run(run_args) => {
            run_prompts(run_args, &env).await?;
        }
        cli::Command::List(list_args) => {
            list_suite(list_args, &env)?;
        }
        cli::Command::Results(results_args) => {
            show_results(results_args, &env)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

async fn run_prompts(args: cli::RunArgs, env: &EnvConfig) -> Result<()> {
    let suite_path = args.suite.clone().or_else(|| env.suite.as_ref().map(PathBuf::from));
    let (path, suite) = SuiteFile::locate(suite_path.as_deref())?;
    info!("Using suite {}", path.display());

    let settings = AppConfig::resolve(&suite.settings, env, &args)?;

    let format = OutputFormat::from_str(&settings.format)
        .ok_or_else(|| anyhow!("Unknown output format: {}", settings.format))?;

    let (backend_configs, cases) = suite.select(&args.backends, &args.cases, &args.tags)?;
    let backends = backend::build_all(&backend_configs, settings.timeout_secs)?;
    let runner = PromptRunner::new(backends, RunSettings::from(&settings))?;

    let run_id = generate_run_id();
    let log = match &args.log {
        Some(path) => ResultLog::create(path)?,
        None => ResultsStorage::at(settings.results_dir.as_deref()).open_log(&run_id)?,
    };
    let log = Arc::new(log);

    info!(
        "Run {}: {} cases × {} backends (timeout {}s, concurrency {})",
        run_id,
        cases.len(),
        runner.backends().len(),
        settings.timeout_secs,
        settings.concurrency
    );

    let results = runner.run(&run_id, &cases, &log).await?;
    let summary = RunSummary::new(&run_id, results);

    let formatter = ResultFormatter::for_stdout(format);
    println!("{}", formatter.format_summary(&summary));

    let human = matches!(format, OutputFormat::Table | OutputFormat::Summary);
    if human && !args.no_report && backend_configs.len() > 1 {
        let report = ReportGenerator::run_report(&run_id, &summary.results, ReportFormat::Text)?;
        println!("{report}");
    }

    if human {
        println!("✓ Results saved to: {}", log.path().display());
    } else {
        info!("Results saved to: {}", log.path().display());
    }

    if summary.has_errors() {
        warn!("{} of {} calls failed", summary.errors, summary.total);
    }

    Ok(())
}

fn list_suite(args: cli::ListArgs, env: &EnvConfig) -> Result<()> {
    let suite_path = args.suite.clone().or_else(|| env.suite.as_ref().map(PathBuf::from));
    let (path, suite) = SuiteFile::locate(suite_path.as_deref())?;

    println!("\nTest Cases ({} total) from {}\n", suite.cases.len(), path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for case in &suite.cases {
        if args.detailed {
            println!("\n  {}", case.id);
            println!("    Prompt: {}", case.prompt);
            if let Some(expected) = &case.expected {
                println!("    Expected: {expected}");
            }
            if !case.tags.is_empty() {
                println!("    Tags: {}", case.tags.join(", "));
            }
        } else {
            println!("  {case}");
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if args.backends {
        println!("Configured Backends:\n");
        for backend in &suite.backends {
            let location = if backend.kind.is_remote() {
                "remote"
            } else {
                "local"
            };
            println!(
                "  - {:20} {:8} {:30} [{}]",
                backend.name,
                backend.kind.label(),
                backend.kind.model().unwrap_or("-"),
                location
            );
        }
        println!();
    }

    Ok(())
}

fn show_results(args: cli::ResultsArgs, env: &EnvConfig) -> Result<()> {
    use cli::ResultsAction;

    let storage = results_storage(args.dir.as_deref(), env);

    match args.action {
        ResultsAction::List => {
            let runs = storage.list_runs()?;

            if runs.is_empty() {
                println!("\n📭 No stored results found in {}", storage.base_dir().display());
                println!("   Run prompts with: reasoning-harness run");
                return Ok(());
            }

            println!("\nStored runs in {}\n", storage.base_dir().display());
            print!("{}", ResultFormatter::for_stdout(OutputFormat::Table).format_runs(&runs));
        }

        ResultsAction::Show {
            run,
            run_id,
            format,
        } => {
            let format = OutputFormat::from_str(&format)
                .ok_or_else(|| anyhow!("Unknown output format: {format}"))?;
            let (run_id, results) = storage.load_run(&run, run_id.as_deref())?;
            let summary = RunSummary::new(run_id, results);
            println!("{}", ResultFormatter::for_stdout(format).format_summary(&summary));
        }

        ResultsAction::Report {
            run,
            run_id,
            format,
            output,
        } => {
            let format = ReportFormat::from_str(&format)
                .ok_or_else(|| anyhow!("Unknown report format: {format}"))?;
            let (run_id, results) = storage.load_run(&run, run_id.as_deref())?;
            let report = ReportGenerator::run_report(&run_id, &results, format)?;

            match output {
                Some(path) => {
                    let path = if path.extension().is_none() {
                        path.with_extension(format.extension())
                    } else {
                        path
                    };
                    std::fs::write(&path, report)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✓ Report written to: {}", path.display());
                }
                None => println!("{report}"),
            }
        }

        ResultsAction::Export {
            run,
            run_id,
            output,
        } => {
            let format = ExportFormat::from_extension(&output).ok_or_else(|| {
                anyhow!("Cannot infer export format from {}; use .json or .csv", output.display())
            })?;
            let (_, results) = storage.load_run(&run, run_id.as_deref())?;
            storage.export(&results, &output, format)?;
            println!("✓ Exported {} results to: {}", results.len(), output.display());
        }

        ResultsAction::Delete { run } => {
            if storage.delete(&run)? {
                println!("✓ Deleted run {run}");
            } else {
                bail!("No stored run named {run}");
            }
        }
    }

    Ok(())
}

/// Results directory: flag, then environment, then the discovered suite
fn results_storage(dir: Option<&Path>, env: &EnvConfig) -> ResultsStorage {
    if let Some(dir) = dir {
        return ResultsStorage::new(dir);
    }
    if let Some(dir) = &env.results_dir {
        return ResultsStorage::new(dir);
    }

    let from_suite = SuiteFile::find()
        .and_then(|path| SuiteFile::load(path).ok())
        .and_then(|suite| suite.settings.results_dir);
    ResultsStorage::at(from_suite.as_deref())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    use cli::ConfigAction;

    match args.action {
        ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                bail!(
                    "Suite file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            SuiteFile::example().save(&output)?;
            println!("✓ Suite file created: {}", output.display());
            println!("\nEdit the file to add your backends and prompts.");
        }

        ConfigAction::Show { suite, format } => {
            let (path, suite) = SuiteFile::locate(suite.as_deref())?;
            let output = if format == "json" {
                serde_json::to_string_pretty(&suite)?
            } else {
                serde_yaml::to_string(&suite)?
            };
            println!("# {}", path.display());
            println!("{output}");
        }

        ConfigAction::Validate { file } => {
            let path = match file.or_else(SuiteFile::find) {
                Some(path) => path,
                None => bail!(config::ConfigError::NotFound),
            };

            match SuiteFile::load(&path) {
                Ok(suite) => {
                    println!("✓ Suite file is valid: {}", path.display());
                    println!(
                        "  {} backends, {} test cases",
                        suite.backends.len(),
                        suite.cases.len()
                    );
                }
                Err(e) => {
                    println!("✗ Suite file is invalid: {}", path.display());
                    println!("  Error: {e}");
                    return Err(e.into());
                }
            }
        }

        ConfigAction::Env => {
            config::print_env_help();

            let env = EnvConfig::load();
            if env.has_any() {
                println!();
                env.print_summary();
            }
        }
    }

    Ok(())
}
