//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reasoning model comparison harness
#[derive(Parser, Debug)]
#[command(name = "reasoning-harness")]
#[command(version)]
#[command(about = "Run fixed prompts against reasoning models and compare the answers")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test cases against the configured backends
    Run(RunArgs),

    /// List test cases and backends in the suite
    List(ListArgs),

    /// View and manage stored results
    Results(ResultsArgs),

    /// Manage suite files
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite file (searched in standard locations when omitted)
    #[arg(short, long)]
    pub suite: Option<PathBuf>,

    /// Only run these backends (repeatable)
    #[arg(short, long = "backend")]
    pub backends: Vec<String>,

    /// Only run these test case ids (repeatable)
    #[arg(short, long = "case")]
    pub cases: Vec<String>,

    /// Only run test cases with one of these tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Maximum concurrent backend calls
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the result log here instead of the results directory
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Skip the comparison report
    #[arg(long)]
    pub no_report: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Suite file
    #[arg(short, long)]
    pub suite: Option<PathBuf>,

    /// Show full prompts and expected answers
    #[arg(short, long)]
    pub detailed: bool,

    /// Show configured backends
    #[arg(short, long)]
    pub backends: bool,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Results directory (platform data dir when omitted)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ResultsAction,
}

#[derive(Subcommand, Debug)]
pub enum ResultsAction {
    /// List stored runs
    List,

    /// Show the results of a run
    Show {
        /// Run id or log path ("latest" for the newest run)
        run: String,

        /// Run to select when the log holds several
        #[arg(long)]
        run_id: Option<String>,

        /// Output format (table, json, json-pretty, csv, summary)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Print a model comparison report for a run
    Report {
        /// Run id or log path ("latest" for the newest run)
        run: String,

        /// Run to select when the log holds several
        #[arg(long)]
        run_id: Option<String>,

        /// Report format (text, markdown)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Write the report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a run to JSON or CSV
    Export {
        /// Run id or log path ("latest" for the newest run)
        run: String,

        /// Run to select when the log holds several
        #[arg(long)]
        run_id: Option<String>,

        /// Output file; format follows the extension
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete a stored run
    Delete {
        /// Run id
        run: String,
    },
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example suite file
    Init {
        /// Output path
        #[arg(default_value = "./reasoning-harness.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active suite
    Show {
        /// Suite file
        #[arg(short, long)]
        suite: Option<PathBuf>,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a suite file
    Validate {
        /// Suite file
        file: Option<PathBuf>,
    },

    /// Show supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args() {
        let args = Args::parse_from(["reasoning-harness", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
                assert!(!list_args.backends);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "reasoning-harness",
            "run",
            "--backend",
            "deepseek-r1",
            "--backend",
            "o3-mini",
            "--case",
            "arithmetic",
            "-j",
            "4",
            "--timeout",
            "60",
            "--no-report",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.backends, vec!["deepseek-r1", "o3-mini"]);
                assert_eq!(run.cases, vec!["arithmetic"]);
                assert!(run.tags.is_empty());
                assert_eq!(run.concurrency, Some(4));
                assert_eq!(run.timeout, Some(60));
                assert!(run.no_report);
                assert!(run.suite.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_results_args() {
        let args = Args::parse_from([
            "reasoning-harness",
            "results",
            "report",
            "latest",
            "--format",
            "markdown",
        ]);
        match args.command {
            Command::Results(ResultsArgs {
                action:
                    ResultsAction::Report {
                        run,
                        run_id,
                        format,
                        output,
                    },
                ..
            }) => {
                assert_eq!(run, "latest");
                assert!(run_id.is_none());
                assert_eq!(format, "markdown");
                assert!(output.is_none());
            }
            _ => panic!("Expected Results Report command"),
        }
    }

    #[test]
    fn test_results_show_run_id() {
        let args = Args::parse_from([
            "reasoning-harness",
            "results",
            "show",
            "shared.jsonl",
            "--run-id",
            "20260101_120000_0042",
        ]);
        match args.command {
            Command::Results(ResultsArgs {
                action: ResultsAction::Show { run, run_id, .. },
                ..
            }) => {
                assert_eq!(run, "shared.jsonl");
                assert_eq!(run_id.as_deref(), Some("20260101_120000_0042"));
            }
            _ => panic!("Expected Results Show command"),
        }
    }

    #[test]
    fn test_config_init_default_path() {
        let args = Args::parse_from(["reasoning-harness", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, PathBuf::from("./reasoning-harness.yaml"));
                assert!(!force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
