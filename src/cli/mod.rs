//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `analyze`: Fetch a repository, build and describe its dependency graph
//! - `modify`: Apply a natural-language change request to a repository
//! - `graph`: Export the dependency graph of a local directory
//! - `summarize`: Print a detailed summary of one file
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Analyze a repository, exporting the graph as JSON
//! tfscope analyze https://github.com/org/infra
//!
//! # Analyze one directory of a branch shown in the browser
//! tfscope analyze https://github.com/org/infra/tree/develop --path environments/prod
//!
//! # Preview a change without writing anything
//! tfscope modify https://github.com/org/infra "Add an owner tag to every bucket" --dry-run
//!
//! # Offline graph export
//! tfscope graph ./terraform --format mermaid
//!
//! # Initialize configuration
//! tfscope init
//! ```

use crate::types::{GraphFormat, ReportFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tfscope - scope natural-language change requests to a Terraform repository.
#[derive(Parser, Debug)]
#[command(
    name = "tfscope",
    author,
    version,
    about = "Terraform dependency graphs and model-assisted modifications",
    long_about = "tfscope clones a Terraform repository, builds a file-level dependency graph \
                  from local module references, describes each file with a generative model, \
                  and rewrites the files a natural-language change request implicates."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TFSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a repository and build its dependency graph
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Apply a natural-language change request to a repository
    #[command(visible_alias = "m")]
    Modify(ModifyArgs),

    /// Export the dependency graph of a local directory
    #[command(visible_alias = "g")]
    Graph(GraphArgs),

    /// Print a detailed summary of one Terraform file
    Summarize(SummarizeArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Repository selection shared by `analyze` and `modify`.
#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repository URL (browser `/tree/<branch>` URLs are accepted)
    #[arg(value_name = "REPO_URL")]
    pub url: String,

    /// Subdirectory of the repository to analyze
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<String>,

    /// Git branch to check out (default: from the URL, then the remote default)
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Working directory for the clone and exported graph
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Git authentication token for private repositories
    #[arg(long, env = "TFSCOPE_GIT_TOKEN", hide_env_values = true)]
    pub git_token: Option<String>,
}

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Format of the exported graph file
    #[arg(short, long, default_value = "json", value_enum)]
    pub format: GraphFormat,

    /// Report format printed to stdout
    #[arg(long, default_value = "text", value_enum)]
    pub report: ReportFormat,

    /// Skip generating file descriptions
    #[arg(long)]
    pub no_describe: bool,

    /// Mark files whose path contains this text
    #[arg(long, value_name = "TEXT")]
    pub highlight: Option<String>,
}

/// Arguments for the modify command.
#[derive(Args, Debug)]
pub struct ModifyArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// The change to make, in plain language
    #[arg(value_name = "REQUEST")]
    pub request: String,

    /// Show the changes without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Model name override
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Report format printed to stdout
    #[arg(long, default_value = "text", value_enum)]
    pub report: ReportFormat,
}

/// Arguments for the graph command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Directory containing Terraform files
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format for the graph
    #[arg(short, long, default_value = "dot", value_enum)]
    pub format: GraphFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Generate file descriptions (requires model credentials)
    #[arg(long)]
    pub describe: bool,

    /// Patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,
}

/// Arguments for the summarize command.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Repository root
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// File to summarize, relative to PATH
    #[arg(value_name = "FILE")]
    pub file: String,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tfscope.yaml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_command() {
        let cli = Cli::parse_from([
            "tfscope",
            "analyze",
            "https://github.com/org/infra",
            "--path",
            "envs/prod",
            "--format",
            "mermaid",
            "--no-describe",
        ]);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.repo.url, "https://github.com/org/infra");
                assert_eq!(args.repo.path.as_deref(), Some("envs/prod"));
                assert_eq!(args.format, GraphFormat::Mermaid);
                assert_eq!(args.report, ReportFormat::Text);
                assert!(args.no_describe);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_modify_command() {
        let cli = Cli::parse_from([
            "tfscope",
            "-vv",
            "modify",
            "https://github.com/org/infra",
            "Add tags to buckets",
            "--dry-run",
            "--model",
            "gemini-1.5-pro",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Modify(args) => {
                assert_eq!(args.request, "Add tags to buckets");
                assert!(args.dry_run);
                assert_eq!(args.model.as_deref(), Some("gemini-1.5-pro"));
            }
            _ => panic!("Expected Modify command"),
        }
    }

    #[test]
    fn test_graph_defaults() {
        let cli = Cli::parse_from(["tfscope", "graph", "./terraform"]);
        match cli.command {
            Commands::Graph(args) => {
                assert_eq!(args.path, PathBuf::from("./terraform"));
                assert_eq!(args.format, GraphFormat::Dot);
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Graph command"),
        }
    }

    #[test]
    fn test_global_log_format() {
        let cli = Cli::parse_from(["tfscope", "init", "--log-format", "json"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Init));
    }
}
