//! tfscope CLI entry point.
//!
//! This binary provides the command-line interface for tfscope.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tfscope::cli::{Cli, Commands, LogFormat, RepoArgs};
use tfscope::config::DEFAULT_CONFIG_FILES;
use tfscope::reporter::Reporter;
use tfscope::{Config, Pipeline, TfScopeError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet, cli.log_format);

    // Run the appropriate command
    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<TfScopeError>()
                .map_or(1, TfScopeError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfscope={base_level}"))
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = load_config(&cli)?;
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Analyze(args) => {
            apply_repo_args(&mut config, &args.repo);
            config.validate()?;

            let pipeline = Pipeline::new(config.clone()).with_progress(show_progress);
            let analysis = pipeline
                .analyze_repository(
                    &args.repo.url,
                    args.repo.branch.as_deref(),
                    args.repo.path.as_deref(),
                    !args.no_describe,
                )
                .await?;

            let graph_path = pipeline.export_graph(&analysis, args.format)?;

            let report = Reporter::new(&config).analysis(&analysis, args.report, args.highlight.as_deref())?;
            println!("{report}");
            eprintln!("Graph written to {}", graph_path.display());

            Ok(ExitCode::SUCCESS)
        }

        Commands::Modify(args) => {
            apply_repo_args(&mut config, &args.repo);
            if let Some(model) = args.model {
                config.llm.model = model;
            }
            config.validate()?;

            let pipeline = Pipeline::new(config.clone()).with_progress(show_progress);
            if pipeline.model().is_none() {
                anyhow::bail!(
                    "No model credentials configured; set TFSCOPE_LLM_API_KEY (or GEMINI_API_KEY), \
                     or llm.access_token and llm.project for Vertex AI"
                );
            }

            let analysis = pipeline
                .analyze_repository(&args.repo.url, args.repo.branch.as_deref(), args.repo.path.as_deref(), true)
                .await?;
            let run = pipeline.modify(&analysis, &args.request, args.dry_run).await?;

            let report = Reporter::new(&config).modification(&run, args.report)?;
            println!("{report}");

            let code = if run.outcome.failed.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            };
            Ok(code)
        }

        Commands::Graph(args) => {
            config.scan.exclude_patterns.extend(args.exclude_patterns);
            config.validate()?;

            let pipeline = Pipeline::new(config).with_progress(show_progress);
            let analysis = pipeline.analyze_path(&args.path, args.describe).await?;

            let graph_output = tfscope::graph::export_graph(&analysis.graph, args.format)?;

            if let Some(output_path) = args.output {
                std::fs::write(&output_path, &graph_output)?;
                tracing::info!(path = %output_path.display(), "Graph written");
            } else {
                println!("{graph_output}");
            }

            Ok(ExitCode::SUCCESS)
        }

        Commands::Summarize(args) => {
            let pipeline = Pipeline::new(config.clone());
            if !args.path.join(&args.file).is_file() {
                return Err(tfscope::err!(FileNotFound { path: args.path.join(&args.file) }).into());
            }

            let summary = tfscope::assistant::summarize_file(
                pipeline.model(),
                &args.path,
                &args.file,
                config.llm.max_content_chars,
            )
            .await;
            println!("{summary}");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Init => {
            let config_path = Path::new(DEFAULT_CONFIG_FILES[0]);

            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => {
            let config_content = std::fs::read_to_string(&args.config)?;
            match Config::from_yaml(&config_content).and_then(|config| config.validate()) {
                Ok(()) => {
                    println!("Configuration is valid: {}", args.config.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn apply_repo_args(config: &mut Config, args: &RepoArgs) {
    if let Some(dir) = &args.output_dir {
        config.output.directory.clone_from(dir);
    }
    if args.git_token.is_some() {
        config.git.token.clone_from(&args.git_token);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        let content = std::fs::read_to_string(config_path)?;
        Config::from_yaml(&content)?
    } else if let Some(path) = DEFAULT_CONFIG_FILES.iter().map(Path::new).find(|p| p.exists()) {
        tracing::debug!(path = %path.display(), "Found configuration file");
        Config::from_yaml(&std::fs::read_to_string(path)?)?
    } else {
        tracing::debug!("No configuration file found, using default configuration");
        Config::default()
    };

    config.load_from_env();
    if cli.quiet {
        config.output.colored = false;
    }
    Ok(config)
}
