//! # tfscope
//!
//! Scope natural-language change requests to the right files of a
//! Terraform repository.
//!
//! tfscope clones or updates a Terraform repository, builds a file-level
//! dependency graph from local `module` references, describes each file
//! with a hosted generative model, asks the model which files a change
//! request touches, and writes back the rewritten files.
//!
//! ## Features
//!
//! - **Repository fetching**: clone or update a working copy from a browser
//!   or clone URL
//! - **HCL parsing**: `.tf` and `.tf.json` files, local vs. remote module
//!   sources
//! - **Dependency graph**: file-level graph exported as JSON, DOT, Mermaid or
//!   a plain outline
//! - **Model-driven editing**: describe files, select relevant ones, generate
//!   complete rewrites
//! - **Multiple output formats**: JSON and plain text reports
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfscope::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::new(Config::default());
//!
//!     let analysis = pipeline.analyze_path("./terraform", false).await?;
//!     println!("{} files, {} module dependencies", analysis.graph.node_count(), analysis.graph.edge_count());
//!
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod assistant;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod llm;
pub mod parser;
pub mod reporter;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TfScopeError};
pub use types::{Analysis, FileModification, GraphFormat, ModificationRun, ReportFormat, WriteOutcome};

use crate::assistant::{Describer, Modifier, RelevanceSelector};
use crate::graph::{export_graph, GraphBuilder};
use crate::llm::{GeminiClient, LanguageModel};
use std::path::{Path, PathBuf};

/// Main orchestrator that runs the analysis and modification pipeline.
///
/// The `Pipeline` is the primary entry point for using tfscope as a library.
/// It handles:
/// - Fetching the repository working copy
/// - Building and describing the dependency graph
/// - Selecting, rewriting and writing files for a change request
///
/// # Example
///
/// ```rust,no_run
/// use tfscope::{Config, Pipeline};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut config = Config::default();
///     config.load_from_env();
///     let pipeline = Pipeline::new(config);
///
///     let analysis = pipeline
///         .analyze_repository("https://github.com/org/infra", None, None, true)
///         .await?;
///     let run = pipeline.modify(&analysis, "Enable versioning on every S3 bucket", true).await?;
///
///     println!("Would modify {} files", run.outcome.previewed.len());
///     Ok(())
/// }
/// ```
pub struct Pipeline {
    config: Config,
    model: Option<Box<dyn LanguageModel>>,
    show_progress: bool,
}

impl Pipeline {
    /// Create a pipeline, connecting to the configured model when
    /// credentials are available.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let model: Option<Box<dyn LanguageModel>> = if config.llm.has_credentials() {
            match GeminiClient::new(&config.llm) {
                Ok(client) => Some(Box::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "Model client unavailable");
                    None
                }
            }
        } else {
            tracing::debug!("No model credentials configured");
            None
        };

        Self {
            config,
            model,
            show_progress: false,
        }
    }

    /// Replace the model, e.g. with a test double.
    #[must_use]
    pub fn with_model(mut self, model: Box<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Show progress bars during long model passes.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The model, when one is configured.
    #[must_use]
    pub fn model(&self) -> Option<&dyn LanguageModel> {
        self.model.as_deref()
    }

    /// Build the graph for a local directory, optionally describing every file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory or graph
    /// construction fails.
    pub async fn analyze_path<P: AsRef<Path>>(&self, path: P, describe: bool) -> Result<Analysis> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Analyzing path");

        let outcome = GraphBuilder::new(&self.config).build(path)?;
        let mut graph = outcome.graph;

        if describe {
            Describer::new(self.model(), &self.config.llm)
                .with_progress(self.show_progress)
                .describe_graph(&mut graph)
                .await;
        }

        let head_sha = match git::RepoFetcher::head_sha(&outcome.root).await {
            Ok(sha) => Some(sha),
            Err(e) => {
                tracing::debug!(error = %e, "No commit information for path");
                None
            }
        };

        Ok(Analysis {
            root: outcome.root,
            graph,
            external_modules: outcome.external_modules,
            parse_failures: outcome.parse_failures,
            head_sha,
            timestamp: chrono::Utc::now(),
        })
    }

    /// Fetch `url` into the configured working directory.
    ///
    /// Without an explicit branch, the one named in a `/tree/<ref>` URL is
    /// used, then `git.branch` from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if cloning or updating fails.
    pub async fn fetch_repository(&self, url: &str, branch: Option<&str>) -> Result<PathBuf> {
        let web_branch = git::branch_from_web_url(url);
        let branch = branch
            .or(web_branch.as_deref())
            .or(self.config.git.branch.as_deref());

        git::RepoFetcher::new(&self.config)
            .fetch(url, branch, &self.config.output.repo_dir())
            .await
    }

    /// Fetch a repository and analyze it, or one of its subdirectories.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails, `subdir` escapes the repository,
    /// or graph construction fails.
    pub async fn analyze_repository(
        &self,
        url: &str,
        branch: Option<&str>,
        subdir: Option<&str>,
        describe: bool,
    ) -> Result<Analysis> {
        let repo_dir = self.fetch_repository(url, branch).await?;

        let root = match subdir.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            Some(sub) => {
                if Path::new(sub).components().any(|c| !matches!(c, std::path::Component::Normal(_))) {
                    return Err(err!(UnsafePath { path: PathBuf::from(sub) }));
                }
                repo_dir.join(sub)
            }
            None => repo_dir.clone(),
        };

        let mut analysis = self.analyze_path(&root, describe).await?;
        if analysis.head_sha.is_none() {
            analysis.head_sha = git::RepoFetcher::head_sha(&repo_dir).await.ok();
        }
        Ok(analysis)
    }

    /// Select, rewrite and write the files implicated by `request`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no model is configured.
    pub async fn modify(&self, analysis: &Analysis, request: &str, dry_run: bool) -> Result<ModificationRun> {
        let Some(model) = self.model() else {
            return Err(err!(ConfigMissing { key: "llm.api_key".to_string() }));
        };

        tracing::info!(request = %request, dry_run, "Processing modification request");

        let selected_files = RelevanceSelector::new(model)
            .select(&analysis.graph, &analysis.root, request)
            .await;
        if selected_files.is_empty() {
            tracing::warn!("No files selected for modification");
        }

        let modifications = Modifier::new(model)
            .generate(&analysis.graph, &analysis.root, request, &selected_files)
            .await;

        let outcome = writer::FileWriter::apply(&analysis.root, &modifications, dry_run);

        Ok(ModificationRun {
            request: request.to_string(),
            selected_files,
            modifications,
            outcome,
            dry_run,
        })
    }

    /// Export the analysis graph to `<output.directory>/terraform_graph.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns an error if export or writing fails.
    pub fn export_graph(&self, analysis: &Analysis, format: GraphFormat) -> Result<PathBuf> {
        use crate::error::ResultExt;

        let dir = &self.config.output.directory;
        std::fs::create_dir_all(dir).with_path(dir)?;

        let path = dir.join(format!("terraform_graph.{}", format.extension()));
        let content = export_graph(&analysis.graph, format)?;
        std::fs::write(&path, content).with_path(&path)?;

        tracing::info!(path = %path.display(), format = ?format, "Graph exported");
        Ok(path)
    }
}
