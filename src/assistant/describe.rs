//! Natural-language descriptions of Terraform files.

use crate::assistant::prompts;
use crate::config::LlmOptions;
use crate::error::{Result, ResultExt};
use crate::graph::DependencyGraph;
use crate::llm::{truncate_content, LanguageModel};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Description used whenever the model cannot provide one.
pub const DEFAULT_DESCRIPTION: &str = "Terraform configuration file";

/// Counts from one [`Describer::describe_graph`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescribeStats {
    /// Descriptions produced by the model
    pub described: usize,
    /// Nodes that received [`DEFAULT_DESCRIPTION`]
    pub defaulted: usize,
    /// Nodes that already had a description
    pub skipped: usize,
}

/// Generates file descriptions with a language model.
///
/// Without a model every missing description is set to
/// [`DEFAULT_DESCRIPTION`], so analysis works offline.
pub struct Describer<'a> {
    model: Option<&'a dyn LanguageModel>,
    max_content_chars: usize,
    concurrency: usize,
    show_progress: bool,
}

impl<'a> Describer<'a> {
    #[must_use]
    pub fn new(model: Option<&'a dyn LanguageModel>, options: &LlmOptions) -> Self {
        Self {
            model,
            max_content_chars: options.max_content_chars,
            concurrency: options.concurrency.max(1),
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while describing.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Describe every node that has no description yet.
    ///
    /// Requests run concurrently; results are applied in graph order.
    pub async fn describe_graph(&self, graph: &mut DependencyGraph) -> DescribeStats {
        let total = graph.node_count();
        let pending: Vec<(String, PathBuf)> = graph
            .nodes()
            .filter(|node| node.description.is_none())
            .map(|node| (node.id.clone(), node.path.clone()))
            .collect();

        let mut stats = DescribeStats {
            skipped: total - pending.len(),
            ..DescribeStats::default()
        };

        let Some(model) = self.model else {
            tracing::info!(files = pending.len(), "No model available, using default descriptions");
            for (id, _) in &pending {
                graph.set_description(id, DEFAULT_DESCRIPTION);
            }
            stats.defaulted = pending.len();
            return stats;
        };

        tracing::info!(files = pending.len(), concurrency = self.concurrency, "Generating file descriptions");
        let progress = self.progress_bar(pending.len());

        let mut results: Vec<(usize, String, Option<String>)> = stream::iter(pending.into_iter().enumerate())
            .map(|(order, (id, path))| {
                let progress = &progress;
                async move {
                    let description = match self.describe_file(model, &id, &path).await {
                        Ok(description) => Some(description),
                        Err(e) => {
                            tracing::warn!(file = %id, error = %e, "Failed to describe file");
                            None
                        }
                    };
                    progress.inc(1);
                    (order, id, description)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        progress.finish_and_clear();

        results.sort_by_key(|(order, _, _)| *order);
        for (_, id, description) in results {
            match description {
                Some(description) => {
                    graph.set_description(&id, description);
                    stats.described += 1;
                }
                None => {
                    graph.set_description(&id, DEFAULT_DESCRIPTION);
                    stats.defaulted += 1;
                }
            }
        }

        tracing::info!(
            described = stats.described,
            defaulted = stats.defaulted,
            skipped = stats.skipped,
            "File descriptions complete"
        );
        stats
    }

    async fn describe_file(&self, model: &dyn LanguageModel, id: &str, path: &Path) -> Result<String> {
        let content = tokio::fs::read_to_string(path).await.with_path(path)?;
        let content = truncate_content(&content, self.max_content_chars);
        let reply = model.generate(&prompts::describe_file(id, &content)).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Ok(DEFAULT_DESCRIPTION.to_string());
        }
        Ok(reply.to_string())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress.set_message("Describing files");
        progress
    }
}

/// Produce a detailed 3-5 sentence summary of one file.
///
/// Never fails: any error yields `"Terraform file: <path>"`.
pub async fn summarize_file(model: Option<&dyn LanguageModel>, root: &Path, file: &str, max_content_chars: usize) -> String {
    let fallback = format!("Terraform file: {file}");
    let Some(model) = model else {
        return fallback;
    };

    let path = root.join(file);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => truncate_content(&content, max_content_chars),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to read file for summary");
            return fallback;
        }
    };

    match model.generate(&prompts::summarize_file(file, &content)).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => fallback,
        Err(e) => {
            tracing::warn!(file = %file, error = %e, "Failed to summarize file");
            fallback
        }
    }
}
