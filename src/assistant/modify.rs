//! Modification generation: rewriting selected files with a model.

use crate::assistant::describe::DEFAULT_DESCRIPTION;
use crate::assistant::prompts::{self, FileEntry};
use crate::error::{Result, ResultExt};
use crate::graph::DependencyGraph;
use crate::llm::LanguageModel;
use crate::types::FileModification;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:terraform|hcl|tf)?[ \t]*\r?\n?([\s\S]*?)\s*```").expect("Invalid regex"));

/// Produces rewritten file contents for a modification request.
pub struct Modifier<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> Modifier<'a> {
    #[must_use]
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    /// Generate a modification for each of `files`.
    ///
    /// Files that cannot be read or rewritten are logged and left out.
    pub async fn generate(
        &self,
        graph: &DependencyGraph,
        root: &Path,
        request: &str,
        files: &[String],
    ) -> Vec<FileModification> {
        let mut modifications = Vec::with_capacity(files.len());

        for file in files {
            match self.generate_one(graph, root, request, file).await {
                Ok(modification) => {
                    tracing::info!(file = %file, unchanged = modification.is_noop(), "Generated modification");
                    modifications.push(modification);
                }
                Err(e) => tracing::warn!(file = %file, error = %e, "Failed to generate modification, skipping"),
            }
        }

        modifications
    }

    async fn generate_one(&self, graph: &DependencyGraph, root: &Path, request: &str, file: &str) -> Result<FileModification> {
        let path = root.join(file);
        let original = tokio::fs::read_to_string(&path).await.with_path(&path)?;

        let node = graph.node(file);
        let entry = FileEntry {
            path: file,
            description: node
                .and_then(|n| n.description.as_deref())
                .unwrap_or(DEFAULT_DESCRIPTION),
            dependencies: graph.dependencies_of(file),
        };

        let reply = self.model.generate(&prompts::modify_file(request, &entry, &original)).await?;

        Ok(FileModification {
            path: file.to_string(),
            original,
            modified: extract_code(&reply),
        })
    }
}

/// The first fenced code block in `reply`, or the whole reply trimmed.
#[must_use]
pub fn extract_code(reply: &str) -> String {
    FENCED_BLOCK
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| reply.trim().to_string(), |m| m.as_str().trim().to_string())
}
