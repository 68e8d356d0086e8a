//! Core data types used throughout tfscope.
//!
//! This module defines the values passed between pipeline stages:
//! - module calls and how their sources resolve
//! - the result of analyzing a repository
//! - proposed file modifications and how they were applied
//! - output formats

use crate::graph::DependencyGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A `module` block as it appears in a parsed document.
///
/// ```hcl
/// module "network" {
///   source = "./modules/network"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCall {
    /// The block label (e.g. "network")
    pub name: String,
    /// The raw `source` attribute
    pub source: String,
}

/// Where a module source points once resolved against its referencing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// A lexically normalized filesystem path (may or may not exist).
    Local(PathBuf),
    /// Something Terraform would download.
    Remote(RemoteSource),
}

/// A non-local module source, left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub raw: String,
    pub kind: SourceKind,
}

/// Classification of a non-local module source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Registry,
    Git,
    Http,
    S3,
    Gcs,
    /// An absolute filesystem path; never followed.
    Absolute,
    Unknown,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::Git => write!(f, "git"),
            Self::Http => write!(f, "http"),
            Self::S3 => write!(f, "s3"),
            Self::Gcs => write!(f, "gcs"),
            Self::Absolute => write!(f, "absolute"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A module call whose source is outside the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalModule {
    /// Repository-relative path of the referencing file
    pub file: String,
    pub module_name: String,
    pub source: RemoteSource,
}

/// A file that could not be parsed; it stays in the graph without edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub file: String,
    pub message: String,
}

/// Result of analyzing a repository.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Root directory the graph's relative paths are based on
    pub root: PathBuf,

    /// File-level dependency graph
    pub graph: DependencyGraph,

    /// Module calls that point outside the repository
    pub external_modules: Vec<ExternalModule>,

    /// Files that failed to parse
    pub parse_failures: Vec<ParseFailure>,

    /// Commit the analysis ran against, when known
    pub head_sha: Option<String>,

    /// When the analysis finished
    pub timestamp: DateTime<Utc>,
}

impl Analysis {
    /// Node ids whose path contains `needle`, in graph order.
    #[must_use]
    pub fn matching_files(&self, needle: &str) -> Vec<String> {
        self.graph
            .nodes()
            .filter(|node| node.id.contains(needle))
            .map(|node| node.id.clone())
            .collect()
    }
}

/// A proposed rewrite of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModification {
    /// Repository-relative path
    pub path: String,
    pub original: String,
    pub modified: String,
}

impl FileModification {
    /// True when the model returned the file unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.original.trim_end() == self.modified.trim_end()
    }
}

/// What happened when modifications were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Files written to disk
    pub written: Vec<String>,
    /// Files that would have been written (dry run)
    pub previewed: Vec<String>,
    /// Files that could not be written, with the reason
    pub failed: Vec<(String, String)>,
}

/// Everything a `modify` run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRun {
    pub request: String,
    pub selected_files: Vec<String>,
    pub modifications: Vec<FileModification>,
    pub outcome: WriteOutcome,
    pub dry_run: bool,
}

/// Output format for the dependency graph export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    #[default]
    Json,
    #[value(alias = "graphviz")]
    Dot,
    #[value(alias = "mmd")]
    Mermaid,
    /// The plain outline used in prompts
    Text,
}

impl GraphFormat {
    /// File extension for exported graphs.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Mermaid => "mmd",
            Self::Text => "txt",
        }
    }
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "dot" | "graphviz" => Ok(Self::Dot),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Unknown graph format: {s}")),
        }
    }
}

/// Output format for summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_format_from_str() {
        assert_eq!("json".parse::<GraphFormat>(), Ok(GraphFormat::Json));
        assert_eq!("DOT".parse::<GraphFormat>(), Ok(GraphFormat::Dot));
        assert_eq!("mermaid".parse::<GraphFormat>(), Ok(GraphFormat::Mermaid));
        assert!("png".parse::<GraphFormat>().is_err());
        assert_eq!(GraphFormat::Mermaid.extension(), "mmd");
    }

    #[test]
    fn test_modification_noop() {
        let unchanged = FileModification {
            path: "main.tf".to_string(),
            original: "locals {}\n".to_string(),
            modified: "locals {}".to_string(),
        };
        assert!(unchanged.is_noop());

        let changed = FileModification {
            modified: "locals { a = 1 }".to_string(),
            ..unchanged
        };
        assert!(!changed.is_noop());
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Registry.to_string(), "registry");
        assert_eq!(SourceKind::Absolute.to_string(), "absolute");
    }
}
