//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{Analysis, ExternalModule, ModificationRun, ParseFailure, WriteOutcome};
use serde::Serialize;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }

    fn serialize<T: Serialize>(&self, report: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };

        json.map_err(|e| crate::err!(ReportGeneration {
            message: format!("Failed to serialize JSON report: {e}"),
        }))
    }
}

impl ReportGenerator for JsonReporter {
    fn analysis(&self, analysis: &Analysis, highlight: Option<&str>) -> Result<String> {
        let report = AnalysisReport {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: analysis.timestamp.to_rfc3339(),
                root: analysis.root.display().to_string(),
                head_sha: analysis.head_sha.as_deref(),
            },
            summary: AnalysisSummary {
                total_files: analysis.graph.node_count(),
                total_dependencies: analysis.graph.edge_count(),
                external_modules: analysis.external_modules.len(),
                parse_failures: analysis.parse_failures.len(),
            },
            files: analysis
                .graph
                .nodes()
                .map(|node| JsonFile {
                    path: &node.id,
                    description: node.description.as_deref(),
                    dependencies: analysis
                        .graph
                        .dependencies_of(&node.id)
                        .into_iter()
                        .map(|(target, edge)| JsonDependency {
                            target,
                            module_name: &edge.module_name,
                        })
                        .collect(),
                })
                .collect(),
            external_modules: &analysis.external_modules,
            parse_failures: &analysis.parse_failures,
            highlighted: highlight.map(|needle| analysis.matching_files(needle)),
        };

        self.serialize(&report)
    }

    fn modification(&self, run: &ModificationRun) -> Result<String> {
        let report = ModificationReport {
            version: env!("CARGO_PKG_VERSION"),
            request: &run.request,
            dry_run: run.dry_run,
            selected_files: &run.selected_files,
            modifications: run
                .modifications
                .iter()
                .map(|m| JsonModification {
                    path: &m.path,
                    changed: !m.is_noop(),
                    modified: &m.modified,
                })
                .collect(),
            outcome: &run.outcome,
        };

        self.serialize(&report)
    }
}

/// JSON report of an analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub metadata: ReportMetadata<'a>,
    pub summary: AnalysisSummary,
    pub files: Vec<JsonFile<'a>>,
    pub external_modules: &'a [ExternalModule],
    pub parse_failures: &'a [ParseFailure],
    /// Files matching `--highlight`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<Vec<String>>,
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata<'a> {
    /// tfscope version
    pub version: String,
    /// When the analysis finished
    pub timestamp: String,
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<&'a str>,
}

/// Summary statistics.
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub total_dependencies: usize,
    pub external_modules: usize,
    pub parse_failures: usize,
}

/// One file with its outgoing dependencies.
#[derive(Debug, Serialize)]
pub struct JsonFile<'a> {
    pub path: &'a str,
    pub description: Option<&'a str>,
    pub dependencies: Vec<JsonDependency<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonDependency<'a> {
    pub target: &'a str,
    pub module_name: &'a str,
}

/// JSON report of a modification run.
#[derive(Debug, Serialize)]
pub struct ModificationReport<'a> {
    pub version: &'static str,
    pub request: &'a str,
    pub dry_run: bool,
    pub selected_files: &'a [String],
    pub modifications: Vec<JsonModification<'a>>,
    pub outcome: &'a WriteOutcome,
}

#[derive(Debug, Serialize)]
pub struct JsonModification<'a> {
    pub path: &'a str,
    pub changed: bool,
    pub modified: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::types::{RemoteSource, SourceKind};
    use chrono::Utc;
    use std::path::PathBuf;

    #[test]
    fn test_analysis_json() {
        let mut graph = DependencyGraph::new();
        graph.add_file("main.tf", "/repo/main.tf");
        graph.add_file("modules/app/main.tf", "/repo/modules/app/main.tf");
        graph.add_dependency("main.tf", "modules/app/main.tf", "app");

        let analysis = Analysis {
            root: PathBuf::from("/repo"),
            graph,
            external_modules: vec![ExternalModule {
                file: "main.tf".to_string(),
                module_name: "vpc".to_string(),
                source: RemoteSource {
                    raw: "terraform-aws-modules/vpc/aws".to_string(),
                    kind: SourceKind::Registry,
                },
            }],
            parse_failures: Vec::new(),
            head_sha: None,
            timestamp: Utc::now(),
        };

        let json = JsonReporter::new(&Config::default()).analysis(&analysis, Some("app")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["summary"]["total_files"], 2);
        assert_eq!(parsed["summary"]["total_dependencies"], 1);
        assert_eq!(parsed["files"][0]["dependencies"][0]["target"], "modules/app/main.tf");
        assert_eq!(parsed["files"][0]["dependencies"][0]["module_name"], "app");
        assert_eq!(parsed["external_modules"][0]["source"]["kind"], "registry");
        assert_eq!(parsed["highlighted"][0], "modules/app/main.tf");
        assert!(parsed["metadata"].get("head_sha").is_none());
    }

    #[test]
    fn test_modification_json() {
        let run = ModificationRun {
            request: "bump".to_string(),
            selected_files: vec!["main.tf".to_string()],
            modifications: Vec::new(),
            outcome: WriteOutcome {
                failed: vec![("main.tf".to_string(), "denied".to_string())],
                ..WriteOutcome::default()
            },
            dry_run: false,
        };

        let json = JsonReporter::new(&Config::default()).modification(&run).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["request"], "bump");
        assert_eq!(parsed["outcome"]["failed"][0][0], "main.tf");
        assert_eq!(parsed["outcome"]["failed"][0][1], "denied");
    }
}
