//! Graph builder implementation.
//!
//! Builds the file-level [`DependencyGraph`] for one repository.
//!
//! # Algorithm
//!
//! 1. **Node phase**: every scanned `.tf` / `.tf.json` file becomes a node
//!    keyed by its repository-relative path.
//! 2. **Edge phase**: each file is parsed and its `module` calls resolved
//!    against the file's directory. A local source naming a directory adds
//!    one edge per `.tf` file directly inside that directory. Missing or
//!    non-directory targets add nothing; remote sources are recorded as
//!    external modules.
//!
//! Single pass, no cycle detection: edges reflect the last successful parse.

use crate::config::{Config, ScanOptions};
use crate::err;
use crate::error::{Result, ResultExt};
use crate::graph::types::DependencyGraph;
use crate::parser::{extract_module_calls, find_terraform_files, parse_document, resolve_module_source};
use crate::types::{ExternalModule, ModuleCall, ParseFailure, ResolvedSource};
use std::path::{Path, PathBuf};

/// Everything produced while building a graph.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Canonical repository root
    pub root: PathBuf,
    pub graph: DependencyGraph,
    pub external_modules: Vec<ExternalModule>,
    pub parse_failures: Vec<ParseFailure>,
}

/// Builder for a repository's dependency graph.
///
/// ```rust,no_run
/// use tfscope::graph::GraphBuilder;
/// use tfscope::Config;
/// use std::path::Path;
///
/// let outcome = GraphBuilder::new(&Config::default()).build(Path::new("./infra")).unwrap();
/// println!("{} files, {} edges", outcome.graph.node_count(), outcome.graph.edge_count());
/// ```
pub struct GraphBuilder {
    scan: ScanOptions,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { scan: config.scan.clone() }
    }

    /// Scan `root` and build its dependency graph.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory, or if a file fails to
    /// parse while `scan.continue_on_error` is off.
    pub fn build(&self, root: &Path) -> Result<BuildOutcome> {
        if !root.is_dir() {
            return Err(err!(DirectoryNotFound { path: root.to_path_buf() }));
        }
        let root = std::fs::canonicalize(root).with_path(root)?;

        let files = find_terraform_files(&root, &self.scan)?;
        let mut outcome = BuildOutcome {
            root: root.clone(),
            ..BuildOutcome::default()
        };

        tracing::debug!(files = files.len(), "Phase 1: adding file nodes");
        for file in &files {
            if let Some(id) = relative_id(&root, file) {
                outcome.graph.add_file(id, file.clone());
            }
        }

        tracing::debug!("Phase 2: resolving module calls");
        for file in &files {
            let Some(id) = relative_id(&root, file) else {
                continue;
            };

            let document = match parse_document(file) {
                Ok(document) => document,
                Err(e) if self.scan.continue_on_error => {
                    tracing::warn!(file = %id, error = %e, "Failed to parse file, continuing");
                    outcome.parse_failures.push(ParseFailure {
                        file: id,
                        message: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let calls = extract_module_calls(&document);
            if calls.is_empty() {
                tracing::trace!(file = %id, "No module calls");
                continue;
            }
            tracing::debug!(file = %id, modules = calls.len(), "Found module calls");

            for call in calls {
                self.link_module(&root, file, &id, call, &mut outcome);
            }
        }

        tracing::info!(
            nodes = outcome.graph.node_count(),
            edges = outcome.graph.edge_count(),
            external_modules = outcome.external_modules.len(),
            parse_failures = outcome.parse_failures.len(),
            "Built dependency graph"
        );

        Ok(outcome)
    }

    fn link_module(&self, root: &Path, file: &Path, id: &str, call: ModuleCall, outcome: &mut BuildOutcome) {
        let module_dir = match resolve_module_source(&call.source, file) {
            ResolvedSource::Local(path) => path,
            ResolvedSource::Remote(source) => {
                outcome.external_modules.push(ExternalModule {
                    file: id.to_string(),
                    module_name: call.name,
                    source,
                });
                return;
            }
        };

        if !module_dir.exists() {
            tracing::debug!(module = %call.name, path = %module_dir.display(), "Module path does not exist");
            return;
        }
        if !module_dir.is_dir() {
            tracing::debug!(module = %call.name, path = %module_dir.display(), "Module path is not a directory");
            return;
        }

        let targets = match module_files(&module_dir) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(module = %call.name, error = %e, "Failed to list module directory");
                return;
            }
        };
        if targets.is_empty() {
            tracing::warn!(module = %call.name, path = %module_dir.display(), "No .tf files found in module directory");
            return;
        }

        for target in targets {
            let Some(target_id) = relative_id(root, &target) else {
                tracing::debug!(module = %call.name, target = %target.display(), "Module file outside repository, skipping");
                continue;
            };
            if !outcome.graph.contains(&target_id) {
                outcome.graph.add_file(target_id.clone(), target.clone());
            }
            tracing::debug!(source = %id, target = %target_id, module = %call.name, "Adding edge");
            outcome.graph.add_dependency(id, &target_id, &call.name);
        }
    }
}

/// `.tf` files directly inside `dir`, sorted by name.
fn module_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_path(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();
    Ok(files)
}

/// Repository-relative, `/`-separated id for `path`, if it lies under `root`.
#[must_use]
pub fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn edges(graph: &DependencyGraph) -> Vec<(String, String, String)> {
        graph
            .edges()
            .map(|e| (e.source.to_string(), e.target.to_string(), e.edge.module_name.clone()))
            .collect()
    }

    fn build(root: &Path) -> BuildOutcome {
        GraphBuilder::new(&Config::default()).build(root).unwrap()
    }

    #[test]
    fn test_local_module_edges() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "module \"net\" {\n  source = \"./modules/net\"\n}\n");
        write(dir.path(), "modules/net/main.tf", "resource \"null_resource\" \"n\" {}\n");
        write(dir.path(), "modules/net/outputs.tf", "output \"id\" { value = 1 }\n");
        write(dir.path(), "modules/net/README.md", "docs");

        let outcome = build(dir.path());
        assert_eq!(outcome.graph.node_count(), 3);
        assert_eq!(
            edges(&outcome.graph),
            vec![
                ("main.tf".into(), "modules/net/main.tf".into(), "net".into()),
                ("main.tf".into(), "modules/net/outputs.tf".into(), "net".into()),
            ]
        );
        assert!(outcome.external_modules.is_empty());
    }

    #[test]
    fn test_parent_relative_and_nested_dirs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "env/prod/main.tf", "module \"app\" {\n  source = \"../../modules/app\"\n}\n");
        write(dir.path(), "modules/app/main.tf", "");
        write(dir.path(), "modules/app/nested/inner.tf", "");

        let outcome = build(dir.path());
        assert_eq!(
            edges(&outcome.graph),
            vec![("env/prod/main.tf".into(), "modules/app/main.tf".into(), "app".into())]
        );
    }

    #[test]
    fn test_missing_and_file_targets_add_nothing() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.tf",
            r#"
module "gone" {
  source = "./modules/gone"
}
module "file" {
  source = "./modules/single.tf"
}
module "empty" {
  source = "./modules/empty"
}
"#,
        );
        write(dir.path(), "modules/single.tf", "");
        fs::create_dir_all(dir.path().join("modules/empty")).unwrap();

        let outcome = build(dir.path());
        assert_eq!(outcome.graph.edge_count(), 0);
        assert_eq!(outcome.graph.node_count(), 2);
    }

    #[test]
    fn test_remote_sources_recorded() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.tf",
            r#"
module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "~> 5.0"
}
module "lib" {
  source = "git::https://example.com/lib.git?ref=v1"
}
"#,
        );

        let outcome = build(dir.path());
        assert_eq!(outcome.graph.edge_count(), 0);
        let kinds: Vec<SourceKind> = outcome.external_modules.iter().map(|m| m.source.kind).collect();
        assert_eq!(kinds, vec![SourceKind::Registry, SourceKind::Git]);
        assert_eq!(outcome.external_modules[0].file, "main.tf");
    }

    #[test]
    fn test_bare_relative_directory_is_local() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "module \"db\" {\n  source = \"modules/db\"\n}\n");
        write(dir.path(), "modules/db/main.tf", "");

        let outcome = build(dir.path());
        assert_eq!(
            edges(&outcome.graph),
            vec![("main.tf".into(), "modules/db/main.tf".into(), "db".into())]
        );
    }

    #[test]
    fn test_parse_failures_are_collected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.tf", "this is { not hcl");
        write(dir.path(), "main.tf", "locals {}\n");

        let outcome = build(dir.path());
        assert_eq!(outcome.graph.node_count(), 2);
        assert_eq!(outcome.parse_failures.len(), 1);
        assert_eq!(outcome.parse_failures[0].file, "broken.tf");

        let mut config = Config::default();
        config.scan.continue_on_error = false;
        assert!(GraphBuilder::new(&config).build(dir.path()).is_err());
    }

    #[test]
    fn test_hidden_target_is_added_as_node() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "module \"x\" {\n  source = \"./.internal\"\n}\n");
        write(dir.path(), ".internal/main.tf", "");

        let outcome = build(dir.path());
        assert!(outcome.graph.contains(".internal/main.tf"));
        assert_eq!(outcome.graph.edge_count(), 1);
    }

    #[test]
    fn test_missing_root() {
        let result = GraphBuilder::new(&Config::default()).build(Path::new("/definitely/not/here"));
        assert!(result.is_err());
    }

    #[test]
    fn test_relative_id() {
        assert_eq!(
            relative_id(Path::new("/repo"), Path::new("/repo/a/b.tf")).as_deref(),
            Some("a/b.tf")
        );
        assert_eq!(relative_id(Path::new("/repo"), Path::new("/other/b.tf")), None);
        assert_eq!(relative_id(Path::new("/repo"), Path::new("/repo")), None);
    }
}
