//! Relevance selection: which files does a modification request touch?

use crate::assistant::describe::DEFAULT_DESCRIPTION;
use crate::assistant::prompts::{self, FileEntry};
use crate::graph::DependencyGraph;
use crate::llm::LanguageModel;
use crate::parser::{normalize_path, SKIP_DIRS};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

static JSON_ARRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("Invalid regex"));

static QUOTED_TF_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+\.tf)""#).expect("Invalid regex"));

/// Asks a model which files a request implicates.
pub struct RelevanceSelector<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> RelevanceSelector<'a> {
    #[must_use]
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    /// Select the files to modify for `request`, as repository-relative paths.
    ///
    /// When the model call fails every file in the graph is returned.
    pub async fn select(&self, graph: &DependencyGraph, root: &Path, request: &str) -> Vec<String> {
        let entries: Vec<FileEntry<'_>> = graph
            .nodes()
            .map(|node| FileEntry {
                path: &node.id,
                description: node.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION),
                dependencies: graph.dependencies_of(&node.id),
            })
            .collect();
        let prompt = prompts::select_files(request, &entries);

        let reply = match self.model.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "File selection failed, falling back to all files");
                return graph.nodes().map(|node| node.id.clone()).collect();
            }
        };

        let candidates = parse_file_list(&reply);
        tracing::debug!(candidates = ?candidates, "Model proposed files");

        let selected = validate_paths(root, &candidates);
        tracing::info!(selected = selected.len(), proposed = candidates.len(), "Selected files to modify");
        selected
    }
}

/// Extract file paths from a model reply.
///
/// Tries the first `[...]` span as a JSON string array, then falls back to
/// every quoted `.tf` path in the text.
#[must_use]
pub fn parse_file_list(reply: &str) -> Vec<String> {
    if let Some(span) = JSON_ARRAY.find(reply) {
        match serde_json::from_str::<Vec<String>>(span.as_str()) {
            Ok(paths) => return paths,
            Err(e) => tracing::debug!(error = %e, "Reply array is not a JSON string list"),
        }
    }

    QUOTED_TF_PATH
        .captures_iter(reply)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Map proposed paths onto files that exist under `root`.
///
/// Paths are normalized first, so `./main.tf` and `main.tf` are one file. A path that does not exist is replaced by the first file with the same
/// base name found in a sorted walk of the repository. Unknown paths are
/// dropped; duplicates keep their first position.
#[must_use]
pub fn validate_paths(root: &Path, candidates: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();

    for candidate in candidates {
        let normalized = normalize_path(Path::new(candidate.trim().trim_start_matches('/')));
        let relative = normalized.to_string_lossy().replace('\\', "/");
        if relative.is_empty() || relative == "." {
            continue;
        }

        let resolved = if !relative.split('/').any(|part| part == "..") && root.join(&relative).is_file() {
            Some(relative.clone())
        } else {
            find_by_basename(root, &relative)
        };

        match resolved {
            Some(path) => {
                if path != relative {
                    tracing::debug!(proposed = %candidate, found = %path, "Resolved file by name");
                }
                if seen.insert(path.clone()) {
                    valid.push(path);
                }
            }
            None => tracing::warn!(file = %candidate, "Proposed file not found in repository, skipping"),
        }
    }

    valid
}

fn find_by_basename(root: &Path, candidate: &str) -> Option<String> {
    let name = Path::new(candidate).file_name()?;

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !SKIP_DIRS.iter().any(|skip| entry.file_name() == *skip)
        })
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .find_map(|entry| crate::graph::relative_id(root, entry.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err;
    use crate::llm::MockLanguageModel;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case(r#"["main.tf", "modules/net/vars.tf"]"#, &["main.tf", "modules/net/vars.tf"] ; "bare array")]
    #[test_case("Sure!\n```json\n[\n  \"a.tf\"\n]\n```", &["a.tf"] ; "fenced multiline array")]
    #[test_case(r#"Modify "a.tf" and "b/c.tf" please"#, &["a.tf", "b/c.tf"] ; "quoted fallback")]
    #[test_case(r#"[not json] but "x.tf" is"#, &["x.tf"] ; "invalid array falls back")]
    #[test_case("nothing relevant", &[] ; "no paths")]
    fn test_parse_file_list(reply: &str, expected: &[&str]) {
        assert_eq!(parse_file_list(reply), expected);
    }

    fn repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("modules/net")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("main.tf"), "").unwrap();
        fs::write(dir.path().join("modules/net/variables.tf"), "").unwrap();
        fs::write(dir.path().join(".git/variables.tf"), "").unwrap();
        dir
    }

    #[test]
    fn test_validate_paths() {
        let dir = repo();
        let candidates: Vec<String> = ["/main.tf", "net/variables.tf", "missing.tf", "main.tf"]
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            validate_paths(dir.path(), &candidates),
            vec!["main.tf".to_string(), "modules/net/variables.tf".to_string()]
        );
    }

    #[test]
    fn test_validate_paths_normalizes_spelling() {
        let dir = repo();
        let candidates: Vec<String> = [
            "main.tf",
            "./main.tf",
            "modules/./net/variables.tf",
            "modules/net/../net/variables.tf",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            validate_paths(dir.path(), &candidates),
            vec!["main.tf".to_string(), "modules/net/variables.tf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_select_falls_back_to_all_files() {
        let dir = repo();
        let mut graph = DependencyGraph::new();
        graph.add_file("main.tf", dir.path().join("main.tf"));
        graph.add_file("modules/net/variables.tf", dir.path().join("modules/net/variables.tf"));

        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .returning(|_| Err(err!(Llm { message: "down".to_string(), status_code: None })));

        let selected = RelevanceSelector::new(&model).select(&graph, dir.path(), "add tags").await;
        assert_eq!(selected, vec!["main.tf".to_string(), "modules/net/variables.tf".to_string()]);
    }

    #[tokio::test]
    async fn test_select_uses_model_reply() {
        let dir = repo();
        let mut graph = DependencyGraph::new();
        graph.add_file("main.tf", dir.path().join("main.tf"));
        graph.add_file("modules/net/variables.tf", dir.path().join("modules/net/variables.tf"));
        graph.add_dependency("main.tf", "modules/net/variables.tf", "net");

        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .withf(|prompt| prompt.contains("DEPENDENCIES: modules/net/variables.tf (module_dependency: net)"))
            .returning(|_| Ok(r#"["modules/net/variables.tf"]"#.to_string()));

        let selected = RelevanceSelector::new(&model).select(&graph, dir.path(), "add a cidr variable").await;
        assert_eq!(selected, vec!["modules/net/variables.tf".to_string()]);
    }
}
