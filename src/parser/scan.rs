//! Terraform file discovery.

use crate::config::ScanOptions;
use crate::err;
use crate::error::Result;
use crate::parser::{SKIP_DIRS, TERRAFORM_EXTENSIONS};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Recursively find `.tf` and `.tf.json` files under `root`.
///
/// Hidden entries, tool caches and names matching `exclude_patterns` are
/// skipped. The result is in walk order with entries sorted by name, so the
/// same tree always yields the same list.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `root` is not a directory.
pub fn find_terraform_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(err!(DirectoryNotFound { path: root.to_path_buf() }));
    }

    let excludes: Vec<glob::Pattern> = options
        .exclude_patterns
        .iter()
        .filter_map(|pattern| match glob::Pattern::new(pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid exclude pattern");
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(options.follow_links)
        .max_depth(options.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e, &excludes))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };

        if entry.file_type().is_file() && is_terraform_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    tracing::info!(root = %root.display(), files = files.len(), "Found Terraform files");

    if files.is_empty() {
        log_sample(root);
    }

    Ok(files)
}

/// Check if a file name has a Terraform extension.
#[must_use]
pub fn is_terraform_file(path: &Path) -> bool {
    let name = path.to_string_lossy();
    TERRAFORM_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn should_skip(entry: &DirEntry, excludes: &[glob::Pattern]) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };

    if name.starts_with('.') {
        tracing::trace!(path = %entry.path().display(), reason = "hidden", "Skipping path");
        return true;
    }
    if SKIP_DIRS.contains(&name) {
        tracing::trace!(path = %entry.path().display(), reason = "tool cache", "Skipping path");
        return true;
    }
    if excludes.iter().any(|p| p.matches(name)) {
        tracing::debug!(path = %entry.path().display(), reason = "exclude pattern", "Skipping path");
        return true;
    }
    false
}

/// Show what the directory does contain, to help spot a wrong URL or branch.
fn log_sample(root: &Path) {
    let sample: Vec<String> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .take(10)
        .map(|e| e.path().display().to_string())
        .collect();

    tracing::warn!(root = %root.display(), sample = ?sample, "No Terraform files found");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_finds_tf_and_tf_json_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "variables.tf");
        touch(dir.path(), "main.tf");
        touch(dir.path(), "modules/db/main.tf.json");
        touch(dir.path(), "README.md");
        touch(dir.path(), "terraform.tfvars");

        let files = find_terraform_files(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &files),
            vec!["main.tf", "modules/db/main.tf.json", "variables.tf"]
        );
    }

    #[test]
    fn test_skips_hidden_and_caches() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), ".terraform/modules/x/main.tf");
        touch(dir.path(), ".git/hooks/main.tf");
        touch(dir.path(), "terragrunt/.terragrunt-cache/main.tf");

        let files = find_terraform_files(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["main.tf"]);
    }

    #[test]
    fn test_exclude_patterns_and_depth() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), "test/fixture.tf");
        touch(dir.path(), "a/b/c/deep.tf");

        let options = ScanOptions {
            exclude_patterns: vec!["test*".to_string()],
            max_depth: 2,
            ..ScanOptions::default()
        };
        let files = find_terraform_files(dir.path(), &options).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["main.tf"]);
    }

    #[test]
    fn test_missing_root() {
        let result = find_terraform_files(Path::new("/definitely/not/here"), &ScanOptions::default());
        assert!(matches!(result, Err(crate::error::TfScopeError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_is_terraform_file() {
        assert!(is_terraform_file(Path::new("main.tf")));
        assert!(is_terraform_file(Path::new("config.tf.json")));
        assert!(!is_terraform_file(Path::new("readme.md")));
        assert!(!is_terraform_file(Path::new("terraform.tfstate")));
    }
}
