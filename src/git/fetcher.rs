//! Clone-or-update of a repository working copy.

use crate::config::Config;
use crate::err;
use crate::error::{Result, ResultExt, TfScopeError};
use crate::git::url::{authenticated_url, is_local_url, normalize_repo_url, validate_repo_url};
use std::path::{Path, PathBuf};

/// Keeps a single local working copy in sync with a remote repository.
#[derive(Debug, Clone)]
pub struct RepoFetcher {
    token: Option<String>,
    depth: i32,
}

impl RepoFetcher {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            token: config.git.token.clone(),
            depth: config.git.depth,
        }
    }

    /// Bring `local_dir` to the head of `branch` (or the remote default branch).
    ///
    /// A missing directory is cloned; a directory without `.git` is removed
    /// and cloned again; an existing working copy is fetched and reset to the
    /// fetched head.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, a git operation fails, or the
    /// resulting working copy holds nothing besides `.git`.
    pub async fn fetch(&self, url: &str, branch: Option<&str>, local_dir: &Path) -> Result<PathBuf> {
        let url = normalize_repo_url(url);
        validate_repo_url(&url)?;

        if local_dir.exists() {
            if local_dir.join(".git").exists() {
                tracing::info!(path = %local_dir.display(), "Updating existing repository");
                self.update(&url, local_dir, branch).await?;
            } else {
                tracing::info!(
                    path = %local_dir.display(),
                    "Directory exists but is not a git repository, re-cloning"
                );
                tokio::fs::remove_dir_all(local_dir).await.with_path(local_dir)?;
                self.clone_fresh(&url, branch, local_dir).await?;
            }
        } else {
            self.clone_fresh(&url, branch, local_dir).await?;
        }

        ensure_not_empty(local_dir)?;
        Ok(local_dir.to_path_buf())
    }

    async fn clone_fresh(&self, url: &str, branch: Option<&str>, target: &Path) -> Result<()> {
        tracing::info!(url = %url, path = %target.display(), branch = ?branch, "Cloning repository");

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_path(parent)?;
        }

        let display_url = url.to_string();
        let clone_url = authenticated_url(url, self.token.as_deref());
        let branch = branch.map(str::to_string);
        let target = target.to_path_buf();
        // Local transports do not support shallow fetches.
        let depth = if is_local_url(url) { 0 } else { self.depth };

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut fetch_options = git2::FetchOptions::new();
            if depth > 0 {
                fetch_options.depth(depth);
            }

            let mut builder = git2::build::RepoBuilder::new();
            builder.fetch_options(fetch_options);
            if let Some(ref branch) = branch {
                builder.branch(branch);
            }

            let repo = builder.clone(&clone_url, &target).map_err(|e| err!(GitClone {
                url: display_url.clone(),
                message: e.message().to_string(),
            }))?;
            if clone_url != display_url {
                set_origin_url(&repo, &display_url)?;
            }

            tracing::debug!(url = %display_url, "Clone complete");
            Ok(())
        })
        .await
        .map_err(|e| err!(Internal { message: format!("Clone task failed: {e}") }))?
    }

    async fn update(&self, url: &str, repo_path: &Path, branch: Option<&str>) -> Result<()> {
        // The token is passed per fetch and never stored in `.git/config`.
        let token = self.token.as_deref().filter(|t| !t.is_empty());
        let remote = match token {
            Some(token) => authenticated_url(url, Some(token)),
            None => "origin".to_string(),
        };

        let mut args = vec!["fetch".to_string(), remote];
        if self.depth > 0 {
            args.push(format!("--depth={}", self.depth));
        }
        if let Some(branch) = branch {
            args.push(branch.to_string());
        }

        run_git(repo_path, args.as_slice(), token).await?;
        run_git(repo_path, &["reset", "--hard", "FETCH_HEAD"], None).await?;

        tracing::info!(path = %repo_path.display(), "Repository updated");
        Ok(())
    }

    /// Commit currently checked out in `repo_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo_path` is not a repository or has no commits.
    pub async fn head_sha(repo_path: &Path) -> Result<String> {
        let path = repo_path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<String> {
            let repo = git2::Repository::open(&path).map_err(|e| TfScopeError::git(e.message(), file!(), line!()))?;
            let commit = repo
                .head()
                .and_then(|head| head.peel_to_commit())
                .map_err(|e| TfScopeError::git(e.message(), file!(), line!()))?;
            Ok(commit.id().to_string())
        })
        .await
        .map_err(|e| err!(Internal { message: format!("HEAD lookup task failed: {e}") }))?
    }
}

/// Point `origin` at `url`, dropping any credentials used for the clone.
fn set_origin_url(repo: &git2::Repository, url: &str) -> Result<()> {
    repo.remote_set_url("origin", url)
        .map_err(|e| TfScopeError::git(e.message(), file!(), line!()))
}

/// Run `git` in `repo_path`; `secret` is masked in any error message.
async fn run_git<S: AsRef<std::ffi::OsStr>>(repo_path: &Path, args: &[S], secret: Option<&str>) -> Result<()> {
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .await
        .map_err(|e| TfScopeError::git(format!("Failed to run git: {e}"), file!(), line!()))?;

    if !output.status.success() {
        let command = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        let mut message = format!("git {command} failed: {}", String::from_utf8_lossy(&output.stderr).trim());
        if let Some(secret) = secret {
            message = message.replace(secret, "***");
        }
        return Err(TfScopeError::git(message, file!(), line!()));
    }

    Ok(())
}

fn ensure_not_empty(local_dir: &Path) -> Result<()> {
    let entries = std::fs::read_dir(local_dir)
        .with_path(local_dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name() != ".git")
        .count();

    tracing::debug!(path = %local_dir.display(), entries, "Files in repository directory");

    if entries == 0 {
        return Err(err!(EmptyRepository { path: local_dir.to_path_buf() }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo_with_file(dir: &Path, name: &str, content: &str) {
        let repo = git2::Repository::init(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = git2::Signature::now("tfscope", "tfscope@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
            .unwrap();
    }

    #[tokio::test]
    async fn test_clone_local_repository() {
        let upstream = TempDir::new().unwrap();
        init_repo_with_file(upstream.path(), "main.tf", "resource \"null_resource\" \"a\" {}\n");

        let work = TempDir::new().unwrap();
        let target = work.path().join("repo");
        let fetcher = RepoFetcher::new(&Config::default());

        let path = fetcher
            .fetch(upstream.path().to_str().unwrap(), None, &target)
            .await
            .unwrap();

        assert_eq!(path, target);
        assert!(target.join("main.tf").exists());
        assert_eq!(RepoFetcher::head_sha(&target).await.unwrap().len(), 40);
    }

    fn commit_file(dir: &Path, name: &str, content: &str) {
        let repo = git2::Repository::open(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().unwrap().peel_to_commit().unwrap();
        let signature = git2::Signature::now("tfscope", "tfscope@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, name, &tree, &[&parent])
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_existing_working_copy() {
        let upstream = TempDir::new().unwrap();
        init_repo_with_file(upstream.path(), "main.tf", "locals {}\n");

        let work = TempDir::new().unwrap();
        let target = work.path().join("repo");
        let fetcher = RepoFetcher::new(&Config::default());
        let url = upstream.path().to_str().unwrap();
        fetcher.fetch(url, None, &target).await.unwrap();

        commit_file(upstream.path(), "outputs.tf", "output \"name\" {\n  value = \"x\"\n}\n");
        fs::write(target.join("main.tf"), "# edited by an earlier run\n").unwrap();

        fetcher.fetch(url, None, &target).await.unwrap();

        assert!(target.join("outputs.tf").exists());
        assert_eq!(fs::read_to_string(target.join("main.tf")).unwrap(), "locals {}\n");

        let upstream_head = git2::Repository::open(upstream.path())
            .unwrap()
            .head()
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
            .to_string();
        assert_eq!(RepoFetcher::head_sha(&target).await.unwrap(), upstream_head);
    }

    #[test]
    fn test_origin_url_drops_credentials() {
        let dir = TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        repo.remote("origin", "https://secret-token@github.com/org/infra").unwrap();

        set_origin_url(&repo, "https://github.com/org/infra").unwrap();

        let remote = repo.find_remote("origin").unwrap();
        assert_eq!(remote.url(), Some("https://github.com/org/infra"));
        let config = fs::read_to_string(dir.path().join(".git/config")).unwrap();
        assert!(!config.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_git_errors_mask_secret() {
        let dir = TempDir::new().unwrap();
        git2::Repository::init(dir.path()).unwrap();

        let result = run_git(
            dir.path(),
            &["fetch", "https://secret-token@127.0.0.1:1/org/infra"],
            Some("secret-token"),
        )
        .await;

        let message = result.unwrap_err().to_string();
        assert!(!message.contains("secret-token"));
        assert!(message.contains("***"));
    }

    #[tokio::test]
    async fn test_non_git_directory_is_replaced() {
        let upstream = TempDir::new().unwrap();
        init_repo_with_file(upstream.path(), "main.tf", "locals {}\n");

        let work = TempDir::new().unwrap();
        let target = work.path().join("repo");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();

        let fetcher = RepoFetcher::new(&Config::default());
        fetcher
            .fetch(upstream.path().to_str().unwrap(), None, &target)
            .await
            .unwrap();

        assert!(!target.join("stale.txt").exists());
        assert!(target.join(".git").exists());
        assert!(target.join("main.tf").exists());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let work = TempDir::new().unwrap();
        let fetcher = RepoFetcher::new(&Config::default());
        let result = fetcher
            .fetch("ftp://example.com/repo", None, &work.path().join("repo"))
            .await;
        assert!(matches!(result, Err(TfScopeError::InvalidGitUrl { .. })));
    }

    #[test]
    fn test_ensure_not_empty() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(matches!(
            ensure_not_empty(dir.path()),
            Err(TfScopeError::EmptyRepository { .. })
        ));

        fs::write(dir.path().join("main.tf"), "").unwrap();
        assert!(ensure_not_empty(dir.path()).is_ok());
    }
}
