//! Module source resolution.
//!
//! A `module` block's `source` either names a directory inside the
//! repository or something Terraform downloads (registry address, VCS URL,
//! archive). Only the former becomes a graph edge; the latter is classified
//! for reporting.
//!
//! # Supported Source Types
//!
//! - **Local**: `./path`, `../path`, `.`, `..`, or a bare relative path that
//!   names an existing directory
//! - **Registry**: `namespace/name/provider` or `hostname/namespace/name/provider`
//! - **Git**: `git::https://...`, `git@github.com:...`, `github.com/org/repo`
//! - **HTTP**: `https://...` archives
//! - **S3**: `s3::https://...` or `s3://bucket/key`
//! - **GCS**: `gcs::https://...`

use crate::types::{RemoteSource, ResolvedSource, SourceKind};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static REGISTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // namespace/name/provider or hostname/namespace/name/provider
    Regex::new(r"^(?:[a-zA-Z0-9.-]+/)?[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+$")
        .expect("Invalid regex")
});

static WINDOWS_DRIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]:").expect("Invalid regex"));

/// Resolve a module `source` against the file that references it.
///
/// ```rust
/// use std::path::Path;
/// use tfscope::parser::resolve_module_source;
/// use tfscope::types::{ResolvedSource, SourceKind};
///
/// let resolved = resolve_module_source("../modules/vpc", Path::new("/repo/env/prod/main.tf"));
/// assert_eq!(resolved, ResolvedSource::Local("/repo/env/modules/vpc".into()));
///
/// let resolved = resolve_module_source("hashicorp/consul/aws", Path::new("/repo/main.tf"));
/// assert!(matches!(resolved, ResolvedSource::Remote(r) if r.kind == SourceKind::Registry));
/// ```
#[must_use]
pub fn resolve_module_source(source: &str, referencing_file: &Path) -> ResolvedSource {
    let source = source.trim();
    let parent = referencing_file.parent().unwrap_or_else(|| Path::new(""));

    if is_local_style(source) {
        let resolved = normalize_path(&parent.join(source));
        tracing::debug!(source = %source, resolved = %resolved.display(), "Resolved module path");
        return ResolvedSource::Local(resolved);
    }

    if !source.starts_with('/') && !WINDOWS_DRIVE.is_match(source) && !source.contains("://") {
        let candidate = normalize_path(&parent.join(source));
        if candidate.is_dir() {
            tracing::debug!(source = %source, resolved = %candidate.display(), "Resolved relative module path");
            return ResolvedSource::Local(candidate);
        }
    }

    let kind = classify_source(source);
    tracing::debug!(source = %source, kind = %kind, "Non-local module source");
    ResolvedSource::Remote(RemoteSource {
        raw: source.to_string(),
        kind,
    })
}

/// `./x`, `../x`, `.` and `..` are always local, whether or not they exist.
fn is_local_style(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../") || source == "." || source == ".."
}

/// Classify a source Terraform would fetch from elsewhere.
#[must_use]
pub fn classify_source(source: &str) -> SourceKind {
    let lower = source.to_lowercase();

    if source.starts_with('/') || WINDOWS_DRIVE.is_match(source) {
        return SourceKind::Absolute;
    }
    if lower.starts_with("git::")
        || lower.starts_with("git@")
        || lower.starts_with("github.com/")
        || lower.starts_with("bitbucket.org/")
        || lower.contains(".git?")
        || lower.ends_with(".git")
    {
        return SourceKind::Git;
    }
    if lower.starts_with("s3::") || lower.starts_with("s3://") {
        return SourceKind::S3;
    }
    if lower.starts_with("gcs::") || lower.starts_with("gs://") {
        return SourceKind::Gcs;
    }
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("hg::") {
        return SourceKind::Http;
    }

    // Registry addresses may select a submodule: ns/name/provider//modules/x
    let address = source.split("//").next().unwrap_or(source);
    if REGISTRY_PATTERN.is_match(address) {
        return SourceKind::Registry;
    }

    SourceKind::Unknown
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent.
///
/// Leading `..` components of a relative path are kept, and `..` at the
/// root stays at the root. The filesystem is never consulted.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}
