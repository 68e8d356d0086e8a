//! Repository URL handling.
//!
//! Users paste whatever is in their browser's address bar, so URLs from the
//! GitHub web UI (`.../tree/main`, `.../blob/main/main.tf`) are reduced to
//! something `git clone` accepts.

use crate::err;
use crate::error::Result;
use std::path::Path;
use url::Url;

const WEB_UI_SEGMENTS: [&str; 2] = ["/tree/", "/blob/"];

/// Strip GitHub web-UI segments and trailing noise from a repository URL.
///
/// A `/tree/<ref>` or `/blob/<ref>` suffix is removed outright; the same
/// segment in the middle of the URL collapses to `/`, keeping whatever path
/// follows it. `.git` is dropped from github.com URLs, then trailing slashes.
#[must_use]
pub fn normalize_repo_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    for marker in WEB_UI_SEGMENTS {
        url = strip_trailing_segment(&url, marker);
        url = collapse_inner_segments(&url, marker);
    }

    if url.contains("github.com") {
        if let Some(stripped) = url.strip_suffix(".git") {
            url = stripped.to_string();
        }
    }

    url.trim_end_matches('/').to_string()
}

/// The ref a web-UI URL points at, e.g. `main` for `.../tree/main/modules`.
#[must_use]
pub fn branch_from_web_url(url: &str) -> Option<String> {
    WEB_UI_SEGMENTS.iter().find_map(|marker| {
        let idx = url.find(marker)?;
        let rest = &url[idx + marker.len()..];
        let branch = rest.split('/').next().unwrap_or_default();
        (!branch.is_empty()).then(|| branch.to_string())
    })
}

/// `<marker><ref>` or `<marker><ref>/` at the very end is removed.
fn strip_trailing_segment(url: &str, marker: &str) -> String {
    if let Some(idx) = url.rfind(marker) {
        let rest = &url[idx + marker.len()..];
        let reference = rest.strip_suffix('/').unwrap_or(rest);
        if !reference.is_empty() && !reference.contains('/') {
            return url[..idx].to_string();
        }
    }
    url.to_string()
}

/// Every non-overlapping `<marker><ref>/` becomes `/`, scanning left to right.
fn collapse_inner_segments(url: &str, marker: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;

    while let Some(idx) = rest.find(marker) {
        let after = &rest[idx + marker.len()..];
        match after.find('/') {
            Some(end) if end > 0 => {
                out.push_str(&rest[..idx]);
                out.push('/');
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str(&rest[..=idx]);
                rest = &rest[idx + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// True when the URL refers to a repository on the local filesystem.
#[must_use]
pub fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || (!url.contains("://") && !is_scp_like(url))
}

fn is_scp_like(url: &str) -> bool {
    // git@github.com:org/repo.git
    match url.split_once(':') {
        Some((user_host, path)) => {
            user_host.contains('@') && !user_host.contains('/') && !path.starts_with("//")
        }
        None => false,
    }
}

/// Reject strings that cannot be a clone source.
///
/// # Errors
///
/// Returns `InvalidGitUrl` for unparseable URLs, unsupported schemes, or
/// local paths that do not exist.
pub fn validate_repo_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(err!(InvalidGitUrl {
            url: url.to_string(),
            message: "URL is empty".to_string(),
        }));
    }

    if url.contains("://") {
        let parsed = Url::parse(url).map_err(|e| err!(InvalidGitUrl {
            url: url.to_string(),
            message: e.to_string(),
        }))?;
        return match parsed.scheme() {
            "http" | "https" | "ssh" | "git" | "file" => Ok(()),
            other => Err(err!(InvalidGitUrl {
                url: url.to_string(),
                message: format!("unsupported scheme '{other}'"),
            })),
        };
    }

    if is_scp_like(url) || Path::new(url).exists() {
        return Ok(());
    }

    Err(err!(InvalidGitUrl {
        url: url.to_string(),
        message: "not a URL and no such local path".to_string(),
    }))
}

/// Embed an access token in an `https://` URL. Other URLs pass through.
#[must_use]
pub fn authenticated_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return url.to_string();
    };

    match Url::parse(url) {
        Ok(mut parsed) if parsed.scheme() == "https" && parsed.username().is_empty() => {
            if parsed.set_username(token).is_ok() {
                parsed.to_string()
            } else {
                url.to_string()
            }
        }
        _ => url.to_string(),
    }
}
