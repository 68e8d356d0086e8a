//! Writing generated modifications back into the working copy.

use crate::err;
use crate::error::{Result, ResultExt};
use crate::types::{FileModification, WriteOutcome};
use std::path::{Component, Path, PathBuf};

/// Applies [`FileModification`]s under a repository root.
///
/// ```rust,no_run
/// use tfscope::writer::FileWriter;
/// use tfscope::types::FileModification;
/// use std::path::Path;
///
/// let modification = FileModification {
///     path: "main.tf".into(),
///     original: String::new(),
///     modified: "locals {}\n".into(),
/// };
/// let outcome = FileWriter::apply(Path::new("./repo"), &[modification], false);
/// assert_eq!(outcome.written, vec!["main.tf".to_string()]);
/// ```
pub struct FileWriter;

impl FileWriter {
    /// Write every modification, or only report them when `dry_run` is set.
    ///
    /// A failure for one file is recorded in [`WriteOutcome::failed`] and the
    /// remaining files are still written.
    pub fn apply(root: &Path, modifications: &[FileModification], dry_run: bool) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();

        for modification in modifications {
            let target = match safe_target(root, &modification.path) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!(file = %modification.path, error = %e, "Rejected write target");
                    outcome.failed.push((modification.path.clone(), e.to_string()));
                    continue;
                }
            };

            if dry_run {
                tracing::info!(file = %modification.path, "Dry run, not writing");
                outcome.previewed.push(modification.path.clone());
                continue;
            }

            match write_file(&target, &modification.modified) {
                Ok(()) => {
                    tracing::info!(file = %modification.path, bytes = modification.modified.len(), "Wrote file");
                    outcome.written.push(modification.path.clone());
                }
                Err(e) => {
                    tracing::error!(file = %modification.path, error = %e, "Failed to write file");
                    outcome.failed.push((modification.path.clone(), e.to_string()));
                }
            }
        }

        outcome
    }
}

/// Resolve `relative` under `root`, refusing absolute paths and `..`.
fn safe_target(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    let escapes = relative.is_empty()
        || rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(err!(UnsafePath { path: rel.to_path_buf() }));
    }
    Ok(root.join(rel))
}

fn write_file(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).with_path(parent)?;
    }
    std::fs::write(target, content).with_path(target)
}
