//! Patch runner: read one target, run its rule set, write it back.
//!
//! Content is read once and written at most once. The write goes through a
//! tempfile in the target's directory followed by fsync and rename, so a
//! failure leaves either the old file or the fully patched one.

use crate::rule::PatternError;
use crate::ruleset::{RuleOutcome, RuleSet};
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A single text document, read and fully overwritten by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    path: PathBuf,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A rule set bound to the one target it edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSet {
    pub name: String,
    pub target: Target,
    pub rules: RuleSet,
}

impl PatchSet {
    pub fn new(name: impl Into<String>, target: Target, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            target,
            rules,
        }
    }

    pub fn run(&self, mode: RunMode) -> Result<PatchReport, PatchError> {
        patch_file(self.target.path(), &self.rules, mode)
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("{}: file not found", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("{}: I/O error: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: PatternError,
    },
}

impl PatchError {
    pub fn path(&self) -> &Path {
        match self {
            PatchError::FileNotFound { path }
            | PatchError::Io { path, .. }
            | PatchError::Pattern { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Write the patched content back to the target.
    #[default]
    Write,
    /// Compute the result but leave the target untouched.
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// Content changed (and was written, unless dry-run).
    Patched,
    /// Rules produced the input unchanged; nothing was written.
    Unchanged,
}

/// What a run did to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use = "PatchReport should be checked for the patch status"]
pub struct PatchReport {
    pub target: PathBuf,
    pub status: PatchStatus,
    pub dry_run: bool,
    pub rules: Vec<RuleOutcome>,
    #[serde(skip)]
    pub before: String,
    #[serde(skip)]
    pub after: String,
}

impl PatchReport {
    pub fn total_replacements(&self) -> usize {
        self.rules.iter().map(|r| r.replacements).sum()
    }
}

/// Run `rules` against the file at `path`.
pub fn patch_file(
    path: &Path,
    rules: &RuleSet,
    mode: RunMode,
) -> Result<PatchReport, PatchError> {
    let compiled = rules.compile().map_err(|source| PatchError::Pattern {
        path: path.to_path_buf(),
        source,
    })?;

    let before = read_target(path)?;
    let output = compiled.apply(&before);

    let status = if output.content == before {
        PatchStatus::Unchanged
    } else {
        PatchStatus::Patched
    };

    match (status, mode) {
        (PatchStatus::Patched, RunMode::Write) => {
            atomic_write(path, output.content.as_bytes()).map_err(|source| PatchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(
                file = %path.display(),
                replacements = output.total_replacements(),
                "patched"
            );
        }
        (PatchStatus::Patched, RunMode::DryRun) => {
            info!(file = %path.display(), "would patch (dry run)");
        }
        (PatchStatus::Unchanged, _) => {
            debug!(file = %path.display(), "no rule changed the content");
        }
    }

    Ok(PatchReport {
        target: path.to_path_buf(),
        status,
        dry_run: mode == RunMode::DryRun,
        rules: output.outcomes,
        before,
        after: output.content,
    })
}

fn read_target(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => PatchError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PatchError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Tempfile in the same directory, fsync, rename. Keeps the original
/// file's permissions. Symlinks are resolved first so the rename replaces
/// the file they point to, not the link.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let path = fs::canonicalize(path)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("/"));
    let permissions = fs::metadata(&path)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().set_permissions(permissions)?;
    temp.as_file().sync_all()?;
    temp.persist(&path).map_err(|e| e.error)?;

    Ok(())
}
