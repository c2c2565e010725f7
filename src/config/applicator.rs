//! Patch applicator - runs loaded patch files against a workspace
//!
//! This module:
//! - Resolves each patch file's target and keeps it inside the workspace
//! - Runs the patch set through the runner (or a dry run)
//! - Evaluates patch sets read-only for `check`
//!
//! Every patch file is independent. Whether a failure stops the remaining
//! files is the caller's choice via [`FailurePolicy`].

use crate::config::schema::PatchConfig;
use crate::runner::{PatchError, PatchReport, PatchSet, PatchStatus, RunMode, Target};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to do with the remaining patch files after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep going; every file gets a result.
    #[default]
    BestEffort,
    /// Stop at the first failure; later files get no result.
    FailFast,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub mode: RunMode,
    pub policy: FailurePolicy,
}

/// Errors during patch application
#[derive(Debug)]
pub enum ApplicationError {
    /// Target resolves outside the workspace or into a protected directory
    Safety { path: PathBuf, source: SafetyError },
    /// Read, rule compilation, or write failed
    Patch(PatchError),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Safety { path, source } => {
                write!(f, "{}: refused: {}", path.display(), source)
            }
            ApplicationError::Patch(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Safety { source, .. } => Some(source),
            ApplicationError::Patch(e) => Some(e),
        }
    }
}

impl From<PatchError> for ApplicationError {
    fn from(e: PatchError) -> Self {
        ApplicationError::Patch(e)
    }
}

/// Read-only verdict for one patch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Running the rules would change nothing.
    Applied,
    /// Running the rules would make `replacements` changes.
    Pending { replacements: usize },
    /// A second run over the patched output would change it again.
    NotIdempotent,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Applied => write!(f, "already applied"),
            CheckStatus::Pending { replacements } => {
                write!(f, "pending ({} replacements)", replacements)
            }
            CheckStatus::NotIdempotent => write!(f, "not idempotent"),
        }
    }
}

/// Resolve the target and make sure the workspace guard accepts it.
///
/// A missing target is passed through unchanged so the runner reports it as
/// file-not-found rather than as a path resolution failure.
fn resolve_checked(
    config: &PatchConfig,
    guard: &WorkspaceGuard,
) -> Result<PathBuf, ApplicationError> {
    let path = config.resolve_target(guard.workspace_root());
    if !path.exists() {
        return Ok(path);
    }
    // Non-workspace-relative targets are relative to the current directory.
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|e| ApplicationError::Safety {
                path: path.clone(),
                source: e.into(),
            })?
            .join(&path)
    };
    guard
        .validate_path(&path)
        .map_err(|source| ApplicationError::Safety { path, source })
}

fn workspace_guard(workspace_root: &Path) -> Result<WorkspaceGuard, ApplicationError> {
    WorkspaceGuard::new(workspace_root).map_err(|source| ApplicationError::Safety {
        path: workspace_root.to_path_buf(),
        source,
    })
}

/// Apply one patch file to the workspace.
pub fn apply_patch_set(
    config: &PatchConfig,
    workspace_root: &Path,
    mode: RunMode,
) -> Result<PatchReport, ApplicationError> {
    let guard = workspace_guard(workspace_root)?;
    apply_with_guard(config, &guard, mode)
}

fn apply_with_guard(
    config: &PatchConfig,
    guard: &WorkspaceGuard,
    mode: RunMode,
) -> Result<PatchReport, ApplicationError> {
    let target = resolve_checked(config, guard)?;
    let patch_set = PatchSet::new(config.name(), Target::new(target), config.rule_set());

    debug!(
        patch_set = %patch_set.name,
        rules = patch_set.rules.len(),
        "applying"
    );
    Ok(patch_set.run(mode)?)
}

/// Apply patch files in order.
///
/// Returns `(name, result)` pairs in input order. Under
/// [`FailurePolicy::FailFast`] the list ends at the first error.
pub fn apply_patch_sets(
    configs: &[PatchConfig],
    workspace_root: &Path,
    options: ApplyOptions,
) -> Vec<(String, Result<PatchReport, ApplicationError>)> {
    let guard = match workspace_guard(workspace_root) {
        Ok(guard) => guard,
        Err(e) => {
            // Nothing can run without a workspace; report against the first file.
            let name = configs.first().map(|c| c.name().to_string()).unwrap_or_default();
            return vec![(name, Err(e))];
        }
    };

    let mut results = Vec::with_capacity(configs.len());
    for config in configs {
        let result = apply_with_guard(config, &guard, options.mode);
        let failed = result.is_err();
        if let Err(e) = &result {
            debug!(patch_set = config.name(), error = %e, "patch set failed");
        }
        results.push((config.name().to_string(), result));

        if failed && options.policy == FailurePolicy::FailFast {
            break;
        }
    }
    results
}

/// Evaluate a patch file without touching the workspace.
pub fn check_patch_set(
    config: &PatchConfig,
    workspace_root: &Path,
) -> Result<CheckStatus, ApplicationError> {
    let report = apply_patch_set(config, workspace_root, RunMode::DryRun)?;

    let compiled = config
        .rule_set()
        .compile()
        .map_err(|source| PatchError::Pattern {
            path: report.target.clone(),
            source,
        })?;
    if !compiled.is_idempotent(&report.before) {
        return Ok(CheckStatus::NotIdempotent);
    }

    Ok(match report.status {
        PatchStatus::Unchanged => CheckStatus::Applied,
        PatchStatus::Patched => CheckStatus::Pending {
            replacements: report.total_replacements(),
        },
    })
}
