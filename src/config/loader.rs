use crate::config::schema::{PatchConfig, ValidationError};
use crate::message::one_line;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    /// No `*.toml` patch files in any searched directory.
    NoPatchFiles { searched: Vec<PathBuf> },
}

impl ConfigError {
    fn at_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read patch file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                let detail = one_line(source);
                match path {
                    Some(path) => write!(f, "malformed patch file {}: {}", path.display(), detail),
                    None => write!(f, "malformed patch file: {}", detail),
                }
            }
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid patch file {}: {}", path.display(), source),
                None => write!(f, "invalid patch file: {}", source),
            },
            ConfigError::NoPatchFiles { searched } => {
                let dirs: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
                write!(f, "no .toml patch files found in {}", dirs.join(" or "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::NoPatchFiles { .. } => None,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at_path(path))
}

/// Find `*.toml` patch files, sorted by path.
///
/// `<workspace>/patches` is searched first, then `patches/` under the
/// current directory. The first directory holding any patch file wins.
pub fn discover_patch_files(workspace: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut candidates = vec![workspace.join("patches")];
    if let Ok(cwd) = std::env::current_dir() {
        let cwd_patches = cwd.join("patches");
        if !candidates.contains(&cwd_patches) {
            candidates.push(cwd_patches);
        }
    }

    for dir in &candidates {
        if !dir.is_dir() {
            continue;
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        if !files.is_empty() {
            return Ok(files);
        }
    }

    Err(ConfigError::NoPatchFiles {
        searched: candidates,
    })
}
