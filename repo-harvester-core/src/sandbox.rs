//! Destination directory setup with containment checks.
//!
//! All directories a run creates must stay lexical descendants of the
//! working directory. Containment is checked on lexically normalised paths
//! (`.` and `..` folded, no symlink resolution) before anything is created.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::error::HarvestError;

/// A validated `{working_dir}/{base_dir}/{org_dir}` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPath {
    pub working_dir: PathBuf,
    pub base_path: PathBuf,
    pub org_path: PathBuf,
    /// The org directory existed before this run.
    pub pre_existing: bool,
}

impl DestinationPath {
    /// Directory a repository named `name` is cloned into.
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.org_path.join(name)
    }
}

/// Validate and create the two-level destination directory.
///
/// Both levels are checked before either is created, so an escaping
/// `org_dir` leaves no half-built `base_dir` behind. A pre-existing org
/// directory only produces a warning.
pub fn establish(
    working_dir: &Path,
    base_dir: &Path,
    org_dir: &Path,
) -> Result<DestinationPath, HarvestError> {
    let working_dir = absolute(working_dir)?;
    let base_path = contain(&working_dir, base_dir)?;
    let org_path = contain(&working_dir, &base_path.join(org_dir))?;

    fs::create_dir_all(&base_path).map_err(|source| HarvestError::Io {
        path: base_path.clone(),
        source,
    })?;

    let pre_existing = org_path.exists();
    if pre_existing {
        warn!(
            path = %org_path.display(),
            "Organization directory already exists, cloning will proceed inside it"
        );
    } else {
        fs::create_dir_all(&org_path).map_err(|source| HarvestError::Io {
            path: org_path.clone(),
            source,
        })?;
    }

    info!(
        base_path = %base_path.display(),
        org_path = %org_path.display(),
        pre_existing,
        "Destination established"
    );

    Ok(DestinationPath {
        working_dir,
        base_path,
        org_path,
        pre_existing,
    })
}

/// Join `relative` onto `working_dir` and return the normalised result,
/// or [`HarvestError::PathEscape`] if it is not inside `working_dir`.
///
/// An absolute `relative` replaces the working directory entirely and is
/// therefore only accepted if it already points inside it.
pub fn contain(working_dir: &Path, relative: &Path) -> Result<PathBuf, HarvestError> {
    let root = normalize_lexically(working_dir);
    let candidate = normalize_lexically(&root.join(relative));
    if candidate.starts_with(&root) {
        Ok(candidate)
    } else {
        Err(HarvestError::PathEscape {
            path: candidate,
            working_dir: root,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, HarvestError> {
    if path.is_absolute() {
        return Ok(normalize_lexically(path));
    }
    let cwd = std::env::current_dir().map_err(|source| HarvestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_lexically(&cwd.join(path)))
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root, matching how the OS resolves it.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `name` is usable as exactly one directory level.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
