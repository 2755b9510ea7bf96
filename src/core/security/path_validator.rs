use std::io;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Invalid path segment '{segment}'")]
    InvalidSegment { segment: String },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Validates that `segment` is usable as a single directory name.
///
/// Tool ids arrive from URLs, so anything that could change the directory
/// level (separators, `.`, `..`) or that is empty is rejected.
pub fn validate_segment(segment: &str) -> Result<&str, PathSecurityError> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == segment && !segment.contains(['/', '\\']) =>
        {
            Ok(segment)
        }
        _ => Err(PathSecurityError::InvalidSegment {
            segment: segment.to_string(),
        }),
    }
}

/// Returns true when a relative path only descends (no `..`, no root).
pub fn is_descending(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Validates that an existing `path` resolves inside `root`.
///
/// Both paths are canonicalized first, so `..` segments and symlinks are
/// resolved before the containment check.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The canonicalized, validated path
/// * `Err(PathSecurityError)` - If validation fails
pub fn confine_path(path: &Path, root: &Path) -> Result<PathBuf, PathSecurityError> {
    let canonical_root = canonicalize_path(root)?;
    let canonical_path = canonicalize_path(path)?;

    if !is_within_root(&canonical_path, &canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

/// Checks if a path is within (or equal to) a root directory
fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}
