//! Path validation shared by the file tools.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathValidationError {
    #[error("Path traversal rejected: {path}")]
    PathTraversal { path: String },

    #[error("Path is forbidden ({pattern}): {path}")]
    ForbiddenPath { path: String, pattern: String },

    #[error("Path is outside the allowed roots: {path}")]
    OutsideAllowedRoots { path: String },

    #[error("Failed to canonicalize {path}: {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Validate a path against allowed roots and forbidden prefixes.
///
/// Traversal segments are rejected on the raw string before any filesystem
/// access; existing paths are canonicalized so symlinks cannot escape the
/// allowed roots.
pub fn validate_path(
    path: &str,
    allowed_roots: &[String],
    forbidden_paths: &[String],
) -> Result<PathBuf, PathValidationError> {
    let input_path = Path::new(path);

    let normalized = path.replace('\\', "/");
    if normalized.contains("../") || normalized.contains("/..") || normalized == ".." {
        return Err(PathValidationError::PathTraversal { path: path.into() });
    }

    // Resolve symlinks for existing paths; for writes, resolve the parent.
    let canonical = if input_path.exists() {
        input_path
            .canonicalize()
            .map_err(|e| PathValidationError::CanonicalizeFailed {
                path: path.into(),
                reason: e.to_string(),
            })?
    } else if let Some(parent) = input_path.parent().filter(|p| p.exists()) {
        parent
            .canonicalize()
            .map_err(|e| PathValidationError::CanonicalizeFailed {
                path: path.into(),
                reason: format!("Parent dir: {e}"),
            })?
            .join(input_path.file_name().unwrap_or_default())
    } else {
        input_path.to_path_buf()
    };

    let canonical_str = canonical.to_string_lossy().replace('\\', "/");

    for forbidden in forbidden_paths {
        if canonical_str.starts_with(forbidden.as_str()) {
            return Err(PathValidationError::ForbiddenPath {
                path: path.into(),
                pattern: forbidden.clone(),
            });
        }
    }

    if !allowed_roots.is_empty()
        && !allowed_roots
            .iter()
            .any(|root| canonical_str.starts_with(root.as_str()))
    {
        return Err(PathValidationError::OutsideAllowedRoots { path: path.into() });
    }

    Ok(canonical)
}
