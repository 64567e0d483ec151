//! Workspace directory enforcement.

use std::path::{Path, PathBuf};

use crate::error::{ExecError, Result};

/// A resolved, existing directory that commands run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Resolve `path` to an absolute directory, creating it if needed.
    ///
    /// There is no fallback: if the directory cannot be created, or the path
    /// exists but is not a directory, the intent is aborted with
    /// [`ExecError::Workspace`].
    pub fn ensure(path: &Path) -> Result<Self> {
        let root = std::path::absolute(path).map_err(|e| ExecError::Workspace {
            path: path.to_path_buf(),
            reason: format!("cannot resolve path: {e}"),
        })?;

        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| ExecError::Workspace {
                path: root.clone(),
                reason: format!("cannot create directory: {e}"),
            })?;
            tracing::info!(path = %root.display(), "created workspace directory");
        }

        if !root.is_dir() {
            return Err(ExecError::Workspace {
                path: root,
                reason: "exists but is not a directory".into(),
            });
        }

        Ok(Self { root })
    }

    /// The absolute workspace path.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
