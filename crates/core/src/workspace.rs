//! Scoped temporary workspaces
//!
//! Every decode gets its own workspace directory that is removed when the
//! handle is dropped, on success and error paths alike. Cleanup failures
//! are ignored.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory prefix for workspaces, so stray ones are recognizable
pub const WORKSPACE_PREFIX: &str = "apkscout-";

/// A temporary directory tied to the lifetime of this handle
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| {
                Error::workspace("Failed to create temporary workspace").with_source(e)
            })?;
        Ok(Self { dir })
    }

    /// Create a workspace under a caller-supplied parent directory
    ///
    /// The parent is created first if it does not exist.
    pub fn in_dir(parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::workspace(format!(
                "Failed to create workspace parent {}",
                parent.display()
            ))
            .with_source(e)
        })?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| {
                Error::workspace(format!(
                    "Failed to create temporary workspace in {}",
                    parent.display()
                ))
                .with_source(e)
            })?;
        Ok(Self { dir })
    }

    /// Path of the workspace directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Detach the directory from cleanup and return its path
    pub fn keep(self) -> PathBuf {
        self.dir.into_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_created_with_prefix() {
        let ws = Workspace::new().unwrap();
        assert!(ws.path().is_dir());
        let name = ws.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(WORKSPACE_PREFIX));
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let path = {
            let ws = Workspace::new().unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_keep_survives() {
        let path = Workspace::new().unwrap().keep();
        assert!(path.is_dir());
        std::fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_workspace_in_dir_creates_parent() {
        let base = tempfile::tempdir().unwrap();
        let parent = base.path().join("scratch/decodes");

        let ws = Workspace::in_dir(&parent).unwrap();
        assert!(ws.path().starts_with(&parent));
        assert!(ws.path().is_dir());
    }
}
