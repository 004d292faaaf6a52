//! Call-scoped scratch directory for intermediate merge outputs.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "m4s_work_";

/// A uniquely named scratch directory, removed recursively when closed
/// or dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed workspace {}", path.display());
        Ok(())
    }

    /// Run `f` inside a fresh workspace and remove the workspace afterwards.
    ///
    /// The only error is failing to create the workspace; `f`'s own result
    /// is returned as-is. A failed removal is logged, not returned. If `f`
    /// panics the directory is removed while unwinding.
    pub fn with_scratch<T>(root: Option<&Path>, f: impl FnOnce(&Path) -> T) -> io::Result<T> {
        let workspace = Self::create(root)?;
        let value = f(workspace.path());
        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            tracing::warn!("Failed to remove workspace {}: {}", path.display(), e);
        }
        Ok(value)
    }
}
