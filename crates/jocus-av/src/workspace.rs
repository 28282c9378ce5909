//! Scratch storage for a single packaging run.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch workspace owned by one packaging run.
///
/// Backed by a temporary directory that is removed when the workspace is
/// dropped, on every exit path. The fetched source, every transcoded
/// rendition, and the manifest live here until they are published.
///
/// # Example
///
/// ```no_run
/// use jocus_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// let input = workspace.file("input.mp4");
/// let rendition_dir = workspace.subdir("hls/240p")?;
/// // workspace and all files under it are removed on drop
/// # Ok::<(), jocus_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new scratch workspace.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().map_err(|e| Error::Workspace(e.to_string()))?;
        Ok(Self { temp_dir })
    }

    /// Get the workspace root path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get a file path directly under the workspace root.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create (if needed) and return a subdirectory of the workspace.
    pub fn subdir<P: AsRef<Path>>(&self, rel: P) -> Result<PathBuf> {
        let dir = self.temp_dir.path().join(rel.as_ref());
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Workspace(format!(
                "failed to create directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }
}
