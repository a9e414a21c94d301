use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Private scratch directory for one unit of work, removed when dropped.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Creates `root/<stem>-<uuid>`.
    pub fn create(root: &Path, stem: &str) -> Result<Self> {
        let path = root.join(format!("{}-{}", stem, Uuid::new_v4()));
        fs::create_dir_all(&path)
            .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        debug!("Created staging directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.path.join(name);
        fs::write(&target, bytes)
            .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", target.display(), e)))?;
        Ok(target)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed staging directory {}", self.path.display()),
            Err(e) => debug!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// Moves a staged file into `output_dir`, copying when a rename crosses devices.
pub fn promote(staged: &Path, output_dir: &Path) -> Result<PathBuf> {
    let name = staged.file_name().ok_or_else(|| {
        PipelineError::OutputWriteError(format!("{}: not a file", staged.display()))
    })?;
    fs::create_dir_all(output_dir)
        .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", output_dir.display(), e)))?;

    let target = output_dir.join(name);
    if fs::rename(staged, &target).is_err() {
        fs::copy(staged, &target)
            .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", target.display(), e)))?;
    }
    Ok(target)
}

/// Promotes every staged file or none of them. Files already moved are
/// removed again when a later one fails.
pub fn promote_all(staged: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut promoted = Vec::with_capacity(staged.len());
    for path in staged {
        match promote(path, output_dir) {
            Ok(target) => promoted.push(target),
            Err(e) => {
                for target in &promoted {
                    if let Err(remove) = fs::remove_file(target) {
                        debug!("Could not roll back {}: {}", target.display(), remove);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(promoted)
}
