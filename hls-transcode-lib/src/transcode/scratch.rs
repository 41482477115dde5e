//! Scratch aliases for transcoder inputs
//!
//! The transcoder never sees real media paths. Each run gets symlinks with
//! random names in the scratch directory, removed when the guard drops.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{HlsError, Result};

pub const VIDEO_ALIAS_PREFIX: &str = "ffmpeg-";
pub const SUBTITLE_ALIAS_PREFIX: &str = "ffmpeg-external-sub-";

/// A symlink that is removed on drop.
#[derive(Debug)]
pub struct ScratchAlias {
    path: PathBuf,
}

impl ScratchAlias {
    /// Create `dir/<prefix><random hex>` pointing at `target`.
    pub fn create(dir: &Path, prefix: &str, target: &Path) -> Result<Self> {
        let target = target.canonicalize().map_err(|e| {
            HlsError::ScratchAlias(format!("cannot resolve {}: {}", target.display(), e))
        })?;
        let path = dir.join(format!("{}{}", prefix, Uuid::new_v4().simple()));

        symlink(&target, &path).map_err(|e| {
            HlsError::ScratchAlias(format!("{} -> {}: {}", path.display(), target.display(), e))
        })?;
        debug!("scratch alias {} -> {}", path.display(), target.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchAlias {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove scratch alias {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
