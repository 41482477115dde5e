//! Media library
//!
//! Maps request paths onto files under the configured media root.

use std::path::{Component, Path, PathBuf};

use hls_transcode_lib::{HlsError, MediaFile};

use crate::error::{Result, ServerError};

/// Files under one root directory.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            ServerError::Config(format!("media path {}: {}", root.display(), e))
        })?;
        if !root.is_dir() {
            return Err(ServerError::Config(format!(
                "media path {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative request path onto the root. Absolute paths and `..`
    /// are refused; the file need not exist.
    pub fn resolve(&self, user_path: &str) -> std::result::Result<PathBuf, HlsError> {
        let rel = Path::new(user_path.trim_start_matches('/'));
        if user_path.trim_matches('/').is_empty() {
            return Err(HlsError::NotFound("Missing media path.".to_string()));
        }
        let mut out = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(HlsError::NotFound(format!(
                        "Invalid path was given. '{}'.",
                        user_path
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Resolve and stat a media file.
    pub fn open(&self, user_path: &str) -> std::result::Result<MediaFile, HlsError> {
        let path = self.resolve(user_path)?;
        MediaFile::open(&path)
            .map_err(|_| HlsError::NotFound(format!("Invalid path was given. '{}'.", user_path)))
    }

    /// Path relative to the root, `/`-separated.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}

/// Content type from file extension.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" | "mts" => "video/mp2t",
        "mpg" | "mpeg" => "video/mpeg",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "ogv" => "video/ogg",
        "3gp" => "video/3gpp",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "ass" | "ssa" => "text/x-ssa",
        "txt" | "nfo" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Fail unless the file looks like a video.
pub fn require_video(path: &Path) -> std::result::Result<&'static str, HlsError> {
    let mime = mime_type(path);
    if mime.starts_with("video/") {
        Ok(mime)
    } else {
        Err(HlsError::UnsupportedMedia(format!(
            "Unable to analyze file '{}' as it has '{}' mimetype.",
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            mime
        )))
    }
}
