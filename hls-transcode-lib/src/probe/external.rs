//! Sibling subtitle discovery

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::Result;
use crate::types::ExternalSubtitle;

/// Default subtitle file extensions.
pub const DEFAULT_SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "smi", "sub", "vtt"];

fn language_infix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(\w{2,3})\.\w{3}$").expect("valid regex"))
}

/// Find subtitle files next to `media` whose name starts with its stem.
///
/// `movie.mkv` matches `movie.srt`, `Movie.en.srt` and `movie.forced.ass`.
/// Language comes from a `.xx.`/`.xxx.` infix right before the extension.
pub fn find_external_subtitles(
    media: &Path,
    extensions: &[String],
) -> Result<Vec<ExternalSubtitle>> {
    let (Some(dir), Some(stem), Some(own_name)) = (
        media.parent(),
        media.file_stem().map(|s| s.to_string_lossy().to_lowercase()),
        media.file_name(),
    ) else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == own_name || !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.starts_with(&stem) {
            continue;
        }
        let Some(ext) = Path::new(&name).extension().map(|e| e.to_string_lossy().to_string())
        else {
            continue;
        };
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }

        let language = language_infix()
            .captures(&name)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "und".to_string());

        found.push(ExternalSubtitle {
            path: entry.path(),
            language,
            codec_long_name: format!("text/{}", ext),
            codec_name: ext,
        });
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}
