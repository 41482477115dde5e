//! Transcoder argument synthesis
//!
//! Pure functions: the same request, selection, window and alias paths
//! always give the same argument list.

use std::path::Path;

use super::options::TranscodeRequest;
use crate::error::{HlsError, Result};
use crate::selector::{Selection, SubtitleMode};

/// Time window of one segment, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f64,
    pub length: f64,
}

impl SegmentWindow {
    pub fn new(segment_index: usize, segment_length: f64, explicit: Option<f64>) -> Result<Self> {
        if !segment_length.is_finite() || segment_length <= 0.0 {
            return Err(HlsError::BadRequest(format!(
                "Invalid segment length {}",
                segment_length
            )));
        }
        let start = if segment_index == 0 {
            0.0
        } else {
            segment_index as f64 * segment_length
        };
        Ok(Self {
            start,
            length: explicit.unwrap_or(segment_length),
        })
    }
}

/// Scratch paths handed to the transcoder.
#[derive(Debug, Clone, Copy)]
pub struct InputAliases<'a> {
    pub video: &'a Path,
    pub subtitle: Option<&'a Path>,
}

fn push<I, S>(args: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.extend(items.into_iter().map(Into::into));
}

/// Build the transcoder argument list (program name excluded).
pub fn build_args(
    request: &TranscodeRequest,
    selection: &Selection,
    window: SegmentWindow,
    aliases: InputAliases<'_>,
    hwaccel_device: &str,
) -> Vec<String> {
    let video_alias = aliases.video.to_string_lossy();
    let mut args = Vec::with_capacity(64);

    push(&mut args, ["-xerror", "-hide_banner", "-loglevel", "error"]);

    if request.hwaccel() {
        push(&mut args, ["-hwaccel", "vaapi", "-hwaccel_device"]);
        args.push(hwaccel_device.to_string());
        push(&mut args, ["-hwaccel_output_format", "vaapi"]);
    }

    // Segment timing
    push(&mut args, ["-ss".to_string(), format!("{:.6}", window.start)]);
    push(&mut args, ["-t".to_string(), format!("{:.6}", window.length)]);
    args.push("-copyts".to_string());
    push(&mut args, ["-i".to_string(), format!("file:{}", video_alias)]);
    push(&mut args, ["-pix_fmt", "yuv420p", "-g", "52"]);

    // Video
    match &selection.subtitle {
        SubtitleMode::Overlay {
            container_index, ..
        } => {
            push(
                &mut args,
                [
                    "-filter_complex".to_string(),
                    format!("[0:v:0][0:{}]overlay[v]", container_index),
                ],
            );
            push(&mut args, ["-map", "[v]"]);
        }
        _ => push(&mut args, ["-map", "0:v:0"]),
    }

    push(&mut args, ["-strict", "-2"]);
    push(&mut args, ["-codec:v".to_string(), request.video_codec.clone()]);
    if !request.copies_video() {
        push(&mut args, ["-crf".to_string(), request.video_crf.to_string()]);
        push(&mut args, ["-preset:v".to_string(), request.video_preset.clone()]);
        if let Some(bitrate) = &request.video_bitrate {
            push(&mut args, ["-b:v".to_string(), bitrate.clone()]);
        }
        push(&mut args, ["-level".to_string(), request.video_level.clone()]);
        push(&mut args, ["-profile:v".to_string(), request.video_profile.clone()]);
    }

    // Audio
    match selection.audio {
        Some(local_index) => {
            push(&mut args, ["-map".to_string(), format!("0:a:{}", local_index)]);
            push(&mut args, ["-codec:a".to_string(), request.audio_codec.clone()]);
            if !request.copies_audio() {
                push(&mut args, ["-b:a".to_string(), request.audio_bitrate.clone()]);
                push(&mut args, ["-ar".to_string(), request.audio_sampling_rate.to_string()]);
                push(&mut args, ["-ac".to_string(), request.audio_channels.to_string()]);
            }
        }
        None => args.push("-an".to_string()),
    }

    // Subtitles
    match &selection.subtitle {
        SubtitleMode::External(path) => {
            let sub = aliases.subtitle.unwrap_or(path.as_path());
            push(
                &mut args,
                [
                    "-vf".to_string(),
                    format!("subtitles={}", escape_filter_value(&sub.to_string_lossy())),
                ],
            );
        }
        SubtitleMode::BurnIn { local_index } => {
            push(
                &mut args,
                [
                    "-vf".to_string(),
                    format!(
                        "subtitles={}:stream_index={}",
                        escape_filter_value(&video_alias),
                        local_index
                    ),
                ],
            );
        }
        SubtitleMode::Overlay { .. } | SubtitleMode::None => args.push("-sn".to_string()),
    }

    // Output
    push(&mut args, ["-muxdelay", "0", "-f", "mpegts", "pipe:1"]);

    args
}

/// Escape a filter option value, then the filtergraph description around it.
fn escape_filter_value(value: &str) -> String {
    let mut option = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option.push('\\');
        }
        option.push(c);
    }
    let mut graph = String::with_capacity(option.len());
    for c in option.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph.push('\\');
        }
        graph.push(c);
    }
    graph
}
