//! VOD playlist generation
//!
//! Splits a duration into fixed-length segments and renders the m3u8 that
//! points at the per-segment transcode endpoint. Output depends only on the
//! inputs.

pub mod url;

pub use url::{encode_path, encode_query, segment_url_template};

use crate::error::{HlsError, Result};
use crate::types::SegmentDescriptor;

/// Default segment length in seconds.
pub const SEGMENT_DURATION: f64 = 6.0;

/// Query parameter carrying the explicit length of the final segment.
pub const EXPLICIT_DURATION_PARAM: &str = "sd";

/// Placeholder in segment URL templates.
pub const SEGMENT_INDEX_PLACEHOLDER: &str = "{segment_index}";

/// Ordered query parameters, as received.
pub type QueryParams = Vec<(String, String)>;

// Float division can overshoot an exact multiple by one ulp.
const REMAINDER_EPSILON: f64 = 1e-9;

fn check_segment_length(segment_length: f64) -> Result<()> {
    if !segment_length.is_finite() || segment_length <= 0.0 {
        return Err(HlsError::BadRequest(format!(
            "Invalid segment length {}",
            segment_length
        )));
    }
    Ok(())
}

/// Split `duration` into segments of `segment_length`, the last one holding
/// the remainder.
pub fn segments(duration: f64, segment_length: f64) -> Result<Vec<SegmentDescriptor>> {
    check_segment_length(segment_length)?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(HlsError::BadRequest(format!("Invalid duration {}", duration)));
    }

    let mut splits = (duration / segment_length).ceil() as usize;
    if splits > 1 && duration - (splits - 1) as f64 * segment_length <= REMAINDER_EPSILON {
        splits -= 1;
    }

    Ok((0..splits)
        .map(|i| {
            let start = i as f64 * segment_length;
            let duration = if i + 1 == splits {
                duration - start
            } else {
                segment_length
            };
            SegmentDescriptor {
                index: i,
                start,
                duration,
            }
        })
        .collect())
}

/// Render a VOD playlist.
///
/// `url_template` must contain `{segment_index}`. `params` are appended to
/// every URL in order, minus any incoming `sd`; the final URL additionally
/// carries `sd=<remainder>`.
pub fn build(
    duration: f64,
    segment_length: f64,
    url_template: &str,
    params: &[(String, String)],
) -> Result<String> {
    let segments = segments(duration, segment_length)?;
    let separator = if url_template.contains('?') { '&' } else { '?' };
    let forwarded: QueryParams = params
        .iter()
        .filter(|(k, _)| k != EXPLICIT_DURATION_PARAM)
        .cloned()
        .collect();

    let mut output = String::new();

    // Header
    output.push_str("#EXTM3U\n");
    output.push_str("#EXT-X-VERSION:3\n");
    output.push_str(&format!(
        "#EXT-X-TARGETDURATION:{}\n",
        segment_length.ceil() as u64
    ));
    output.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
    output.push_str("#EXT-X-PLAYLIST-TYPE:VOD\n");

    // Segment entries
    let last = segments.len().saturating_sub(1);
    for segment in &segments {
        let length = format!("{:.6}", segment.duration);
        output.push_str(&format!("#EXTINF:{}, nodesc\n", length));
        output.push_str(
            &url_template.replace(SEGMENT_INDEX_PLACEHOLDER, &segment.index.to_string()),
        );

        let mut query = forwarded.clone();
        if segment.index == last {
            query.push((EXPLICIT_DURATION_PARAM.to_string(), length));
        }
        if !query.is_empty() {
            output.push(separator);
            output.push_str(&encode_query(&query));
        }
        output.push('\n');
    }

    // End list
    output.push_str("#EXT-X-ENDLIST\n");

    Ok(output)
}
