//! HTTP `Range` header resolution for direct downloads

use crate::error::{HlsError, Result};
use crate::types::ByteRange;

fn parse_offset(value: &str, header: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| HlsError::BadRequest(format!("Malformed range header '{}'", header)))
}

/// Resolve an optional `Range` header against a file of `total` bytes.
///
/// Only a single `bytes=` range is served; multi-range requests are
/// unsatisfiable. `end` is clamped to the last byte.
pub fn resolve_range(header: Option<&str>, total: u64) -> Result<ByteRange> {
    let Some(header) = header else {
        return Ok(ByteRange {
            start: 0,
            end: total.saturating_sub(1),
            total,
            partial: false,
        });
    };

    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(|| HlsError::BadRequest(format!("Unsupported range unit '{}'", header)))?;

    let unsatisfiable = HlsError::Unsatisfiable { size: total };
    if spec.contains(',') {
        return Err(unsatisfiable);
    }

    let (first, last) = spec
        .split_once('-')
        .ok_or_else(|| HlsError::BadRequest(format!("Malformed range header '{}'", header)))?;
    let (first, last) = (first.trim(), last.trim());

    if total == 0 {
        return Err(unsatisfiable);
    }
    let last_byte = total - 1;

    let (start, end) = match (first.is_empty(), last.is_empty()) {
        // -N: final N bytes
        (true, false) => {
            let n = parse_offset(last, header)?;
            if n == 0 {
                return Err(unsatisfiable);
            }
            (total.saturating_sub(n), last_byte)
        }
        // N-: from N to the end
        (false, true) => (parse_offset(first, header)?, last_byte),
        (false, false) => (parse_offset(first, header)?, parse_offset(last, header)?),
        (true, true) => {
            return Err(HlsError::BadRequest(format!(
                "Malformed range header '{}'",
                header
            )))
        }
    };

    let end = end.min(last_byte);
    if start > end || start >= total {
        return Err(unsatisfiable);
    }

    Ok(ByteRange {
        start,
        end,
        total,
        partial: true,
    })
}
