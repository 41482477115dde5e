//! URL encoding helpers for playlist entries

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Form encoding; space is written as `+` afterwards.
const FORM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

/// Percent-encode each `/`-separated component of a relative media path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|leaf| utf8_percent_encode(leaf, COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_form(s: &str) -> String {
    utf8_percent_encode(s, FORM).to_string().replace("%20", "+")
}

/// Encode `key=value` pairs, in order, as a query string.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_form(k), encode_form(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Segment URL template for a media path relative to the library root.
pub fn segment_url_template(media_path: &str) -> String {
    format!(
        "/segments/{{segment_index}}/{}",
        encode_path(media_path.trim_start_matches('/'))
    )
}
