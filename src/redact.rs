//! Redaction helpers.
//!
//! Any string that may have touched the API secret or an access token
//! (transport errors, platform `errmsg` values, raw response bodies)
//! must pass through [`scrub`] before it is embedded in an error or a
//! log field.

/// Marker substituted for redacted material.
pub const REDACTED: &str = "<redacted>";

/// Maximum length for a response body embedded in an error.
pub const MAX_BODY_LENGTH: usize = 4000;

/// Replaces every occurrence of each needle in `input` with the
/// redaction marker. Empty needles are skipped.
pub fn scrub(input: &str, needles: &[&str]) -> String {
    let mut out = input.to_string();
    for needle in needles {
        if needle.is_empty() {
            continue;
        }
        if out.contains(needle) {
            out = out.replace(needle, REDACTED);
        }
    }
    out
}

/// Truncates a string to at most `max_len` bytes, backing off to the
/// nearest character boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
