//! crates/wordsprout_core/src/media.rs
//!
//! Pure string transforms for pasted video input. The lesson form accepts
//! whatever an author pastes: a bare video-host URL, full `<iframe>` embed
//! markup, or a raw 11-character video id. Everything recognized collapses to
//! the single canonical watch-URL form; everything else (direct file and
//! object-storage URLs included) passes through unchanged.

use regex::Regex;

/// Canonicalizes raw pasted video input into a watch URL.
///
/// Idempotent: the canonical form re-parses to itself.
pub fn clean_video_url(raw: &str) -> String {
    let input = raw.trim();

    // Embed markup: pull out the src attribute and canonicalize that.
    if input.starts_with("<iframe") {
        let src = Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).unwrap();
        if let Some(caps) = src.captures(input) {
            return clean_video_url(&caps[1]);
        }
        return input.to_string();
    }

    if let Some(id) = extract_video_id(input) {
        return format!("https://www.youtube.com/watch?v={id}");
    }

    input.to_string()
}

/// Extracts the 11-character video id from the recognized URL shapes, or
/// from input that is nothing but the id itself.
fn extract_video_id(input: &str) -> Option<String> {
    let patterns = [
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube(?:-nocookie)?\.com/watch\?(?:[^\s]*&)?v=([A-Za-z0-9_-]{11})",
        r"youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]{11})",
        r"^([A-Za-z0-9_-]{11})$",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(input) {
            return Some(caps[1].to_string());
        }
    }
    None
}
