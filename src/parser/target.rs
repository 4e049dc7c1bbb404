//! Pulls platform identifiers out of user-supplied URLs.
//!
//! Each extractor is a single pattern match: a hit returns the captured
//! identifier, a miss returns `None`. Nothing else is validated.

use once_cell::sync::Lazy;
use regex::Regex;

static PLAY_STORE_APP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=([\w\.]+)").expect("valid app id regex"));

static TIKTOK_VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/video/(\d+)").expect("valid tiktok video regex"));

static YOUTUBE_VIDEO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/shorts/|/embed/)([A-Za-z0-9_-]{11})")
        .expect("valid youtube url regex")
});

/// App ID following `id=` in a Play Store link
pub fn extract_app_id(url: &str) -> Option<String> {
    PLAY_STORE_APP_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Numeric video ID following `/video/` in a TikTok link
pub fn extract_tiktok_video_id(url: &str) -> Option<String> {
    TIKTOK_VIDEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Video ID from a YouTube link, or the input itself when it is a bare ID
pub fn extract_youtube_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(id) = YOUTUBE_VIDEO_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
    {
        return Some(id.as_str().to_string());
    }

    // anything that looks like a url but has no video marker is a miss
    if input.contains('/') || input.contains('?') {
        return None;
    }

    Some(input.to_string())
}
