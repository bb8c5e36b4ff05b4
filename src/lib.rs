pub mod config;
pub mod output;
pub mod rate_limit;
pub mod server;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Caption track for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

/// Title and channel scraped from the watch page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub channel: String,
    pub url: String,
}

pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";

impl VideoMetadata {
    /// Metadata used when the watch page could not be read
    pub fn unknown(url: String) -> Self {
        Self {
            title: String::new(),
            channel: UNKNOWN_CHANNEL.to_string(),
            url,
        }
    }
}

pub fn watch_url(base_url: &str, video_id: &str) -> String {
    format!("{}/watch?v={video_id}", base_url.trim_end_matches('/'))
}

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

// Tried in order; the last entry is the catch-all for any `v=ID` or `/ID` segment
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/live/([a-zA-Z0-9_-]{11})",
        r"(?:v=|/)([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/)|youtu\.be/)[\w-]+")
        .unwrap()
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}

/// Loose shape check for URLs accepted by the download endpoint
pub fn is_youtube_url(input: &str) -> bool {
    YOUTUBE_URL.is_match(input.trim())
}
