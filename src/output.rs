use serde::{Deserialize, Serialize};

use crate::{Segment, Transcript, VideoMetadata};

/// Response format requested by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Text,
    Plain,
}

/// JSON body returned by the download endpoint
#[derive(Debug, Serialize)]
pub struct TranscriptResponse<'a> {
    pub url: &'a str,
    pub video_id: &'a str,
    pub language: &'a str,
    pub transcript: &'a [Segment],
    pub metadata: &'a VideoMetadata,
}

impl<'a> TranscriptResponse<'a> {
    pub fn new(url: &'a str, transcript: &'a Transcript, metadata: &'a VideoMetadata) -> Self {
        Self {
            url,
            video_id: &transcript.video_id,
            language: &transcript.language,
            transcript: &transcript.segments,
            metadata,
        }
    }
}

/// Render transcript as plain text (one segment per line, no timestamps)
pub fn render_plain(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a header with the video metadata followed by timestamped lines
pub fn render_text(transcript: &Transcript, metadata: &VideoMetadata) -> String {
    let mut out = format!(
        "Title: {}\nChannel: {}\nURL: {}\n",
        metadata.title, metadata.channel, metadata.url
    );
    for segment in &transcript.segments {
        out.push('\n');
        out.push_str(&format!("[{}] {}", format_timestamp(segment.start), segment.text));
    }
    out
}

/// `mm:ss`, or `h:mm:ss` past the first hour
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
