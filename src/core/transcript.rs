use crate::core::item::ItemId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use yt_transcript_rs::{FetchedTranscript, api::YouTubeTranscriptApi};

/// Source of full-text transcripts for discovered items.
#[async_trait(?Send)]
pub trait TranscriptSource {
    /// Returns the joined transcript text, or `None` when the item has no
    /// usable transcript in the requested languages.
    async fn fetch_transcript(&self, id: &ItemId) -> Result<Option<String>>;
}

#[derive(Clone)]
pub struct TranscriptService {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl TranscriptService {
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::transcript(format!("failed to initialise client: {e}")))?;
        Ok(Self { api, languages })
    }

    pub async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        match self.api.fetch_transcript(video_id, &languages, false).await {
            Ok(transcript) => Ok(transcript),
            Err(e) => Err(Error::transcript(format!("{video_id}: {e}"))),
        }
    }
}

#[async_trait(?Send)]
impl TranscriptSource for TranscriptService {
    async fn fetch_transcript(&self, id: &ItemId) -> Result<Option<String>> {
        match self.fetch(id.as_str()).await {
            Ok(transcript) => {
                debug!(
                    item = %id,
                    language = %transcript.language_code,
                    generated = transcript.is_generated,
                    segments = transcript.snippets.len(),
                    "transcript fetched"
                );
                let text = join_segments(transcript.snippets.iter().map(|s| s.text.as_str()));
                Ok((!text.is_empty()).then_some(text))
            }
            Err(e) => {
                warn!(item = %id, error = %e, "no transcript available");
                Ok(None)
            }
        }
    }
}

/// Joins caption segments into one line of text separated by single spaces.
pub fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(|segment| html_escape::decode_html_entities(segment))
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_video_id(url: &str) -> Option<String> {
    // Extract video ID from various YouTube URL formats
    let raw_id = if let Some(v_param) = url.split("v=").nth(1) {
        v_param.split('&').next().unwrap_or(v_param)
    } else if let Some(youtu_be) = url.split("youtu.be/").nth(1) {
        youtu_be.split('?').next().unwrap_or(youtu_be)
    } else if let Some(short) = url.split("/shorts/").nth(1) {
        short.split(['?', '/']).next().unwrap_or(short)
    } else {
        url
    };

    sanitize_video_id(raw_id).ok()
}

const MAX_VIDEO_ID_LEN: usize = 128;

/// Ensure a video identifier is safe for downstream use (URLs, API calls, log fields).
/// Only ASCII alphanumeric characters plus `_` and `-` are allowed.
pub fn sanitize_video_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::custom("Video ID cannot be empty"));
    }

    if trimmed.len() > MAX_VIDEO_ID_LEN {
        return Err(Error::custom("Video ID is unexpectedly long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::custom(
            "Video ID contains unsupported characters; expected only letters, numbers, '-' or '_'",
        ));
    }

    Ok(trimmed.to_string())
}
