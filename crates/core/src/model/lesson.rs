use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Shown when lesson prose could not be generated.
pub const PLACEHOLDER_LESSON_TEXT: &str = "Could not load step content.";

/// Shown when remedial prose could not be generated.
pub const PLACEHOLDER_REMEDIAL_TEXT: &str =
    "Let's revisit the last few steps together before trying the checkpoint again.";

/// Generic video used when no better match is found.
pub const PLACEHOLDER_VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VideoRefError {
    #[error("video reference cannot be empty")]
    Empty,

    #[error("video reference is not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported video URL scheme: {0}")]
    UnsupportedScheme(String),
}

//
// ─── VIDEO ─────────────────────────────────────────────────────────────────────
//

/// An absolute http(s) link to a video.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoRef(Url);

impl VideoRef {
    /// # Errors
    ///
    /// Returns `VideoRefError` for blank input, unparsable URLs, or a scheme
    /// other than `http`/`https`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, VideoRefError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(VideoRefError::Empty);
        }
        let url = Url::parse(s).map_err(|e| VideoRefError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(VideoRefError::UnsupportedScheme(other.to_owned())),
        }
    }

    /// Generic fallback video.
    ///
    /// # Panics
    ///
    /// Panics if the placeholder constant cannot be parsed.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::parse(PLACEHOLDER_VIDEO_URL).expect("placeholder video url should be valid")
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.as_str() == PLACEHOLDER_VIDEO_URL
    }

    /// Player-embeddable URL for YouTube links, `None` for anything else.
    #[must_use]
    pub fn embed_url(&self) -> Option<String> {
        youtube_video_id(&self.0).map(|id| format!("https://www.youtube.com/embed/{id}"))
    }
}

fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_owned),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed" | "v" | "shorts" | "live") => segments.next().map(str::to_owned),
                _ => None,
            }
        }
        _ => None,
    }?;

    let valid = candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(candidate)
}

impl fmt::Debug for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VideoRef({})", self.0)
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for VideoRef {
    type Error = VideoRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VideoRef> for String {
    fn from(value: VideoRef) -> Self {
        value.0.into()
    }
}

//
// ─── LESSON CONTENT ────────────────────────────────────────────────────────────
//

/// Prose plus a companion video for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    pub text: String,
    pub video: VideoRef,
}

impl LessonContent {
    #[must_use]
    pub fn new(text: impl Into<String>, video: VideoRef) -> Self {
        Self {
            text: text.into(),
            video,
        }
    }

    /// Degraded content used when generation fails.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_LESSON_TEXT, VideoRef::placeholder())
    }
}

/// Lesson content as stored in the offline cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLessonContent {
    pub content: LessonContent,
    pub fetched_at: DateTime<Utc>,
}

//
// ─── AUDIO ─────────────────────────────────────────────────────────────────────
//

/// Synthesized narration for a lesson.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank_and_non_http() {
        assert_eq!(VideoRef::parse("  ").unwrap_err(), VideoRefError::Empty);
        assert!(matches!(
            VideoRef::parse("ftp://example.com/v.mp4").unwrap_err(),
            VideoRefError::UnsupportedScheme(_)
        ));
        assert!(matches!(
            VideoRef::parse("not a url").unwrap_err(),
            VideoRefError::InvalidUrl(_)
        ));
    }

    #[test]
    fn embed_url_handles_watch_and_short_links() {
        let watch = VideoRef::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").unwrap();
        assert_eq!(
            watch.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );

        let short = VideoRef::parse("https://youtu.be/abcdefghijk").unwrap();
        assert_eq!(
            short.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abcdefghijk")
        );
    }

    #[test]
    fn embed_url_is_none_for_other_hosts_or_bad_ids() {
        let vimeo = VideoRef::parse("https://vimeo.com/12345").unwrap();
        assert!(vimeo.embed_url().is_none());

        let short_id = VideoRef::parse("https://www.youtube.com/watch?v=abc").unwrap();
        assert!(short_id.embed_url().is_none());
    }

    #[test]
    fn placeholder_is_recognised() {
        assert!(VideoRef::placeholder().is_placeholder());
        assert!(LessonContent::placeholder().video.is_placeholder());
    }

    #[test]
    fn video_ref_serializes_as_string() {
        let v = VideoRef::parse("https://youtu.be/abcdefghijk").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"https://youtu.be/abcdefghijk\"");
        let back: VideoRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
