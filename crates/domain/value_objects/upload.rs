use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

use super::enums::privacy_statuses::PrivacyStatus;

const TOP_TEN_KEYWORDS: [&str; 10] = [
    "top 10",
    "top 10 list",
    "countdown",
    "facts",
    "interesting",
    "educational",
    "trending",
    "viral",
    "shorts",
    "youtube shorts",
];

// YouTube category 24 = Entertainment.
const DEFAULT_CATEGORY_ID: &str = "24";

/// One transfer of a local file to the video host. Lives exactly as long
/// as a single call to the upload routine.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub source_path: PathBuf,
    pub metadata: VideoMetadata,
    pub chunk_size: ChunkSize,
}

/// Bytes requested per chunk. `ProviderOptimal` leaves the choice to the
/// channel (the source behavior: the whole file in one request).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSize {
    #[default]
    ProviderOptimal,
    Bytes(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
    pub self_declared_made_for_kids: bool,
}

impl VideoMetadata {
    /// Standard metadata for a Top 10 short: enforced title prefix, the
    /// fixed call-to-action/hashtag block, the stock keyword list.
    pub fn top_ten(topic: &str, summary: &str, privacy_status: PrivacyStatus) -> Self {
        let title = if topic.starts_with("Top 10") {
            topic.to_string()
        } else {
            format!("Top 10 {}", topic)
        };

        let description = format!(
            "{}\n\n\
             What do you think about this list? Drop your opinion in the comments!\n\n\
             Subscribe for more fascinating Top 10 lists about culture, beauty, \
             innovation, and human achievement from around the world.\n\n\
             #top10 #top10list #trending #viral #shorts #youtubeshorts #facts \
             #interesting #educational",
            summary
        );

        Self {
            title,
            description,
            tags: TOP_TEN_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy_status,
            self_declared_made_for_kids: false,
        }
    }
}

/// Retry bookkeeping for one job. `retry_count` only ever grows.
#[derive(Default, Debug)]
pub struct RetryState {
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl RetryState {
    pub fn record(&mut self, error: impl Into<String>) {
        self.retry_count += 1;
        self.last_error = Some(error.into());
    }
}

/// Terminal state of an upload job. Exactly one of the two is produced
/// per job; retriable errors never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed { video_id: String, retries: u32 },
    Failed(UploadFailure),
}

impl UploadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// Final response arrived without the expected identifier field.
    UnexpectedResponse { detail: String },
    /// Retry budget exhausted while only transient errors were seen.
    MaxRetriesExceeded { attempts: u32, last_error: String },
    /// Client-side error the provider will never accept on retry.
    Fatal { detail: String },
    Cancelled,
}

impl Display for UploadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadFailure::UnexpectedResponse { detail } => {
                write!(f, "unexpected final response: {}", detail)
            }
            UploadFailure::MaxRetriesExceeded {
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "max retries exceeded after {} attempts (last error: {})",
                    attempts, last_error
                )
            }
            UploadFailure::Fatal { detail } => write!(f, "fatal upload error: {}", detail),
            UploadFailure::Cancelled => write!(f, "upload cancelled"),
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
