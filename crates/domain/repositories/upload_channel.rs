use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use std::fmt::Display;

/// Outcome of one chunk round trip, classified once at the channel
/// boundary. The retry loop decides retriability from `ChunkError` alone
/// and never inspects transport error types itself.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// Bytes were accepted but the transfer is not finished yet.
    Progress(TransferProgress),
    /// The provider acknowledged the full stream and closed the session.
    Final(FinalResponse),
    Error(ChunkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

/// Provider fields from the terminal response. Opaque beyond the
/// identifier the uploader needs.
#[derive(Debug, Clone)]
pub struct FinalResponse {
    fields: Value,
}

impl FinalResponse {
    pub fn new(fields: Value) -> Self {
        Self { fields }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Value {
        &self.fields
    }
}

#[derive(Debug, Clone)]
pub struct ChunkError {
    retriable: bool,
    status: Option<u16>,
    detail: String,
}

impl ChunkError {
    pub fn retriable(detail: impl Into<String>) -> Self {
        Self {
            retriable: true,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn retriable_status(status: u16, detail: impl Into<String>) -> Self {
        Self {
            retriable: true,
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn fatal(detail: impl Into<String>) -> Self {
        Self {
            retriable: false,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn fatal_status(status: u16, detail: impl Into<String>) -> Self {
        Self {
            retriable: false,
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retriable
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for ChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {}: {}", status, self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

/// Chunked-upload RPC surface of the video host. The channel is the
/// single source of truth for transfer progress: after an error, the next
/// `request_next_chunk` call continues where the confirmed offset left
/// off, never from byte zero.
#[automock]
#[async_trait]
pub trait UploadChannel {
    async fn request_next_chunk(&mut self) -> ChunkOutcome;
}
