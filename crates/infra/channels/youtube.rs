use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use mime_guess::MimeGuess;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tracing::{info, warn};
use url::Url;

use crate::domain::repositories::upload_channel::{
    ChunkError, ChunkOutcome, FinalResponse, TransferProgress, UploadChannel,
};
use crate::domain::value_objects::upload::{ChunkSize, UploadJob, VideoMetadata};
use crate::infra::auth::youtube_oauth::AccessToken;

const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

// The resumable protocol requires chunk sizes in multiples of 256 KiB.
const CHUNK_GRANULARITY: u64 = 256 * 1024;

const RETRIABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// One resumable-upload session against the video host. The channel is
/// the single source of truth for transfer progress: it tracks the last
/// confirmed offset and, after a failed round trip, re-synchronizes with
/// a status probe before sending more bytes.
pub struct YouTubeUploadChannel {
    client: Client,
    access_token: String,
    session_uri: Url,
    source_path: PathBuf,
    total_bytes: u64,
    chunk_bytes: u64,
    confirmed_offset: u64,
    needs_offset_probe: bool,
    pending_final: Option<FinalResponse>,
}

impl YouTubeUploadChannel {
    /// Initiates the session: posts the video resource, keeps the session
    /// URI from the `Location` header. Fails fast on any non-success
    /// status; session initiation is not part of the chunk retry loop.
    pub async fn open(client: Client, token: &AccessToken, job: &UploadJob) -> Result<Self> {
        let metadata = fs::metadata(&job.source_path).await.with_context(|| {
            format!("video file not found: {}", job.source_path.display())
        })?;
        let total_bytes = metadata.len();
        if total_bytes == 0 {
            bail!("video file is empty: {}", job.source_path.display());
        }

        let content_type = MimeGuess::from_path(&job.source_path)
            .first_raw()
            .unwrap_or("video/mp4");

        let response = client
            .post(UPLOAD_ENDPOINT)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token.token)
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", total_bytes.to_string())
            .json(&video_resource(&job.metadata))
            .send()
            .await
            .context("failed to initiate resumable upload session")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("upload session rejected with status {}: {}", status, body);
        }

        let session_uri = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .context("upload session response carried no Location header")?;
        let session_uri = Url::parse(session_uri).context("invalid upload session URI")?;

        info!(
            source = %job.source_path.display(),
            total_bytes,
            "resumable upload session opened"
        );

        Ok(Self {
            client,
            access_token: token.token.clone(),
            session_uri,
            source_path: job.source_path.clone(),
            total_bytes,
            chunk_bytes: resolve_chunk_size(job.chunk_size, total_bytes),
            confirmed_offset: 0,
            needs_offset_probe: false,
            pending_final: None,
        })
    }

    /// Asks the provider where the transfer stands (`bytes */total`).
    /// Updates the confirmed offset on 308; stashes the final response if
    /// the upload turns out to be already complete.
    async fn probe_offset(&mut self) -> Result<(), ChunkError> {
        let result = self
            .client
            .put(self.session_uri.clone())
            .bearer_auth(&self.access_token)
            .header(CONTENT_RANGE, format!("bytes */{}", self.total_bytes))
            .header(CONTENT_LENGTH, 0)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => return Err(classify_transport_error(&err)),
        };

        let status = response.status();
        if status.as_u16() == 308 {
            self.confirmed_offset = response
                .headers()
                .get(RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_range_end)
                .map(|end| end + 1)
                .unwrap_or(0);
            self.needs_offset_probe = false;
            info!(
                confirmed_offset = self.confirmed_offset,
                total_bytes = self.total_bytes,
                "upload offset re-synchronized"
            );
            return Ok(());
        }

        if status.is_success() {
            // The previous chunk actually landed; the provider closed the
            // session while the response was lost in transit.
            let fields = response.json::<Value>().await.unwrap_or(Value::Null);
            self.pending_final = Some(FinalResponse::new(fields));
            self.needs_offset_probe = false;
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(classify_status(status, detail))
    }

    async fn read_chunk(&self, offset: u64, len: u64) -> std::io::Result<Bytes> {
        let mut file = fs::File::open(&self.source_path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut buffer = vec![0u8; len as usize];
        file.read_exact(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }
}

#[async_trait]
impl UploadChannel for YouTubeUploadChannel {
    async fn request_next_chunk(&mut self) -> ChunkOutcome {
        if let Some(final_response) = self.pending_final.take() {
            return ChunkOutcome::Final(final_response);
        }

        if self.needs_offset_probe {
            if let Err(err) = self.probe_offset().await {
                return ChunkOutcome::Error(err);
            }
            if let Some(final_response) = self.pending_final.take() {
                return ChunkOutcome::Final(final_response);
            }
        }

        if self.confirmed_offset >= self.total_bytes {
            // Every byte is on the server but no final response has been
            // seen; ask the provider to close out the session.
            if let Err(err) = self.probe_offset().await {
                return ChunkOutcome::Error(err);
            }
            return match self.pending_final.take() {
                Some(final_response) => ChunkOutcome::Final(final_response),
                None => ChunkOutcome::Error(ChunkError::retriable(
                    "transfer complete but the session is still open",
                )),
            };
        }

        let offset = self.confirmed_offset;
        let len = (self.total_bytes - offset).min(self.chunk_bytes);
        let chunk = match self.read_chunk(offset, len).await {
            Ok(chunk) => chunk,
            // Local reads share the generic-I/O classification: the file
            // may be on flaky network storage.
            Err(err) => {
                return ChunkOutcome::Error(ChunkError::retriable(format!(
                    "failed to read chunk at offset {}: {}",
                    offset, err
                )));
            }
        };
        let end = offset + chunk.len() as u64 - 1;

        let result = self
            .client
            .put(self.session_uri.clone())
            .bearer_auth(&self.access_token)
            .header(
                CONTENT_RANGE,
                format!("bytes {}-{}/{}", offset, end, self.total_bytes),
            )
            .header(CONTENT_LENGTH, chunk.len())
            .body(chunk)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.needs_offset_probe = true;
                return ChunkOutcome::Error(classify_transport_error(&err));
            }
        };

        let status = response.status();
        if status.as_u16() == 308 {
            self.confirmed_offset = response
                .headers()
                .get(RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_range_end)
                .map(|range_end| range_end + 1)
                .unwrap_or(end + 1);
            return ChunkOutcome::Progress(TransferProgress {
                bytes_sent: self.confirmed_offset,
                total_bytes: self.total_bytes,
            });
        }

        if status.is_success() {
            let fields = match response.json::<Value>().await {
                Ok(fields) => fields,
                Err(err) => {
                    warn!(error = %err, "final response body was unreadable");
                    Value::Null
                }
            };
            return ChunkOutcome::Final(FinalResponse::new(fields));
        }

        let detail = response.text().await.unwrap_or_default();
        let err = classify_status(status, detail);
        if err.is_retriable() {
            self.needs_offset_probe = true;
        }
        ChunkOutcome::Error(err)
    }
}

fn video_resource(metadata: &VideoMetadata) -> Value {
    json!({
        "snippet": {
            "title": metadata.title,
            "description": metadata.description,
            "tags": metadata.tags,
            "categoryId": metadata.category_id,
        },
        "status": {
            "privacyStatus": metadata.privacy_status.to_string(),
            "selfDeclaredMadeForKids": metadata.self_declared_made_for_kids,
        },
    })
}

fn classify_status(status: StatusCode, detail: String) -> ChunkError {
    let code = status.as_u16();
    if RETRIABLE_STATUS_CODES.contains(&code) {
        ChunkError::retriable_status(code, detail)
    } else {
        ChunkError::fatal_status(code, detail)
    }
}

/// Everything reqwest raises mid-flight maps to the retriable-transport
/// class (connection reset, incomplete read, timeouts); only request
/// construction failures are fatal.
fn classify_transport_error(err: &reqwest::Error) -> ChunkError {
    if err.is_builder() {
        ChunkError::fatal(format!("malformed upload request: {}", err))
    } else {
        ChunkError::retriable(format!("transport error: {}", err))
    }
}

/// `Range: bytes=0-12345` → 12345.
fn parse_range_end(header: &str) -> Option<u64> {
    header
        .trim()
        .strip_prefix("bytes=")?
        .split('-')
        .next_back()?
        .parse()
        .ok()
}

fn resolve_chunk_size(requested: ChunkSize, total_bytes: u64) -> u64 {
    match requested {
        // Provider-optimal: the whole file in a single request.
        ChunkSize::ProviderOptimal => total_bytes,
        ChunkSize::Bytes(bytes) => {
            let rounded = bytes.max(1).div_ceil(CHUNK_GRANULARITY) * CHUNK_GRANULARITY;
            rounded.min(total_bytes.max(1))
        }
    }
}
