use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::repositories::upload_channel::{ChunkOutcome, UploadChannel};
use crate::domain::value_objects::upload::{
    RetryState, UploadFailure, UploadJob, UploadOutcome, watch_url,
};

pub const MAX_RETRIES: u32 = 10;

// Ceiling exponent for the backoff; 2^10 = 1024 seconds maximum single sleep.
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Drives a chunked, resumable transfer to the video host. The channel
/// owns the byte offset; this loop only classifies outcomes, counts
/// retries, and sleeps. Every exit path is a typed `UploadOutcome`, so
/// callers never branch on errors to drive control flow.
pub struct ResumableUploader {
    max_retries: u32,
    rng: StdRng,
}

impl Default for ResumableUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumableUploader {
    pub fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic backoff sampling for tests.
    pub fn with_rng_seed(seed: u64) -> Self {
        Self {
            max_retries: MAX_RETRIES,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub async fn upload(
        &mut self,
        job: &UploadJob,
        channel: &mut (dyn UploadChannel + Send),
        cancel: &CancellationToken,
    ) -> UploadOutcome {
        let mut retry = RetryState::default();
        info!(
            source = %job.source_path.display(),
            title = %job.metadata.title,
            "upload starting"
        );

        loop {
            if cancel.is_cancelled() {
                warn!("upload cancelled");
                return UploadOutcome::Failed(UploadFailure::Cancelled);
            }

            match channel.request_next_chunk().await {
                ChunkOutcome::Progress(progress) => {
                    info!(
                        bytes_sent = progress.bytes_sent,
                        total_bytes = progress.total_bytes,
                        "upload progress"
                    );
                }
                ChunkOutcome::Final(response) => {
                    return match response.video_id() {
                        Some(video_id) => {
                            info!(
                                video_id = %video_id,
                                url = %watch_url(video_id),
                                retries = retry.retry_count,
                                "upload completed"
                            );
                            UploadOutcome::Completed {
                                video_id: video_id.to_string(),
                                retries: retry.retry_count,
                            }
                        }
                        None => {
                            // The provider closed the session without an id.
                            // Retrying an acknowledged completion risks a
                            // duplicate remote object, so this is terminal.
                            error!(fields = %response.fields(), "final response missing video id");
                            UploadOutcome::Failed(UploadFailure::UnexpectedResponse {
                                detail: response.fields().to_string(),
                            })
                        }
                    };
                }
                ChunkOutcome::Error(err) if err.is_retriable() => {
                    retry.record(err.to_string());
                    if retry.retry_count > self.max_retries {
                        error!(
                            attempts = retry.retry_count,
                            last_error = %err,
                            "max retries exceeded; upload failed"
                        );
                        return UploadOutcome::Failed(UploadFailure::MaxRetriesExceeded {
                            attempts: retry.retry_count,
                            last_error: err.to_string(),
                        });
                    }

                    let delay = full_jitter_delay(&mut self.rng, retry.retry_count);
                    warn!(
                        retry = retry.retry_count,
                        error = %err,
                        sleep_secs = delay.as_secs_f64(),
                        "retriable upload error; backing off"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            warn!("upload cancelled during backoff");
                            return UploadOutcome::Failed(UploadFailure::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ChunkOutcome::Error(err) => {
                    error!(status = ?err.status(), error = %err, "fatal upload error");
                    return UploadOutcome::Failed(UploadFailure::Fatal {
                        detail: err.to_string(),
                    });
                }
            }
        }
    }
}

/// Full jitter: a uniform sample below an exponentially growing ceiling
/// of `2^retry_count` seconds, so competing clients do not retry in
/// lockstep against a briefly overloaded backend.
pub fn full_jitter_delay(rng: &mut impl Rng, retry_count: u32) -> Duration {
    let exponent = retry_count.min(MAX_BACKOFF_EXPONENT);
    let ceiling_secs = (1u64 << exponent) as f64;
    Duration::from_secs_f64(rng.r#gen::<f64>() * ceiling_secs)
}
