use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::usecases::resumable_upload::ResumableUploader;
use crate::domain::repositories::publishing::{PublishedVideo, VideoPublisher};
use crate::domain::value_objects::upload::{UploadJob, UploadOutcome, watch_url};
use crate::infra::auth::youtube_oauth::{RefreshOutcome, StoredCredential, obtain_access_token};
use crate::infra::channels::youtube::YouTubeUploadChannel;

/// The full publish flow: refresh the credential, open a resumable
/// session, drive the upload loop. Credential refresh happens strictly
/// before the transfer; the uploader never re-authenticates mid-flight.
pub struct YouTubePublisher {
    client: Client,
    credential: StoredCredential,
    cancel: CancellationToken,
}

impl YouTubePublisher {
    pub fn new(credential: StoredCredential, cancel: CancellationToken) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Long per-request budget: a whole-file chunk PUT can run for
            // minutes on a slow uplink.
            .timeout(Duration::from_secs(15 * 60))
            .build()
            .expect("reqwest client must build");

        Self {
            client,
            credential,
            cancel,
        }
    }
}

#[async_trait]
impl VideoPublisher for YouTubePublisher {
    async fn publish(&self, job: &UploadJob) -> Result<PublishedVideo> {
        let token = match obtain_access_token(&self.client, &self.credential).await? {
            RefreshOutcome::Refreshed(token) => token,
            RefreshOutcome::ReauthRequired(reason) => {
                bail!("re-authentication required: {}", reason);
            }
        };

        let mut channel = YouTubeUploadChannel::open(self.client.clone(), &token, job).await?;
        let mut uploader = ResumableUploader::new();

        match uploader.upload(job, &mut channel, &self.cancel).await {
            UploadOutcome::Completed { video_id, retries } => {
                info!(video_id = %video_id, retries, "video published");
                Ok(PublishedVideo {
                    watch_url: watch_url(&video_id),
                    video_id,
                })
            }
            UploadOutcome::Failed(failure) => bail!("video upload failed: {}", failure),
        }
    }
}
