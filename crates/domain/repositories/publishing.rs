use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::upload::UploadJob;

#[derive(Debug, Clone)]
pub struct PublishedVideo {
    pub video_id: String,
    pub watch_url: String,
}

/// Pipeline-facing seam over the whole publish flow: credential refresh,
/// channel setup, and the resumable transfer itself.
#[automock]
#[async_trait]
pub trait VideoPublisher {
    async fn publish(&self, job: &UploadJob) -> Result<PublishedVideo>;
}
