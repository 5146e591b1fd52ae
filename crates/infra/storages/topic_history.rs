use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::repositories::topic_history::TopicHistoryStore;
use crate::domain::value_objects::topics::{TopicHistoryEntry, prepend_topic};

use super::s3::{S3Config, build_s3_client};

#[derive(Debug, Clone)]
pub struct TopicHistoryConfig {
    pub s3: S3Config,
    pub bucket: String,
    pub object_key: String,
    pub max_entries: usize,
}

/// Persistent topic history as one JSON object in an S3-compatible
/// bucket. Reads are tolerant: a missing or malformed object starts a
/// fresh history instead of failing topic selection.
pub struct S3TopicHistoryStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    object_key: String,
    max_entries: usize,
}

impl S3TopicHistoryStore {
    pub async fn new(config: TopicHistoryConfig) -> Result<Self> {
        let client = build_s3_client(&config.s3)
            .await
            .context("failed to build topic history s3 client")?;

        Ok(Self {
            client,
            bucket: config.bucket,
            object_key: config.object_key,
            max_entries: config.max_entries,
        })
    }

    async fn load(&self) -> Vec<TopicHistoryEntry> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.object_key)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    info!(
                        bucket = %self.bucket,
                        key = %self.object_key,
                        "no topic history yet; starting fresh"
                    );
                } else {
                    warn!(
                        bucket = %self.bucket,
                        key = %self.object_key,
                        error = %service_err,
                        "failed to load topic history; starting fresh"
                    );
                }
                return Vec::new();
            }
        };

        let bytes = match output.body.collect().await {
            Ok(data) => data.into_bytes(),
            Err(err) => {
                warn!(error = %err, "failed to read topic history body; starting fresh");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<TopicHistoryEntry>>(&bytes) {
            Ok(entries) => {
                info!(entries = entries.len(), "topic history loaded");
                entries
            }
            Err(err) => {
                warn!(error = %err, "topic history was not valid JSON; starting fresh");
                Vec::new()
            }
        }
    }

    async fn save(&self, entries: &[TopicHistoryEntry]) -> Result<()> {
        let body = serde_json::to_vec_pretty(entries).context("failed to serialize history")?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.object_key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| {
                format!(
                    "failed to save topic history to {}/{}",
                    self.bucket, self.object_key
                )
            })?;

        info!(entries = entries.len(), "topic history saved");
        Ok(())
    }
}

#[async_trait]
impl TopicHistoryStore for S3TopicHistoryStore {
    async fn recent_topics(&self, limit: usize) -> Result<Vec<String>> {
        let entries = self.load().await;
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|entry| entry.topic)
            .collect())
    }

    async fn record_topic(&self, topic: &str, category: &str) -> Result<()> {
        let mut entries = self.load().await;
        prepend_topic(
            &mut entries,
            TopicHistoryEntry {
                topic: topic.to_string(),
                category: category.to_string(),
                timestamp: Utc::now(),
            },
            self.max_entries,
        );
        self.save(&entries).await
    }
}
