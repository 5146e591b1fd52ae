use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[automock]
#[async_trait]
pub trait TopicHistoryStore {
    /// Most recently used topics, newest first.
    async fn recent_topics(&self, limit: usize) -> Result<Vec<String>>;

    async fn record_topic(&self, topic: &str, category: &str) -> Result<()>;
}
