use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[automock]
#[async_trait]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[automock]
#[async_trait]
pub trait ImageModel {
    /// Returns the raw encoded image (PNG or JPEG). Callers validate the
    /// payload before trusting it.
    async fn generate_image(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>>;
}

#[automock]
#[async_trait]
pub trait SpeechSynthesizer {
    /// Returns encoded narration audio (MP3).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
