use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::domain::repositories::generation::TextGenerator;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "gemini-pro".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

pub struct GeminiTextGenerator {
    client: Client,
    config: GeminiConfig,
}

impl GeminiTextGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client must build");

        Self { client, config }
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await
            .context("text generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("text generation failed with status {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("text generation response was not JSON")?;
        let text =
            extract_candidate_text(&body).context("model response carried no candidate text")?;
        Ok(text.to_string())
    }
}

fn extract_candidate_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Top 10 Hidden Libraries" }] }
            }]
        });
        assert_eq!(
            extract_candidate_text(&body),
            Some("Top 10 Hidden Libraries")
        );
    }

    #[test]
    fn missing_candidates_yield_none() {
        assert_eq!(extract_candidate_text(&json!({})), None);
        assert_eq!(extract_candidate_text(&json!({ "candidates": [] })), None);
    }
}
