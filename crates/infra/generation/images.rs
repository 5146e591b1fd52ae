use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::domain::repositories::generation::ImageModel;
use crate::domain::value_objects::enums::image_providers::ImageProvider;

const OPENAI_IMAGES_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";
const STABILITY_ENDPOINT: &str =
    "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image";

#[derive(Debug, Clone)]
pub struct ImageApiConfig {
    pub provider: ImageProvider,
    pub openai_api_key: Option<String>,
    pub stability_api_key: Option<String>,
}

/// Image generation client for the configured provider. DALL-E returns a
/// URL to download; Stability inlines the artifact as base64.
pub struct GenerativeImageClient {
    client: Client,
    config: ImageApiConfig,
}

impl GenerativeImageClient {
    pub fn new(config: ImageApiConfig) -> Result<Self> {
        match config.provider {
            ImageProvider::Dalle if config.openai_api_key.is_none() => {
                bail!("OPENAI_API_KEY not set for the dalle provider")
            }
            ImageProvider::Stability if config.stability_api_key.is_none() => {
                bail!("STABILITY_API_KEY not set for the stability provider")
            }
            _ => {}
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .expect("reqwest client must build");

        Ok(Self { client, config })
    }

    async fn generate_dalle(&self, prompt: &str) -> Result<Vec<u8>> {
        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .expect("validated at construction");

        let response = self
            .client
            .post(OPENAI_IMAGES_ENDPOINT)
            .bearer_auth(api_key)
            .json(&json!({
                "model": "dall-e-3",
                "prompt": prompt,
                // Portrait, closest available to 9:16.
                "size": "1024x1792",
                "quality": "standard",
                "n": 1,
            }))
            .send()
            .await
            .context("image generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("image generation failed with status {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("image generation response was not JSON")?;
        let image_url = body
            .get("data")
            .and_then(|data| data.get(0))
            .and_then(|first| first.get("url"))
            .and_then(Value::as_str)
            .context("image generation response carried no url")?;

        let download = self
            .client
            .get(image_url)
            .send()
            .await
            .context("image download failed")?;
        if !download.status().is_success() {
            bail!("image download failed with status {}", download.status());
        }
        let bytes = download
            .bytes()
            .await
            .context("image download body failed")?;
        Ok(bytes.to_vec())
    }

    async fn generate_stability(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let api_key = self
            .config
            .stability_api_key
            .as_deref()
            .expect("validated at construction");

        let response = self
            .client
            .post(STABILITY_ENDPOINT)
            .bearer_auth(api_key)
            .json(&json!({
                "text_prompts": [{ "text": prompt }],
                "cfg_scale": 7,
                "width": width,
                "height": height,
                "samples": 1,
                "steps": 30,
            }))
            .send()
            .await
            .context("image generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("image generation failed with status {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("image generation response was not JSON")?;
        let artifact = body
            .get("artifacts")
            .and_then(|artifacts| artifacts.get(0))
            .and_then(|first| first.get("base64"))
            .and_then(Value::as_str)
            .context("image generation response carried no artifact")?;

        decode_artifact(artifact)
    }
}

#[async_trait]
impl ImageModel for GenerativeImageClient {
    async fn generate_image(&self, prompt: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        match self.config.provider {
            ImageProvider::Dalle => self.generate_dalle(prompt).await,
            ImageProvider::Stability => self.generate_stability(prompt, width, height).await,
        }
    }
}

fn decode_artifact(artifact: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(artifact.trim())
        .context("artifact was not valid base64")
}
