use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::repositories::generation::ImageModel;
use crate::domain::value_objects::content::{GeneratedImage, ImagePrompt};

pub const MAX_IMAGE_ATTEMPTS: u32 = 3;

// Anything shorter than this is a truncated download or an error page,
// not an image.
const MIN_IMAGE_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Generates one slide image per prompt, validating every payload before
/// it is written. A prompt that exhausts its attempts is skipped; a run
/// with zero successful images fails.
pub struct ImageGenerationUseCase {
    model: Arc<dyn ImageModel + Send + Sync>,
    width: u32,
    height: u32,
}

impl ImageGenerationUseCase {
    pub fn new(model: Arc<dyn ImageModel + Send + Sync>, width: u32, height: u32) -> Self {
        Self {
            model,
            width,
            height,
        }
    }

    pub async fn generate_all(
        &self,
        prompts: &[ImagePrompt],
        output_dir: &Path,
    ) -> Result<Vec<GeneratedImage>> {
        fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create image dir {}", output_dir.display()))?;

        let mut images = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            match self.generate_one(prompt, output_dir).await {
                Ok(image) => images.push(image),
                Err(err) => {
                    warn!(
                        rank = prompt.rank,
                        error = %err,
                        "image generation exhausted; skipping rank"
                    );
                }
            }
        }

        if images.is_empty() {
            bail!("no images were generated successfully");
        }

        info!(
            generated = images.len(),
            requested = prompts.len(),
            "image generation finished"
        );
        Ok(images)
    }

    async fn generate_one(&self, prompt: &ImagePrompt, output_dir: &Path) -> Result<GeneratedImage> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let reason = match self
                .model
                .generate_image(&prompt.prompt, self.width, self.height)
                .await
            {
                Ok(bytes) => match validate_image(&bytes) {
                    Ok(format) => {
                        let path = self.write_image(prompt.rank, format, &bytes, output_dir).await?;
                        info!(
                            rank = prompt.rank,
                            attempt,
                            path = %path.display(),
                            "image generated"
                        );
                        return Ok(GeneratedImage {
                            rank: prompt.rank,
                            path,
                        });
                    }
                    Err(err) => err.to_string(),
                },
                Err(err) => err.to_string(),
            };

            if attempt >= MAX_IMAGE_ATTEMPTS {
                bail!(
                    "image generation failed after {} attempts: {}",
                    attempt,
                    reason
                );
            }
            warn!(
                rank = prompt.rank,
                attempt,
                error = %reason,
                "image attempt failed; retrying"
            );
        }
    }

    async fn write_image(
        &self,
        rank: u8,
        format: ImageFormat,
        bytes: &[u8],
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let path = output_dir.join(format!("slide_{:02}.{}", rank, format.extension()));
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write image {}", path.display()))?;
        Ok(path)
    }
}

/// Cheap structural check on a generated payload: a plausible size and a
/// known magic number. Providers occasionally return JSON error bodies or
/// truncated downloads with a 200.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat> {
    if bytes.len() < MIN_IMAGE_BYTES {
        bail!("payload too small to be an image ({} bytes)", bytes.len());
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }
    bail!("payload is neither PNG nor JPEG");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::generation::MockImageModel;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(4096, 0);
        bytes
    }

    fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(4096, 0);
        bytes
    }

    fn prompts(count: u8) -> Vec<ImagePrompt> {
        (1..=count)
            .map(|rank| ImagePrompt {
                rank,
                prompt: format!("scene {}", rank),
            })
            .collect()
    }

    #[test]
    fn validate_accepts_png_and_jpeg() {
        assert_eq!(validate_image(&png_bytes()).unwrap(), ImageFormat::Png);
        assert_eq!(validate_image(&jpeg_bytes()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn validate_rejects_short_and_unknown_payloads() {
        assert!(validate_image(&[0x89, b'P']).is_err());
        let mut not_an_image = b"{\"error\": \"rate limited\"}".to_vec();
        not_an_image.resize(4096, b' ');
        assert!(validate_image(&not_an_image).is_err());
    }

    #[tokio::test]
    async fn retries_invalid_payload_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut model = MockImageModel::new();
        model.expect_generate_image().returning(move |_, _, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(b"garbage".to_vec())
            } else {
                Ok(png_bytes())
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let usecase = ImageGenerationUseCase::new(Arc::new(model), 1080, 1920);
        let images = usecase.generate_all(&prompts(1), dir.path()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(images.len(), 1);
        assert!(images[0].path.exists());
        assert!(images[0].path.to_string_lossy().ends_with("slide_01.png"));
    }

    #[tokio::test]
    async fn skips_prompt_after_exhausting_attempts() {
        let mut model = MockImageModel::new();
        model.expect_generate_image().returning(|prompt, _, _| {
            if prompt == "scene 1" {
                Err(anyhow::anyhow!("provider refused"))
            } else {
                Ok(png_bytes())
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let usecase = ImageGenerationUseCase::new(Arc::new(model), 1080, 1920);
        let images = usecase.generate_all(&prompts(2), dir.path()).await.unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].rank, 2);
    }

    #[tokio::test]
    async fn zero_images_fails_the_run() {
        let mut model = MockImageModel::new();
        model
            .expect_generate_image()
            .times(MAX_IMAGE_ATTEMPTS as usize)
            .returning(|_, _, _| Err(anyhow::anyhow!("provider refused")));

        let dir = tempfile::tempdir().unwrap();
        let usecase = ImageGenerationUseCase::new(Arc::new(model), 1080, 1920);
        assert!(usecase.generate_all(&prompts(1), dir.path()).await.is_err());
    }
}
