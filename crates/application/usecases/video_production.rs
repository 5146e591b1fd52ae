use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::repositories::generation::SpeechSynthesizer;
use crate::domain::repositories::rendering::{
    AssembledVideo, AssemblySpec, SlideRenderer, VideoAssembler,
};
use crate::domain::value_objects::content::{GeneratedImage, VideoContent};

#[derive(Debug, Clone)]
pub struct ProductionSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub seconds_per_slide: f64,
}

impl Default for ProductionSettings {
    fn default() -> Self {
        // Vertical shorts format.
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            seconds_per_slide: 3.0,
        }
    }
}

/// Builds the finished video: title slide, one slide per item (the
/// generated image, or a rendered text slide when generation skipped the
/// rank), CTA slide, optional narration track.
pub struct VideoProductionUseCase {
    renderer: Arc<dyn SlideRenderer + Send + Sync>,
    synthesizer: Arc<dyn SpeechSynthesizer + Send + Sync>,
    assembler: Arc<dyn VideoAssembler + Send + Sync>,
    settings: ProductionSettings,
}

impl VideoProductionUseCase {
    pub fn new(
        renderer: Arc<dyn SlideRenderer + Send + Sync>,
        synthesizer: Arc<dyn SpeechSynthesizer + Send + Sync>,
        assembler: Arc<dyn VideoAssembler + Send + Sync>,
        settings: ProductionSettings,
    ) -> Self {
        Self {
            renderer,
            synthesizer,
            assembler,
            settings,
        }
    }

    pub async fn produce(
        &self,
        content: &VideoContent,
        images: &[GeneratedImage],
        work_dir: &Path,
        output_path: &Path,
    ) -> Result<AssembledVideo> {
        fs::create_dir_all(work_dir)
            .await
            .with_context(|| format!("failed to create work dir {}", work_dir.display()))?;

        let slides = self.collect_slides(content, images, work_dir).await?;
        let narration = self.synthesize_narration(content, work_dir).await;

        let spec = AssemblySpec {
            slides,
            narration,
            output: output_path.to_path_buf(),
            width: self.settings.width,
            height: self.settings.height,
            fps: self.settings.fps,
            seconds_per_slide: self.settings.seconds_per_slide,
        };

        let video = self.assembler.assemble(&spec).await?;
        info!(
            path = %video.path.display(),
            duration_sec = ?video.duration_sec,
            size_bytes = video.size_bytes,
            "video assembled"
        );
        Ok(video)
    }

    async fn collect_slides(
        &self,
        content: &VideoContent,
        images: &[GeneratedImage],
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut slides = Vec::with_capacity(content.research.items.len() + 2);

        let title_png = self
            .renderer
            .render_title_slide(&content.topic)
            .await
            .context("failed to render title slide")?;
        slides.push(self.write_slide(work_dir, "slide_title.png", &title_png).await?);

        for item in &content.research.items {
            match images.iter().find(|image| image.rank == item.rank) {
                Some(image) => slides.push(image.path.clone()),
                None => {
                    // No generated image for this rank; the text slide
                    // carries the item on its own.
                    let png = self
                        .renderer
                        .render_item_slide(item.rank, &item.name, &item.tagline)
                        .await
                        .with_context(|| {
                            format!("failed to render item slide for rank {}", item.rank)
                        })?;
                    let name = format!("slide_item_{:02}.png", item.rank);
                    slides.push(self.write_slide(work_dir, &name, &png).await?);
                }
            }
        }

        let cta_png = self
            .renderer
            .render_cta_slide(&content.topic)
            .await
            .context("failed to render cta slide")?;
        slides.push(self.write_slide(work_dir, "slide_cta.png", &cta_png).await?);

        Ok(slides)
    }

    async fn write_slide(&self, work_dir: &Path, name: &str, png: &[u8]) -> Result<PathBuf> {
        let path = work_dir.join(name);
        fs::write(&path, png)
            .await
            .with_context(|| format!("failed to write slide {}", path.display()))?;
        Ok(path)
    }

    /// Narration failures degrade to a silent video rather than failing
    /// the production step.
    async fn synthesize_narration(&self, content: &VideoContent, work_dir: &Path) -> Option<PathBuf> {
        let narration_text = content.script.narration();
        if narration_text.is_empty() {
            return None;
        }

        match self.synthesizer.synthesize(&narration_text).await {
            Ok(bytes) => {
                let path = work_dir.join("narration.mp3");
                match fs::write(&path, &bytes).await {
                    Ok(()) => {
                        info!(path = %path.display(), bytes = bytes.len(), "narration synthesized");
                        Some(path)
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to write narration; producing silent video");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "narration synthesis failed; producing silent video");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::generation::MockSpeechSynthesizer;
    use crate::domain::repositories::rendering::{MockSlideRenderer, MockVideoAssembler};
    use crate::domain::value_objects::content::{
        ImagePrompt, ItemScript, ResearchData, TopTenItem, VideoScript,
    };

    fn content(items: u8) -> VideoContent {
        VideoContent {
            topic: "Top 10 Rivers".to_string(),
            research: ResearchData {
                items: (1..=items)
                    .rev()
                    .map(|rank| TopTenItem {
                        rank,
                        name: format!("River {}", rank),
                        tagline: "Long and wide".to_string(),
                        facts: vec![],
                    })
                    .collect(),
            },
            script: VideoScript {
                hook: "Stay for number one.".to_string(),
                items_script: vec![ItemScript {
                    rank: 1,
                    name: "River 1".to_string(),
                    script: "The longest of all.".to_string(),
                }],
                cta: "Subscribe.".to_string(),
            },
            image_prompts: vec![ImagePrompt {
                rank: 1,
                prompt: "a river".to_string(),
            }],
        }
    }

    fn renderer_for(expected_item_slides: usize) -> MockSlideRenderer {
        let mut renderer = MockSlideRenderer::new();
        renderer
            .expect_render_title_slide()
            .times(1)
            .returning(|_| Ok(vec![1]));
        renderer
            .expect_render_item_slide()
            .times(expected_item_slides)
            .returning(|_, _, _| Ok(vec![2]));
        renderer
            .expect_render_cta_slide()
            .times(1)
            .returning(|_| Ok(vec![3]));
        renderer
    }

    fn assembler_echoing_spec() -> (MockVideoAssembler, Arc<std::sync::Mutex<Option<AssemblySpec>>>) {
        let captured = Arc::new(std::sync::Mutex::new(None));
        let slot = Arc::clone(&captured);
        let mut assembler = MockVideoAssembler::new();
        assembler.expect_assemble().returning(move |spec| {
            *slot.lock().unwrap() = Some(spec.clone());
            Ok(AssembledVideo {
                path: spec.output.clone(),
                duration_sec: Some(42),
                size_bytes: 1,
            })
        });
        (assembler, captured)
    }

    #[tokio::test]
    async fn produces_title_items_cta_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let generated = GeneratedImage {
            rank: 2,
            path: dir.path().join("gen_02.png"),
        };

        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(vec![0; 16]));

        let (assembler, captured) = assembler_echoing_spec();
        // Two items, one generated image: one fallback item slide.
        let usecase = VideoProductionUseCase::new(
            Arc::new(renderer_for(1)),
            Arc::new(synthesizer),
            Arc::new(assembler),
            ProductionSettings::default(),
        );

        let output = dir.path().join("out.mp4");
        let video = usecase
            .produce(&content(2), &[generated.clone()], dir.path(), &output)
            .await
            .unwrap();

        assert_eq!(video.path, output);
        let spec = captured.lock().unwrap().clone().unwrap();
        assert_eq!(spec.slides.len(), 4);
        assert!(spec.slides[0].ends_with("slide_title.png"));
        assert_eq!(spec.slides[1], generated.path);
        assert!(spec.slides[2].ends_with("slide_item_01.png"));
        assert!(spec.slides[3].ends_with("slide_cta.png"));
        assert!(spec.narration.is_some());
    }

    #[tokio::test]
    async fn empty_script_skips_narration() {
        let dir = tempfile::tempdir().unwrap();
        let mut silent = content(1);
        silent.script = VideoScript {
            hook: String::new(),
            items_script: vec![],
            cta: String::new(),
        };

        // No synthesize expectation: a call would panic the mock.
        let synthesizer = MockSpeechSynthesizer::new();
        let (assembler, captured) = assembler_echoing_spec();
        let usecase = VideoProductionUseCase::new(
            Arc::new(renderer_for(1)),
            Arc::new(synthesizer),
            Arc::new(assembler),
            ProductionSettings::default(),
        );

        usecase
            .produce(&silent, &[], dir.path(), &dir.path().join("out.mp4"))
            .await
            .unwrap();

        let spec = captured.lock().unwrap().clone().unwrap();
        assert!(spec.narration.is_none());
    }

    #[tokio::test]
    async fn narration_failure_degrades_to_silent_video() {
        let dir = tempfile::tempdir().unwrap();
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .returning(|_| Err(anyhow::anyhow!("tts quota exhausted")));

        let (assembler, captured) = assembler_echoing_spec();
        let usecase = VideoProductionUseCase::new(
            Arc::new(renderer_for(1)),
            Arc::new(synthesizer),
            Arc::new(assembler),
            ProductionSettings::default(),
        );

        usecase
            .produce(&content(1), &[], dir.path(), &dir.path().join("out.mp4"))
            .await
            .unwrap();

        let spec = captured.lock().unwrap().clone().unwrap();
        assert!(spec.narration.is_none());
    }
}
