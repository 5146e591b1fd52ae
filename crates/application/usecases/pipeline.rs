use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repositories::publishing::VideoPublisher;
use crate::domain::value_objects::enums::privacy_statuses::PrivacyStatus;
use crate::domain::value_objects::upload::{ChunkSize, UploadJob, VideoMetadata};

use super::content_research::ContentResearchUseCase;
use super::image_generation::ImageGenerationUseCase;
use super::topic_selection::TopicSelectionUseCase;
use super::video_production::VideoProductionUseCase;

#[derive(Debug, Clone)]
pub struct PipelineDirs {
    pub output_dir: PathBuf,
    pub slides_dir: PathBuf,
    pub videos_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub topic: String,
    pub images_count: usize,
    pub video_path: PathBuf,
    pub video_id: Option<String>,
    pub watch_url: Option<String>,
}

/// The five-step batch job: topic, content, images, video, publish. One
/// invocation produces one report; nothing survives across runs except
/// the topic history and the artifacts on disk.
pub struct ToppersPipeline {
    topics: TopicSelectionUseCase,
    research: ContentResearchUseCase,
    images: ImageGenerationUseCase,
    production: VideoProductionUseCase,
    publisher: Arc<dyn VideoPublisher + Send + Sync>,
    dirs: PipelineDirs,
    privacy_status: PrivacyStatus,
}

impl ToppersPipeline {
    pub fn new(
        topics: TopicSelectionUseCase,
        research: ContentResearchUseCase,
        images: ImageGenerationUseCase,
        production: VideoProductionUseCase,
        publisher: Arc<dyn VideoPublisher + Send + Sync>,
        dirs: PipelineDirs,
        privacy_status: PrivacyStatus,
    ) -> Self {
        Self {
            topics,
            research,
            images,
            production,
            publisher,
            dirs,
            privacy_status,
        }
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();

        for dir in [
            &self.dirs.output_dir,
            &self.dirs.slides_dir,
            &self.dirs.videos_dir,
        ] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }

        info!(run_id = %run_id, "pipeline starting");

        ensure_not_cancelled(cancel)?;
        info!(run_id = %run_id, step = 1, "selecting topic");
        let selection = self.topics.select_topic().await;

        ensure_not_cancelled(cancel)?;
        info!(run_id = %run_id, step = 2, topic = %selection.topic, "researching content");
        let content = self.research.create_full_content(&selection.topic).await?;
        info!(
            run_id = %run_id,
            items = content.research.items.len(),
            "research completed"
        );

        let content_file = self.dirs.output_dir.join(format!("content_{}.json", timestamp));
        let content_json =
            serde_json::to_vec_pretty(&content).context("failed to serialize content")?;
        fs::write(&content_file, content_json)
            .await
            .with_context(|| format!("failed to write {}", content_file.display()))?;
        info!(path = %content_file.display(), "content saved");

        ensure_not_cancelled(cancel)?;
        info!(run_id = %run_id, step = 3, "generating images");
        let slide_dir = self.dirs.slides_dir.join(format!("slides_{}", timestamp));
        let images = self
            .images
            .generate_all(&content.image_prompts, &slide_dir)
            .await?;

        ensure_not_cancelled(cancel)?;
        info!(run_id = %run_id, step = 4, "producing video");
        let video_path = self.dirs.videos_dir.join(format!("toppers_{}.mp4", timestamp));
        let video = self
            .production
            .produce(&content, &images, &slide_dir, &video_path)
            .await?;

        ensure_not_cancelled(cancel)?;
        info!(run_id = %run_id, step = 5, "publishing video");
        let metadata = VideoMetadata::top_ten(
            &selection.topic,
            &content.summary(),
            self.privacy_status,
        );
        let job = UploadJob {
            source_path: video.path.clone(),
            metadata,
            chunk_size: ChunkSize::ProviderOptimal,
        };

        // Publish failures do not discard the produced video; the
        // artifact stays on disk and the report carries no video id.
        let published = match self.publisher.publish(&job).await {
            Ok(published) => {
                info!(
                    run_id = %run_id,
                    video_id = %published.video_id,
                    url = %published.watch_url,
                    "video published"
                );
                Some(published)
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "video upload failed");
                None
            }
        };

        let report = PipelineReport {
            run_id,
            topic: selection.topic,
            images_count: images.len(),
            video_path: video.path,
            video_id: published.as_ref().map(|p| p.video_id.clone()),
            watch_url: published.map(|p| p.watch_url),
        };

        info!(
            run_id = %report.run_id,
            topic = %report.topic,
            images = report.images_count,
            video = %report.video_path.display(),
            video_id = report.video_id.as_deref().unwrap_or("-"),
            "pipeline completed"
        );

        Ok(report)
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        bail!("pipeline cancelled");
    }
    Ok(())
}
