use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use worker::config;

use toppers::application::usecases::content_research::ContentResearchUseCase;
use toppers::application::usecases::image_generation::ImageGenerationUseCase;
use toppers::application::usecases::pipeline::{PipelineDirs, ToppersPipeline};
use toppers::application::usecases::topic_selection::TopicSelectionUseCase;
use toppers::application::usecases::video_production::{
    ProductionSettings, VideoProductionUseCase,
};
use toppers::domain::repositories::generation::{ImageModel, SpeechSynthesizer, TextGenerator};
use toppers::domain::repositories::publishing::VideoPublisher;
use toppers::domain::repositories::rendering::{SlideRenderer, VideoAssembler};
use toppers::domain::repositories::topic_history::TopicHistoryStore;
use toppers::infra::auth::youtube_oauth::StoredCredential;
use toppers::infra::generation::gemini::GeminiTextGenerator;
use toppers::infra::generation::google_tts::GoogleSpeechSynthesizer;
use toppers::infra::generation::images::GenerativeImageClient;
use toppers::infra::publisher::youtube::YouTubePublisher;
use toppers::infra::slides::renderer::WebDriverSlideRenderer;
use toppers::infra::storages::topic_history::S3TopicHistoryStore;
use toppers::infra::video::ffmpeg::FfmpegAssembler;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    toppers::observability::init_observability("pipeline")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    let stage = config::config_loader::get_stage();
    info!(stage = %stage, "ENV has been loaded");

    // Ctrl-C cancels the pipeline between steps and interrupts any
    // in-flight upload backoff.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("shutdown signal received; cancelling pipeline");
                cancel.cancel();
            }
        });
    }

    let topic_history: Arc<dyn TopicHistoryStore + Send + Sync> = Arc::new(
        S3TopicHistoryStore::new(dotenvy_env.topic_history.clone()).await?,
    );

    let text_generator: Arc<dyn TextGenerator + Send + Sync> =
        Arc::new(GeminiTextGenerator::new(dotenvy_env.gemini.clone()));

    let image_model: Arc<dyn ImageModel + Send + Sync> =
        Arc::new(GenerativeImageClient::new(dotenvy_env.images.clone())?);

    let synthesizer: Arc<dyn SpeechSynthesizer + Send + Sync> =
        Arc::new(GoogleSpeechSynthesizer::new(dotenvy_env.tts.clone()));

    let renderer: Arc<dyn SlideRenderer + Send + Sync> = Arc::new(WebDriverSlideRenderer::new(
        dotenvy_env.webdriver.clone(),
    ));

    let assembler: Arc<dyn VideoAssembler + Send + Sync> =
        Arc::new(FfmpegAssembler::new(dotenvy_env.ffmpeg_binary.clone()));

    let credential_raw = tokio::fs::read_to_string(&dotenvy_env.youtube.credential_file)
        .await
        .with_context(|| {
            format!(
                "failed to read credential file {}",
                dotenvy_env.youtube.credential_file
            )
        })?;
    let credential = StoredCredential::from_json(&credential_raw)?;
    let publisher: Arc<dyn VideoPublisher + Send + Sync> =
        Arc::new(YouTubePublisher::new(credential, cancel.clone()));

    let video = &dotenvy_env.video;
    let pipeline = ToppersPipeline::new(
        TopicSelectionUseCase::new(topic_history, Arc::clone(&text_generator)),
        ContentResearchUseCase::new(Arc::clone(&text_generator)),
        ImageGenerationUseCase::new(image_model, video.width, video.height),
        VideoProductionUseCase::new(
            renderer,
            synthesizer,
            assembler,
            ProductionSettings {
                width: video.width,
                height: video.height,
                fps: video.fps,
                seconds_per_slide: video.seconds_per_slide,
            },
        ),
        publisher,
        PipelineDirs {
            output_dir: dotenvy_env.pipeline.output_dir.clone().into(),
            slides_dir: dotenvy_env.pipeline.slides_dir.clone().into(),
            videos_dir: dotenvy_env.pipeline.videos_dir.clone().into(),
        },
        dotenvy_env.youtube.privacy_status,
    );

    let report = pipeline.run(&cancel).await?;

    info!(
        topic = %report.topic,
        images = report.images_count,
        video = %report.video_path.display(),
        video_id = report.video_id.as_deref().unwrap_or("-"),
        watch_url = report.watch_url.as_deref().unwrap_or("-"),
        "Job completed successfully"
    );

    Ok(())
}
