use toppers::domain::value_objects::enums::privacy_statuses::PrivacyStatus;
use toppers::infra::generation::gemini::GeminiConfig;
use toppers::infra::generation::google_tts::TtsConfig;
use toppers::infra::generation::images::ImageApiConfig;
use toppers::infra::slides::renderer::WebDriverConfig;
use toppers::infra::storages::topic_history::TopicHistoryConfig;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub pipeline: PipelineDirsConfig,
    pub video: VideoConfig,
    pub gemini: GeminiConfig,
    pub images: ImageApiConfig,
    pub tts: TtsConfig,
    pub webdriver: WebDriverConfig,
    pub ffmpeg_binary: String,
    pub youtube: YouTubeConfig,
    pub topic_history: TopicHistoryConfig,
}

#[derive(Debug, Clone)]
pub struct PipelineDirsConfig {
    pub output_dir: String,
    pub slides_dir: String,
    pub videos_dir: String,
}

#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub seconds_per_slide: f64,
}

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub credential_file: String,
    pub privacy_status: PrivacyStatus,
}
