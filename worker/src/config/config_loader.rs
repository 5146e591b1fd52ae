use crate::config::stage::Stage;

use super::config_model::{DotEnvyConfig, PipelineDirsConfig, VideoConfig, YouTubeConfig};
use anyhow::{Context, Result};
use toppers::domain::value_objects::enums::image_providers::ImageProvider;
use toppers::domain::value_objects::enums::privacy_statuses::PrivacyStatus;
use toppers::infra::generation::gemini::GeminiConfig;
use toppers::infra::generation::google_tts::TtsConfig;
use toppers::infra::generation::images::ImageApiConfig;
use toppers::infra::slides::renderer::WebDriverConfig;
use toppers::infra::storages::s3::S3Config;
use toppers::infra::storages::topic_history::TopicHistoryConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let pipeline = PipelineDirsConfig {
        output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()),
        slides_dir: std::env::var("SLIDES_DIR").unwrap_or_else(|_| "slides".to_string()),
        videos_dir: std::env::var("VIDEOS_DIR").unwrap_or_else(|_| "videos".to_string()),
    };

    let video = VideoConfig {
        width: std::env::var("VIDEO_WIDTH")
            .unwrap_or_else(|_| "1080".to_string())
            .parse()
            .context("VIDEO_WIDTH is invalid")?,
        height: std::env::var("VIDEO_HEIGHT")
            .unwrap_or_else(|_| "1920".to_string())
            .parse()
            .context("VIDEO_HEIGHT is invalid")?,
        fps: std::env::var("FPS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("FPS is invalid")?,
        seconds_per_slide: std::env::var("SECONDS_PER_SLIDE")
            .unwrap_or_else(|_| "3.0".to_string())
            .parse()
            .context("SECONDS_PER_SLIDE is invalid")?,
    };

    let gemini = GeminiConfig {
        api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY is invalid"),
        model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string()),
        endpoint: std::env::var("GEMINI_ENDPOINT").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        }),
    };

    let provider_raw = std::env::var("IMAGE_GENERATOR").unwrap_or_else(|_| "dalle".to_string());
    let images = ImageApiConfig {
        provider: ImageProvider::try_from(&provider_raw).unwrap_or_default(),
        openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
        stability_api_key: std::env::var("STABILITY_API_KEY")
            .ok()
            .filter(|v| !v.is_empty()),
    };

    let tts = TtsConfig {
        api_key: std::env::var("GOOGLE_TTS_API_KEY").expect("GOOGLE_TTS_API_KEY is invalid"),
        language_code: std::env::var("TTS_LANGUAGE_CODE").unwrap_or_else(|_| "en-US".to_string()),
        voice_name: std::env::var("TTS_VOICE_NAME")
            .unwrap_or_else(|_| "en-US-Neural2-D".to_string()),
        speaking_rate: std::env::var("TTS_SPEAKING_RATE")
            .unwrap_or_else(|_| "1.15".to_string())
            .parse()
            .context("TTS_SPEAKING_RATE is invalid")?,
    };

    let webdriver = WebDriverConfig {
        endpoint: std::env::var("WEBDRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:4444".to_string()),
        width: video.width,
        height: video.height,
    };

    let youtube = YouTubeConfig {
        credential_file: std::env::var("YOUTUBE_CREDENTIALS_FILE")
            .unwrap_or_else(|_| "youtube_credentials.json".to_string()),
        privacy_status: PrivacyStatus::parse_lenient(
            &std::env::var("YOUTUBE_PRIVACY").unwrap_or_else(|_| "public".to_string()),
        ),
    };

    let topic_history = TopicHistoryConfig {
        s3: S3Config {
            endpoint: std::env::var("TOPIC_HISTORY_S3_ENDPOINT")
                .expect("TOPIC_HISTORY_S3_ENDPOINT is invalid"),
            region: std::env::var("TOPIC_HISTORY_S3_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
            access_key: std::env::var("TOPIC_HISTORY_S3_ACCESS_KEY_ID")
                .expect("TOPIC_HISTORY_S3_ACCESS_KEY_ID is invalid"),
            secret_key: std::env::var("TOPIC_HISTORY_S3_SECRET_ACCESS_KEY")
                .expect("TOPIC_HISTORY_S3_SECRET_ACCESS_KEY is invalid"),
        },
        bucket: std::env::var("TOPIC_HISTORY_S3_BUCKET")
            .unwrap_or_else(|_| "toppers-videos".to_string()),
        object_key: std::env::var("TOPIC_HISTORY_OBJECT_KEY")
            .unwrap_or_else(|_| "topic_history.json".to_string()),
        max_entries: std::env::var("TOPIC_HISTORY_MAX_ENTRIES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("TOPIC_HISTORY_MAX_ENTRIES is invalid")?,
    };

    Ok(DotEnvyConfig {
        pipeline,
        video,
        gemini,
        images,
        tts,
        webdriver,
        ffmpeg_binary: std::env::var("FFMPEG_BINARY").unwrap_or_else(|_| "ffmpeg".to_string()),
        youtube,
        topic_history,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_env_vars() {
        unsafe {
            env::set_var("GEMINI_API_KEY", "gm-key");
            env::set_var("GOOGLE_TTS_API_KEY", "tts-key");
            env::set_var("OPENAI_API_KEY", "oa-key");
            env::set_var("TOPIC_HISTORY_S3_ENDPOINT", "https://s3.example.com");
            env::set_var("TOPIC_HISTORY_S3_ACCESS_KEY_ID", "ak");
            env::set_var("TOPIC_HISTORY_S3_SECRET_ACCESS_KEY", "sk");
            env::set_var("YOUTUBE_PRIVACY", "friends-only");
            env::set_var("IMAGE_GENERATOR", "dalle");
        }
    }

    #[test]
    fn load_applies_defaults_and_lenient_privacy() {
        set_env_vars();
        let config = load().expect("config should load");

        assert_eq!(config.video.width, 1080);
        assert_eq!(config.video.height, 1920);
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.pipeline.output_dir, "output");
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.images.provider, ImageProvider::Dalle);
        assert_eq!(config.topic_history.bucket, "toppers-videos");
        assert_eq!(config.topic_history.max_entries, 30);
        // Invalid privacy value normalizes instead of failing.
        assert_eq!(config.youtube.privacy_status, PrivacyStatus::Public);
    }
}
