use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use mp4::Mp4Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

use crate::domain::repositories::rendering::{AssembledVideo, AssemblySpec, VideoAssembler};

/// Slideshow assembly through the ffmpeg binary: a concat manifest of
/// stills, an optional narration track, H.264 output sized for vertical
/// playback.
pub struct FfmpegAssembler {
    binary: String,
}

impl FfmpegAssembler {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(&self, spec: &AssemblySpec) -> Result<AssembledVideo> {
        if spec.slides.is_empty() {
            bail!("cannot assemble a video with no slides");
        }

        let manifest_path = spec.output.with_extension("slides.txt");
        let manifest = build_concat_manifest(&spec.slides, spec.seconds_per_slide)?;
        fs::write(&manifest_path, manifest)
            .await
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;

        let args = build_ffmpeg_args(spec, &manifest_path);
        info!(
            binary = %self.binary,
            slides = spec.slides.len(),
            narration = spec.narration.is_some(),
            output = %spec.output.display(),
            "assembling video"
        );

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.binary))?;

        if !output.status.success() {
            bail!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let metadata = fs::metadata(&spec.output)
            .await
            .with_context(|| format!("ffmpeg produced no output at {}", spec.output.display()))?;

        let duration_sec = match read_mp4_duration_seconds(spec.output.clone()).await {
            Ok(duration) => Some(duration),
            Err(err) => {
                warn!(
                    path = %spec.output.display(),
                    "failed to read duration for assembled video: {:?}",
                    err
                );
                None
            }
        };

        Ok(AssembledVideo {
            path: spec.output.clone(),
            duration_sec,
            size_bytes: metadata.len(),
        })
    }
}

/// Concat-demuxer manifest: each still held for the slide duration. The
/// final entry is repeated without a duration, as the demuxer requires.
fn build_concat_manifest(slides: &[PathBuf], seconds_per_slide: f64) -> Result<String> {
    let mut manifest = String::new();
    for slide in slides {
        let path = slide.to_str().context("slide path is not valid UTF-8")?;
        if path.contains('\'') {
            bail!("slide path contains a quote: {}", path);
        }
        manifest.push_str(&format!("file '{}'\nduration {}\n", path, seconds_per_slide));
    }
    if let Some(last) = slides.last().and_then(|p| p.to_str()) {
        manifest.push_str(&format!("file '{}'\n", last));
    }
    Ok(manifest)
}

fn build_ffmpeg_args(spec: &AssemblySpec, manifest_path: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest_path.to_string_lossy().into_owned(),
    ];

    if let Some(narration) = &spec.narration {
        args.push("-i".into());
        args.push(narration.to_string_lossy().into_owned());
    }

    args.push("-vf".into());
    args.push(format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps},format=yuv420p",
        w = spec.width,
        h = spec.height,
        fps = spec.fps
    ));

    args.push("-c:v".into());
    args.push("libx264".into());

    if spec.narration.is_some() {
        args.push("-c:a".into());
        args.push("aac".into());
        // Stop at whichever track ends first so trailing narration does
        // not freeze the last frame indefinitely.
        args.push("-shortest".into());
    }

    args.push(spec.output.to_string_lossy().into_owned());
    args
}

async fn read_mp4_duration_seconds(path: PathBuf) -> Result<i32> {
    tokio::task::spawn_blocking(move || {
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        let reader = BufReader::new(file);
        let mp4 = Mp4Reader::read_header(reader, size)?;
        let duration = mp4.duration().as_secs_f64().round() as i64;

        i32::try_from(duration).context("mp4 duration seconds exceed i32")
    })
    .await
    .context("failed to join duration reader task")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(narration: bool) -> AssemblySpec {
        AssemblySpec {
            slides: vec![PathBuf::from("/work/a.png"), PathBuf::from("/work/b.png")],
            narration: narration.then(|| PathBuf::from("/work/narration.mp3")),
            output: PathBuf::from("/videos/out.mp4"),
            width: 1080,
            height: 1920,
            fps: 30,
            seconds_per_slide: 3.0,
        }
    }

    #[test]
    fn manifest_holds_each_slide_and_repeats_the_last() {
        let manifest = build_concat_manifest(&spec(false).slides, 3.0).unwrap();
        assert_eq!(
            manifest,
            "file '/work/a.png'\nduration 3\nfile '/work/b.png'\nduration 3\nfile '/work/b.png'\n"
        );
    }

    #[test]
    fn manifest_rejects_quoted_paths() {
        let slides = vec![PathBuf::from("/work/o'clock.png")];
        assert!(build_concat_manifest(&slides, 3.0).is_err());
    }

    #[test]
    fn args_without_narration_skip_audio_flags() {
        let args = build_ffmpeg_args(&spec(false), Path::new("/videos/out.slides.txt"));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().unwrap(), "/videos/out.mp4");
    }

    #[test]
    fn args_with_narration_add_audio_input_and_codec() {
        let args = build_ffmpeg_args(&spec(true), Path::new("/videos/out.slides.txt"));
        assert!(args.contains(&"/work/narration.mp3".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn video_filter_pins_vertical_geometry() {
        let args = build_ffmpeg_args(&spec(false), Path::new("/videos/out.slides.txt"));
        let vf = args
            .iter()
            .position(|a| a == "-vf")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert!(vf.contains("scale=1080:1920"));
        assert!(vf.contains("fps=30"));
    }
}
