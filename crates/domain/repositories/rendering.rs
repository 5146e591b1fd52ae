use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::PathBuf;

/// Renders the three slide kinds to PNG screenshots at the configured
/// vertical viewport. The HTML templates live with the implementation.
#[automock]
#[async_trait]
pub trait SlideRenderer {
    async fn render_title_slide(&self, topic: &str) -> Result<Vec<u8>>;
    async fn render_item_slide(&self, rank: u8, name: &str, tagline: &str) -> Result<Vec<u8>>;
    async fn render_cta_slide(&self, topic: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySpec {
    /// Slide stills in presentation order.
    pub slides: Vec<PathBuf>,
    pub narration: Option<PathBuf>,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub seconds_per_slide: f64,
}

#[derive(Debug, Clone)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub duration_sec: Option<i32>,
    pub size_bytes: u64,
}

#[automock]
#[async_trait]
pub trait VideoAssembler {
    async fn assemble(&self, spec: &AssemblySpec) -> Result<AssembledVideo>;
}
