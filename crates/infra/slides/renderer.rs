use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use tracing::info;

use crate::domain::repositories::rendering::SlideRenderer;

use super::templates;

#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub endpoint: String,
    pub width: u32,
    pub height: u32,
}

/// Renders slide HTML through a remote chromedriver session. A fresh
/// session per slide keeps renders isolated; slide counts are small
/// enough that session setup cost does not matter.
pub struct WebDriverSlideRenderer {
    config: WebDriverConfig,
}

impl WebDriverSlideRenderer {
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }

    async fn screenshot(&self, html: &str) -> Result<Vec<u8>> {
        let driver = self.initialize_driver().await?;
        let result = self.screenshot_with_driver(&driver, html).await;
        // Quit even when the render failed so sessions do not leak.
        if let Err(err) = driver.quit().await {
            info!(error = %err, "webdriver session quit failed");
        }
        result
    }

    async fn initialize_driver(&self) -> Result<WebDriver> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless=new")
            .context("failed to configure chrome capabilities")?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            self.config.width, self.config.height
        ))
        .context("failed to configure chrome window size")?;

        let driver = WebDriver::new(&self.config.endpoint, caps)
            .await
            .context("failed to open webdriver session")?;
        driver
            .set_window_rect(0, 0, self.config.width, self.config.height)
            .await
            .context("failed to size webdriver window")?;
        Ok(driver)
    }

    async fn screenshot_with_driver(&self, driver: &WebDriver, html: &str) -> Result<Vec<u8>> {
        let url = format!("data:text/html;base64,{}", BASE64.encode(html));
        driver
            .goto(url)
            .await
            .context("failed to load slide markup")?;
        // Let the gradient paint settle before capturing.
        tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;
        let png = driver
            .screenshot_as_png()
            .await
            .context("failed to capture slide screenshot")?;
        Ok(png)
    }
}

#[async_trait]
impl SlideRenderer for WebDriverSlideRenderer {
    async fn render_title_slide(&self, topic: &str) -> Result<Vec<u8>> {
        self.screenshot(&templates::title_slide(topic)).await
    }

    async fn render_item_slide(&self, rank: u8, name: &str, tagline: &str) -> Result<Vec<u8>> {
        self.screenshot(&templates::item_slide(rank, name, tagline))
            .await
    }

    async fn render_cta_slide(&self, topic: &str) -> Result<Vec<u8>> {
        self.screenshot(&templates::cta_slide(topic)).await
    }
}
