use crate::driver::HeadlessDriver;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::page::ScreenshotParams;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tenace_engine::config::InteractiveConfig;
use tenace_engine::{DriverError, SnapshotCapture};

/// Saves a full-page PNG of the driven page into a directory.
pub struct ScreenshotCapture {
    page: Page,
    dir: PathBuf,
}

impl ScreenshotCapture {
    pub fn new(driver: &HeadlessDriver, dir: impl Into<PathBuf>) -> Result<Self, DriverError> {
        Ok(Self {
            page: driver.page()?.clone(),
            dir: dir.into(),
        })
    }

    /// Writes into the configured `interactive.snapshot_dir`.
    pub fn from_config(driver: &HeadlessDriver, config: &InteractiveConfig) -> Result<Self, DriverError> {
        Self::new(driver, config.snapshot_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotCapture for ScreenshotCapture {
    async fn capture(&self, label: &str) -> Result<PathBuf, DriverError> {
        let bytes = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let path = self.dir.join(format!("{}-{}.png", file_stem(label), millis));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Lowercase, filesystem-safe form of a task label.
fn file_stem(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let stem = stem
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "snapshot".to_string()
    } else {
        stem
    }
}
