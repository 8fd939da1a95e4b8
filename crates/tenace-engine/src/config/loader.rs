use super::schema::TenaceConfig;
use crate::progress::{CatalogError, StepCatalog};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid step catalog: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./tenace.yaml
    /// 2. ~/.tenace/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<TenaceConfig, ConfigError> {
        let local_config = PathBuf::from("./tenace.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".tenace").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(TenaceConfig::default())
    }

    /// Load and validate a config file. The step catalog is checked here so
    /// that a bad catalog fails at startup rather than mid-run.
    pub async fn load_from(path: &Path) -> Result<TenaceConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<TenaceConfig, ConfigError> {
        let config: TenaceConfig = if content.trim().is_empty() {
            TenaceConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        StepCatalog::new(config.steps.clone())?;
        Ok(config)
    }
}

impl TenaceConfig {
    pub fn catalog(&self) -> Result<StepCatalog, ConfigError> {
        Ok(StepCatalog::new(self.steps.clone())?)
    }
}
