use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::sample::DEFAULT_SAMPLE_URL;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    #[serde(default)]
    pub samples: SamplesConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Deserialize)]
pub struct SamplesConfig {
    pub url: String,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SAMPLE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load `<path>.toml` (or any format `config` recognises), then apply
    /// `MICRO_TASKS__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MICRO_TASKS").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

impl RecordingConfig {
    /// Recordings directory with `~` and env vars expanded
    pub fn recordings_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.recordings_path)
            .with_context(|| format!("Invalid recordings_path {}", self.recordings_path))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}
