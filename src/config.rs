use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub play: PlayConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user config at {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://api.deezer.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Settings of an interactive play session
#[derive(Debug, Deserialize, Clone)]
pub struct PlayConfig {
    #[serde(default = "default_auto_play")]
    pub auto_play: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// failed media retries after which skipping the question is offered
    #[serde(default = "default_skip_after_failures")]
    pub skip_after_failures: u32,
    pub seed: Option<u64>,
    #[serde(default)]
    pub output: AudioOutput,
}

/// Where previews are played
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutput {
    /// default sound device, when built with the `speaker` feature
    #[default]
    Speaker,
    Silent,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            auto_play: default_auto_play(),
            volume: default_volume(),
            skip_after_failures: default_skip_after_failures(),
            seed: None,
            output: AudioOutput::default(),
        }
    }
}

fn default_auto_play() -> bool {
    true
}

fn default_volume() -> f32 {
    0.5
}

fn default_skip_after_failures() -> u32 {
    2
}
