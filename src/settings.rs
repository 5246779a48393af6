use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::roam::saver::DEFAULT_HEADER;

pub const ENV_PREFIX: &str = "HIGHLIGHTS";

/// Tunables read from `HIGHLIGHTS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub roam_api_url: String,
    pub header_block: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            roam_api_url: "https://4c67k7zc26.execute-api.us-west-2.amazonaws.com/v1/alphaAPI".into(),
            header_block: DEFAULT_HEADER.into(),
            max_retries: 3,
            retry_backoff_ms: 2000,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_source(env: Environment) -> Result<Self> {
        Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid HIGHLIGHTS_* settings")
    }
}
