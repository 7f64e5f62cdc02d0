use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::conservation::DEFAULT_TOLERANCE;
use crate::error::VerifyError;
use crate::provider::ProviderOptions;
use crate::starterator::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "starterator-verify.json";
pub const DEFAULT_SAMPLE_SIZE: usize = 50;
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Optional on-disk settings; every field falls back to a default.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub use_network: Option<bool>,
    #[serde(default)]
    pub refresh: Option<bool>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Settings for one verification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyConfig {
    pub base_url: String,
    /// `None` or `Some(0)` checks every known pham.
    pub sample_size: Option<usize>,
    pub chunk_size: usize,
    pub use_network: bool,
    pub refresh: bool,
    pub tolerance: f64,
    pub seed: Option<u64>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            sample_size: Some(DEFAULT_SAMPLE_SIZE),
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_network: true,
            refresh: false,
            tolerance: DEFAULT_TOLERANCE,
            seed: None,
        }
    }
}

impl VerifyConfig {
    /// Checks applied to file values and command-line overrides alike.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.chunk_size == 0 {
            return Err(VerifyError::ConfigParse(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(VerifyError::ConfigParse(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.refresh && !self.use_network {
            return Err(VerifyError::ConfigParse(
                "refresh needs network access; it cannot be combined with offline mode"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            use_network: self.use_network,
            force_refresh: self.refresh,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must be readable; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<VerifyConfig, VerifyError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| VerifyError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| VerifyError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<VerifyConfig, VerifyError> {
        let defaults = VerifyConfig::default();

        let resolved = VerifyConfig {
            base_url: config.base_url.unwrap_or(defaults.base_url),
            sample_size: match config.sample_size {
                Some(0) => None,
                Some(size) => Some(size),
                None => defaults.sample_size,
            },
            chunk_size: config.chunk_size.unwrap_or(defaults.chunk_size),
            use_network: config.use_network.unwrap_or(defaults.use_network),
            refresh: config.refresh.unwrap_or(defaults.refresh),
            tolerance: config.tolerance.unwrap_or(defaults.tolerance),
            seed: config.seed,
        };
        resolved.validate()?;
        Ok(resolved)
    }
}
