//! Configuration types, defaults and validation.

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/tethercam.toml";

/// Prefix of environment overrides. Nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "TETHERCAM_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be parsed
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    /// A value is out of range
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TetherConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Worker thread settings
    pub worker: WorkerConfig,
    /// Session initialization settings
    pub session: SessionConfig,
    /// Capture protocol settings
    pub capture: CaptureConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "tethercam".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Worker thread configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Thread name, visible in debuggers and logs
    pub thread_name: String,
    /// Sleep between event polls while the queue is empty
    #[serde(with = "humantime_serde")]
    pub idle_poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "tethercam-worker".to_string(),
            idle_poll_interval: Duration::from_millis(5),
        }
    }
}

/// Session initialization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Index into the enumerated camera list
    pub camera_index: usize,
    /// Sector size advertised to the camera when saving to host
    pub bytes_per_sector: u32,
    /// Free clusters advertised to the camera when saving to host
    pub free_clusters: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            bytes_per_sector: 512,
            free_clusters: 0x7FFF_FFFF,
        }
    }
}

/// Where downloaded image bytes are staged before being handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadTarget {
    /// SDK memory stream
    #[default]
    Memory,
    /// Temporary file, read back and deleted
    TempFile,
}

/// Capture protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// How long to wait for the image transfer after the shutter fires
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Delay between shutter press and release on the non-AF path
    #[serde(with = "humantime_serde")]
    pub shutter_settle: Duration,
    /// How long the shutter is held half-pressed for autofocus
    #[serde(with = "humantime_serde")]
    pub focus_hold: Duration,
    /// Staging area for downloads
    pub download_target: DownloadTarget,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            shutter_settle: Duration::from_millis(100),
            focus_hold: Duration::from_millis(300),
            download_target: DownloadTarget::Memory,
        }
    }
}

impl TetherConfig {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file, then apply environment overrides.
    ///
    /// Precedence, highest first: `TETHERCAM_` variables, the TOML file,
    /// built-in defaults. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.worker.thread_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "worker.thread_name cannot be empty".to_string(),
            ));
        }

        if self.worker.idle_poll_interval.is_zero()
            || self.worker.idle_poll_interval > Duration::from_secs(1)
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid idle_poll_interval {:?}. Must be between 1ns and 1s",
                self.worker.idle_poll_interval
            )));
        }

        if self.session.bytes_per_sector == 0 {
            return Err(ConfigError::ValidationError(
                "session.bytes_per_sector must be > 0".to_string(),
            ));
        }

        if self.capture.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "capture.timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
