//! Configuration
//!
//! Loaded with Figment from (in order of precedence):
//! 1. Environment variables prefixed with `TETHERCAM_`
//! 2. TOML configuration file (default: `config/tethercam.toml`)
//! 3. Built-in defaults
//!
//! # Environment Variables
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! TETHERCAM_APPLICATION__LOG_LEVEL=debug
//! TETHERCAM_CAPTURE__TIMEOUT=15s
//! TETHERCAM_CAPTURE__DOWNLOAD_TARGET=tempfile
//! ```

pub mod settings;

pub use settings::{
    ApplicationConfig, CaptureConfig, ConfigError, DownloadTarget, SessionConfig, TetherConfig,
    WorkerConfig, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
