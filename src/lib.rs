//! Core library for the tethercam engine.
//!
//! This library serializes every call into a single-threaded, event-driven
//! camera SDK through one worker thread, and exposes the camera as an async API
//! that many tasks can share. Captures are correlated with the out-of-band
//! transfer events that complete them.

pub mod camera;
pub mod config;
pub mod error;
pub mod hardware;
pub mod properties;
pub mod runtime;

pub use camera::{CameraEngine, CameraIdentity, CapturedImage, EngineStats, TetheredCamera};
pub use config::TetherConfig;
pub use error::{AppResult, CameraError};
pub use properties::{CameraProperty, PropertyDescriptor, PropertySnapshot};
