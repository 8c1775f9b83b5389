//! Tethered camera engine.
//!
//! [`CameraEngine`] is the async façade. Every SDK call it makes is funnelled
//! through a single worker thread (see [`crate::runtime`]); captures are
//! correlated with the transfer events that complete them through the capture
//! slot in [`capture`].

pub mod capture;
pub mod engine;
pub mod hardware;
pub mod session;
pub mod state;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::properties::{PropertyDescriptor, PropertySnapshot};

pub use engine::CameraEngine;
pub use state::EngineStats;

/// Static identity of the connected body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraIdentity {
    /// Model name, e.g. "Canon EOS R6"
    pub product_name: String,
    /// Body serial number
    pub serial_number: String,
    /// Firmware version string
    pub firmware_version: String,
    /// Port the body is attached to
    pub port: String,
}

/// A downloaded image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Encoded file contents as written by the camera
    pub bytes: Vec<u8>,
    /// File name on the camera
    pub file_name: String,
    /// When the download finished
    pub captured_at: DateTime<Utc>,
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Upstream operations of a tethered camera.
///
/// Every method suspends until the hardware has answered. Implementations must
/// be shareable across tasks.
#[async_trait]
pub trait TetheredCamera: Send + Sync {
    /// Product name, serial number and firmware of the connected body.
    async fn identity(&self) -> AppResult<CameraIdentity>;

    /// Current value and legal values of a property.
    async fn get_property(&self, descriptor: &PropertyDescriptor) -> AppResult<PropertySnapshot>;

    /// Set a property from its label.
    async fn set_property(&self, descriptor: &PropertyDescriptor, label: &str) -> AppResult<()>;

    /// Run an autofocus cycle without releasing the shutter.
    async fn autofocus(&self) -> AppResult<()>;

    /// Release the shutter and wait for the image.
    async fn take_picture(&self, autofocus: bool) -> AppResult<CapturedImage>;

    /// Latest live-view frame, or `None` if no frame is available right now.
    async fn live_view_frame(&self) -> AppResult<Option<Vec<u8>>>;

    /// Route the viewfinder to the host.
    async fn start_live_view(&self) -> AppResult<()>;

    /// Route the viewfinder back to the camera's screen.
    async fn stop_live_view(&self) -> AppResult<()>;

    /// The most recent successful capture.
    async fn last_image(&self) -> Option<CapturedImage>;

    /// Stop the worker and release the device.
    async fn shutdown(&self);
}
