//! Async camera engine.
//!
//! # Example
//!
//! ```no_run
//! use tethercam::camera::CameraEngine;
//! use tethercam::config::TetherConfig;
//! use tethercam::hardware::MockCameraSdk;
//! use tethercam::properties::CameraProperty;
//!
//! # async fn demo() -> tethercam::error::AppResult<()> {
//! let engine = CameraEngine::new(Box::new(MockCameraSdk::new()), &TetherConfig::default())?;
//! engine.set_property(CameraProperty::IsoSpeed.descriptor(), "400").await?;
//! let image = engine.take_picture(true).await?;
//! println!("{} ({} bytes)", image.file_name, image.bytes.len());
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::capture::{CaptureGate, SlotGuard};
use super::hardware::CameraHardware;
use super::state::{EngineShared, EngineStats};
use super::{CameraIdentity, CapturedImage, TetheredCamera};
use crate::config::{CaptureConfig, TetherConfig};
use crate::error::AppResult;
use crate::hardware::CameraSdk;
use crate::properties::{PropertyDescriptor, PropertySnapshot};
use crate::runtime::CommandQueue;

/// Serialized, event-correlated access to one tethered camera.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct CameraEngine {
    queue: CommandQueue<CameraHardware>,
    shared: Arc<EngineShared>,
    gate: CaptureGate,
    capture: CaptureConfig,
}

impl CameraEngine {
    /// Start the worker thread and hand it the SDK.
    ///
    /// No SDK call is made until the first operation.
    pub fn new(sdk: Box<dyn CameraSdk>, config: &TetherConfig) -> AppResult<Self> {
        let shared = Arc::new(EngineShared::new(config.capture.download_target));
        let hardware = CameraHardware::new(sdk, Arc::clone(&shared), config.session.clone());
        let queue = CommandQueue::spawn(
            &config.worker.thread_name,
            hardware,
            config.worker.idle_poll_interval,
        )?;
        info!(worker = %config.worker.thread_name, "Camera engine started");

        Ok(Self {
            queue,
            shared,
            gate: CaptureGate::new(),
            capture: config.capture.clone(),
        })
    }

    async fn ready(&self) -> AppResult<()> {
        self.shared.session.ensure_ready(&self.queue).await
    }

    /// Model, serial number, firmware and port of the connected body.
    pub async fn identity(&self) -> AppResult<CameraIdentity> {
        self.ready().await?;
        self.queue.invoke(|hw: &mut CameraHardware| hw.identity()).await
    }

    /// Current label and supported labels of a property.
    pub async fn get_property(&self, descriptor: &PropertyDescriptor) -> AppResult<PropertySnapshot> {
        self.ready().await?;
        let id = descriptor.id();
        let enumerable = descriptor.is_enumerable();
        let (value, desc) = self
            .queue
            .invoke(move |hw: &mut CameraHardware| hw.read_property(id, enumerable))
            .await?;

        Ok(PropertySnapshot {
            property: descriptor.name().to_string(),
            value: descriptor.label_for(value),
            supported: desc
                .map(|codes| descriptor.translate_all(&codes))
                .unwrap_or_default(),
        })
    }

    /// Current label of a property.
    pub async fn get_property_value(&self, descriptor: &PropertyDescriptor) -> AppResult<String> {
        self.ready().await?;
        let id = descriptor.id();
        let (value, _) = self
            .queue
            .invoke(move |hw: &mut CameraHardware| hw.read_property(id, false))
            .await?;
        Ok(descriptor.label_for(value))
    }

    /// Legal labels in the order the camera reports them.
    pub async fn supported_values(&self, descriptor: &PropertyDescriptor) -> AppResult<Vec<String>> {
        if !descriptor.is_enumerable() {
            return Ok(Vec::new());
        }
        self.ready().await?;
        let id = descriptor.id();
        let codes = self
            .queue
            .invoke(move |hw: &mut CameraHardware| hw.read_property_desc(id))
            .await?;
        Ok(descriptor.translate_all(&codes))
    }

    /// Set a property from its label.
    ///
    /// An unknown label fails before anything is queued.
    #[instrument(skip(self, descriptor), fields(property = descriptor.name()))]
    pub async fn set_property(&self, descriptor: &PropertyDescriptor, label: &str) -> AppResult<()> {
        let code = descriptor.require_code(label)?;
        self.ready().await?;
        let id = descriptor.id();
        self.queue
            .invoke(move |hw: &mut CameraHardware| hw.write_property(id, code))
            .await
    }

    /// Half-press, hold, release. Holds the capture gate throughout.
    pub async fn autofocus(&self) -> AppResult<()> {
        let _permit = self.gate.acquire().await?;
        // Checked after the gate wait: the session may have ended meanwhile.
        self.ready().await?;
        let hold = self.capture.focus_hold;
        self.queue
            .invoke(move |hw: &mut CameraHardware| hw.autofocus(hold))
            .await
    }

    /// Release the shutter and wait for the transferred image.
    ///
    /// Waits for any capture already in flight. Fails with
    /// [`CaptureTimeout`](crate::error::CameraError::CaptureTimeout) when no
    /// image arrives within the configured timeout.
    #[instrument(skip(self))]
    pub async fn take_picture(&self, autofocus: bool) -> AppResult<CapturedImage> {
        let _permit = self.gate.acquire().await?;
        self.ready().await?;

        let (capture_id, done) = self.shared.capture.publish();
        let _slot = SlotGuard::new(&self.shared.capture, capture_id);
        debug!(capture = capture_id, "Capture published");

        let settle = self.capture.shutter_settle;
        self.queue
            .invoke(move |hw: &mut CameraHardware| hw.trigger(capture_id, autofocus, settle))
            .await?;

        done.wait(self.capture.timeout).await
    }

    /// One live-view frame.
    ///
    /// Returns `Ok(None)` at once while a capture holds the gate, and when the
    /// camera has no frame ready (live view not started).
    pub async fn live_view_frame(&self) -> AppResult<Option<Vec<u8>>> {
        let Some(_permit) = self.gate.try_acquire()? else {
            debug!("Capture in progress; skipping live-view frame");
            return Ok(None);
        };
        self.ready().await?;
        self.queue
            .invoke(|hw: &mut CameraHardware| hw.live_view_frame())
            .await
    }

    /// Route the viewfinder to the host.
    pub async fn start_live_view(&self) -> AppResult<()> {
        self.ready().await?;
        self.queue
            .invoke(|hw: &mut CameraHardware| hw.set_live_view_output(true))
            .await
    }

    /// Route the viewfinder back to the camera's screen.
    pub async fn stop_live_view(&self) -> AppResult<()> {
        self.ready().await?;
        self.queue
            .invoke(|hw: &mut CameraHardware| hw.set_live_view_output(false))
            .await
    }

    /// The most recent successful capture, if any.
    pub fn last_image(&self) -> Option<CapturedImage> {
        self.shared.last_image.lock().clone()
    }

    /// Snapshot of the diagnostic counters.
    pub fn stats(&self) -> EngineStats {
        self.shared.stats()
    }

    /// Number of sessions opened so far.
    pub fn session_generation(&self) -> u64 {
        self.shared.session.generation()
    }

    /// True while a capture or autofocus holds the gate.
    pub fn is_capturing(&self) -> bool {
        self.gate.is_busy()
    }

    /// Stop the worker, close the session and terminate the SDK.
    ///
    /// Later calls fail with [`Disposed`](crate::error::CameraError::Disposed).
    pub async fn shutdown(&self) {
        self.gate.close();
        self.queue.shutdown_async().await;
        info!("Camera engine shut down");
    }
}

#[async_trait]
impl TetheredCamera for CameraEngine {
    async fn identity(&self) -> AppResult<CameraIdentity> {
        CameraEngine::identity(self).await
    }

    async fn get_property(&self, descriptor: &PropertyDescriptor) -> AppResult<PropertySnapshot> {
        CameraEngine::get_property(self, descriptor).await
    }

    async fn set_property(&self, descriptor: &PropertyDescriptor, label: &str) -> AppResult<()> {
        CameraEngine::set_property(self, descriptor, label).await
    }

    async fn autofocus(&self) -> AppResult<()> {
        CameraEngine::autofocus(self).await
    }

    async fn take_picture(&self, autofocus: bool) -> AppResult<CapturedImage> {
        CameraEngine::take_picture(self, autofocus).await
    }

    async fn live_view_frame(&self) -> AppResult<Option<Vec<u8>>> {
        CameraEngine::live_view_frame(self).await
    }

    async fn start_live_view(&self) -> AppResult<()> {
        CameraEngine::start_live_view(self).await
    }

    async fn stop_live_view(&self) -> AppResult<()> {
        CameraEngine::stop_live_view(self).await
    }

    async fn last_image(&self) -> Option<CapturedImage> {
        CameraEngine::last_image(self)
    }

    async fn shutdown(&self) {
        CameraEngine::shutdown(self).await
    }
}
