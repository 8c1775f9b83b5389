//! Worker-side camera context.
//!
//! [`CameraHardware`] owns the SDK and is moved into the worker thread; it is
//! only ever reached through `CommandQueue::invoke`. Methods here are plain
//! blocking calls and return SDK failures as [`CameraError::Sdk`].

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::capture::{frame_or_none, object_handler};
use super::session::{property_handler, state_handler};
use super::state::EngineShared;
use super::CameraIdentity;
use crate::config::SessionConfig;
use crate::error::{AppResult, CameraError};
use crate::hardware::codes::{evf_output, save_to};
use crate::hardware::{
    CameraCommand, CameraRef, CameraSdk, HostCapacity, PropertyId, SdkObject, SdkResult,
    ShutterButton, StreamRef,
};
use crate::runtime::WorkerContext;

/// Camera state owned by the worker thread.
pub struct CameraHardware {
    sdk: Box<dyn CameraSdk>,
    shared: Arc<EngineShared>,
    config: SessionConfig,
    sdk_initialized: bool,
}

impl CameraHardware {
    pub(crate) fn new(sdk: Box<dyn CameraSdk>, shared: Arc<EngineShared>, config: SessionConfig) -> Self {
        Self {
            sdk,
            shared,
            config,
            sdk_initialized: false,
        }
    }

    fn camera(&self) -> AppResult<CameraRef> {
        self.shared
            .session
            .camera()
            .ok_or(CameraError::SessionShutdown)
    }

    /// Initialize the SDK, open the configured camera and register handlers.
    ///
    /// Does nothing if a session is already open. Anything acquired before a
    /// failure is released again.
    pub(crate) fn open_session(&mut self) -> AppResult<()> {
        if self.shared.session.camera().is_some() {
            return Ok(());
        }

        if !self.sdk_initialized {
            self.sdk.initialize()?;
            self.sdk_initialized = true;
            debug!("Camera SDK initialized");
        }

        let cameras = self.sdk.camera_list()?;
        let detected = cameras.len();
        let mut chosen = None;
        for (index, camera) in cameras.into_iter().enumerate() {
            if index == self.config.camera_index {
                chosen = Some(camera);
            } else {
                self.release_quietly(SdkObject::Camera(camera));
            }
        }
        let camera = chosen.ok_or_else(|| {
            debug!(detected, index = self.config.camera_index, "No camera at configured index");
            CameraError::NoDevice
        })?;

        if let Err(code) = self.sdk.open_session(camera) {
            self.release_quietly(SdkObject::Camera(camera));
            return Err(code.into());
        }

        if let Err(err) = self.configure_session(camera) {
            warn!(error = %err, "Session setup failed; closing");
            close_camera(self.sdk.as_ref(), camera);
            return Err(err);
        }

        let generation = self.shared.session.install(camera);
        match self.sdk.device_info(camera) {
            Ok(device) => info!(
                generation,
                model = %device.description,
                port = %device.port_name,
                "Camera session ready"
            ),
            Err(_) => info!(generation, "Camera session ready"),
        }
        Ok(())
    }

    fn configure_session(&self, camera: CameraRef) -> AppResult<()> {
        self.sdk
            .set_property_u32(camera, PropertyId::SAVE_TO, save_to::HOST)?;
        self.sdk.set_capacity(
            camera,
            HostCapacity {
                number_of_free_clusters: self.config.free_clusters,
                bytes_per_sector: self.config.bytes_per_sector,
                reset: true,
            },
        )?;

        self.sdk
            .set_object_event_handler(camera, Some(object_handler(Arc::clone(&self.shared))))?;
        self.sdk
            .set_state_event_handler(camera, Some(state_handler(Arc::clone(&self.shared))))?;
        self.sdk.set_property_event_handler(
            camera,
            Some(property_handler(Arc::clone(&self.shared))),
        )?;
        Ok(())
    }

    pub(crate) fn identity(&self) -> AppResult<CameraIdentity> {
        let camera = self.camera()?;
        let device = self.sdk.device_info(camera)?;
        Ok(CameraIdentity {
            product_name: self
                .sdk
                .get_property_string(camera, PropertyId::PRODUCT_NAME)?,
            serial_number: self.sdk.get_property_string(camera, PropertyId::BODY_ID_EX)?,
            firmware_version: self
                .sdk
                .get_property_string(camera, PropertyId::FIRMWARE_VERSION)?,
            port: device.port_name,
        })
    }

    /// Current raw value and, if requested, the raw legal-value list.
    pub(crate) fn read_property(
        &self,
        property: PropertyId,
        with_desc: bool,
    ) -> AppResult<(u32, Option<Vec<u32>>)> {
        let camera = self.camera()?;
        let value = self.sdk.get_property_u32(camera, property)?;
        let desc = if with_desc {
            Some(self.sdk.get_property_desc(camera, property)?)
        } else {
            None
        };
        trace!(%property, value, "Property read");
        Ok((value, desc))
    }

    pub(crate) fn read_property_desc(&self, property: PropertyId) -> AppResult<Vec<u32>> {
        let camera = self.camera()?;
        Ok(self.sdk.get_property_desc(camera, property)?)
    }

    pub(crate) fn write_property(&self, property: PropertyId, value: u32) -> AppResult<()> {
        let camera = self.camera()?;
        self.sdk.set_property_u32(camera, property, value)?;
        debug!(%property, value, "Property written");
        Ok(())
    }

    /// Arm capture `capture_id` and fire the shutter.
    pub(crate) fn trigger(&self, capture_id: u64, autofocus: bool, settle: Duration) -> AppResult<()> {
        let camera = self.camera()?;
        if !self.shared.capture.arm(capture_id) {
            // The caller is gone or the session was torn down in between.
            return Err(CameraError::SessionShutdown);
        }

        let result = if autofocus {
            self.sdk.send_command(camera, CameraCommand::TakePicture)
        } else {
            self.press_and_release(camera, ShutterButton::CompletelyNonAf, settle)
        };

        if let Err(code) = result {
            warn!(capture = capture_id, %code, "Shutter command rejected");
            self.shared.capture.disarm(capture_id);
            return Err(code.into());
        }
        debug!(capture = capture_id, autofocus, "Shutter released");
        Ok(())
    }

    /// Half-press for `hold`, then let go.
    pub(crate) fn autofocus(&self, hold: Duration) -> AppResult<()> {
        let camera = self.camera()?;
        self.press_and_release(camera, ShutterButton::Halfway, hold)?;
        debug!("Autofocus cycle complete");
        Ok(())
    }

    /// Press `button`, wait, release. The release is sent even if the press failed.
    fn press_and_release(
        &self,
        camera: CameraRef,
        button: ShutterButton,
        hold: Duration,
    ) -> SdkResult<()> {
        let pressed = self
            .sdk
            .send_command(camera, CameraCommand::PressShutterButton(button));
        if pressed.is_ok() {
            thread::sleep(hold);
        }
        let released = self
            .sdk
            .send_command(camera, CameraCommand::PressShutterButton(ShutterButton::Off));
        pressed.and(released)
    }

    pub(crate) fn set_live_view_output(&self, enabled: bool) -> AppResult<()> {
        let camera = self.camera()?;
        let device = if enabled {
            evf_output::PC
        } else {
            evf_output::TFT
        };
        self.sdk
            .set_property_u32(camera, PropertyId::EVF_OUTPUT_DEVICE, device)?;
        info!(enabled, "Live view output switched");
        Ok(())
    }

    /// One viewfinder frame, or `None` when the camera has none ready.
    pub(crate) fn live_view_frame(&self) -> AppResult<Option<Vec<u8>>> {
        let camera = self.camera()?;
        let stream = self.sdk.create_memory_stream(0)?;
        let result = self.read_evf(camera, stream);
        self.release_quietly(SdkObject::Stream(stream));
        frame_or_none(result)
    }

    fn read_evf(&self, camera: CameraRef, stream: StreamRef) -> SdkResult<Vec<u8>> {
        let image = self.sdk.create_evf_image(stream)?;
        let result = self
            .sdk
            .download_evf_image(camera, image)
            .and_then(|()| self.sdk.stream_bytes(stream));
        self.release_quietly(SdkObject::EvfImage(image));
        result
    }

    fn release_quietly(&self, object: SdkObject) {
        if let Err(code) = self.sdk.release(object) {
            warn!(?object, %code, "Failed to release SDK object");
        }
    }
}

impl WorkerContext for CameraHardware {
    fn poll_events(&mut self) {
        if !self.sdk_initialized {
            return;
        }
        if let Err(code) = self.sdk.get_event() {
            trace!(%code, "Event poll failed");
        }
    }

    fn teardown(&mut self) {
        self.shared.capture.fail_pending(CameraError::Disposed);
        self.shared.capture.clear_abandoned();
        if let Some(camera) = self.shared.session.take_camera() {
            close_camera(self.sdk.as_ref(), camera);
        }
        self.shared.session.invalidate();
        if self.sdk_initialized {
            if let Err(code) = self.sdk.terminate() {
                warn!(%code, "SDK terminate failed");
            }
            self.sdk_initialized = false;
        }
        info!("Camera released");
    }
}

/// Unregister handlers, close the session and drop the camera reference.
/// Failures are logged; the device may already be gone.
pub(crate) fn close_camera(sdk: &dyn CameraSdk, camera: CameraRef) {
    if let Err(code) = sdk.set_object_event_handler(camera, None) {
        warn!(%code, "Failed to unregister object handler");
    }
    if let Err(code) = sdk.set_state_event_handler(camera, None) {
        warn!(%code, "Failed to unregister state handler");
    }
    if let Err(code) = sdk.set_property_event_handler(camera, None) {
        warn!(%code, "Failed to unregister property handler");
    }
    if let Err(code) = sdk.close_session(camera) {
        debug!(%code, "Close session failed");
    }
    if let Err(code) = sdk.release(SdkObject::Camera(camera)) {
        warn!(%code, "Failed to release camera");
    }
}
