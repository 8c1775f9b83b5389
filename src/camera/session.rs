//! Session lifecycle.
//!
//! The first caller that needs the device creates an initialization future on
//! the worker and caches it; concurrent callers clone the same
//! [`Shared`] future instead of starting their own. The lock is held only for
//! that check-and-create step, never across the await.
//!
//! The cache is cleared when
//! - the attempt fails, so the next caller starts a fresh attempt; or
//! - the device signals shutdown, so the next caller re-initializes.
//!
//! A failed attempt only clears the cache if no newer attempt replaced it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use super::hardware::{close_camera, CameraHardware};
use super::state::{Counters, EngineShared};
use crate::error::{AppResult, CameraError};
use crate::hardware::{
    CameraCommand, CameraRef, CameraSdk, PropertyEvent, PropertyEventHandler, StateEvent,
    StateEventHandler,
};
use crate::runtime::CommandQueue;

type InitFuture = Shared<BoxFuture<'static, AppResult<()>>>;

struct InitAttempt {
    id: u64,
    future: InitFuture,
}

/// Owner of the session handle and the cached initialization attempt.
pub(crate) struct SessionManager {
    // Written only on the worker thread.
    camera: Mutex<Option<CameraRef>>,
    generation: AtomicU64,
    init: Mutex<Option<InitAttempt>>,
    attempts: AtomicU64,
}

impl SessionManager {
    pub(crate) fn new() -> Self {
        Self {
            camera: Mutex::new(None),
            generation: AtomicU64::new(0),
            init: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// Make sure a session is open, opening one on the worker if needed.
    pub(crate) async fn ensure_ready(&self, queue: &CommandQueue<CameraHardware>) -> AppResult<()> {
        let (id, future) = {
            let mut slot = self.init.lock();
            match slot.as_ref() {
                Some(attempt) => (attempt.id, attempt.future.clone()),
                None => {
                    let id = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(attempt = id, "Starting session initialization");
                    let future = queue
                        .invoke(|hw: &mut CameraHardware| hw.open_session())
                        .boxed()
                        .shared();
                    *slot = Some(InitAttempt {
                        id,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;
        if let Err(err) = &result {
            let mut slot = self.init.lock();
            if slot.as_ref().map(|attempt| attempt.id) == Some(id) {
                warn!(attempt = id, error = %err, "Session initialization failed");
                *slot = None;
            }
        }
        result
    }

    /// Drop the cached attempt so the next caller re-initializes.
    pub(crate) fn invalidate(&self) {
        if self.init.lock().take().is_some() {
            debug!("Session cache invalidated");
        }
    }

    pub(crate) fn camera(&self) -> Option<CameraRef> {
        *self.camera.lock()
    }

    /// Record a freshly opened session. Returns its generation.
    pub(crate) fn install(&self, camera: CameraRef) -> u64 {
        *self.camera.lock() = Some(camera);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn take_camera(&self) -> Option<CameraRef> {
        self.camera.lock().take()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Handler for session state changes. Runs on the worker.
pub(crate) fn state_handler(shared: Arc<EngineShared>) -> StateEventHandler {
    Arc::new(move |sdk: &dyn CameraSdk, camera: CameraRef, event: StateEvent| match event {
        StateEvent::Shutdown => {
            warn!(
                generation = shared.session.generation(),
                "Camera signalled shutdown; session invalidated"
            );
            if let Some(open) = shared.session.take_camera() {
                close_camera(sdk, open);
            }
            shared.session.invalidate();
            shared.capture.fail_pending(CameraError::SessionShutdown);
            shared.capture.clear_abandoned();
        }
        StateEvent::WillSoonShutDown(seconds) => {
            debug!(seconds, "Camera about to power off; extending timer");
            if let Err(code) = sdk.send_command(camera, CameraCommand::ExtendShutdownTimer) {
                warn!(%code, "Failed to extend shutdown timer");
            }
        }
        StateEvent::Other { code, param } => {
            trace!(code, param, "Unhandled state event");
        }
    })
}

/// Handler for property notifications. Values are never cached, so this only
/// logs and counts.
pub(crate) fn property_handler(shared: Arc<EngineShared>) -> PropertyEventHandler {
    Arc::new(move |_sdk: &dyn CameraSdk, event: PropertyEvent| {
        Counters::bump(&shared.counters.property_changes);
        match event {
            PropertyEvent::PropertyChanged { property, param } => {
                debug!(%property, param, "Property changed");
            }
            PropertyEvent::PropertyDescChanged { property, param } => {
                debug!(%property, param, "Property description changed");
            }
        }
    })
}
