//! State shared between the async engine and the worker-side event handlers.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::capture::CaptureSlot;
use super::session::SessionManager;
use super::CapturedImage;
use crate::config::DownloadTarget;

/// Everything the SDK callbacks need. Handlers hold an `Arc` of this.
pub(crate) struct EngineShared {
    pub(crate) session: SessionManager,
    pub(crate) capture: CaptureSlot,
    pub(crate) last_image: Mutex<Option<CapturedImage>>,
    pub(crate) counters: Counters,
    pub(crate) download_target: DownloadTarget,
}

impl EngineShared {
    pub(crate) fn new(download_target: DownloadTarget) -> Self {
        Self {
            session: SessionManager::new(),
            capture: CaptureSlot::new(),
            last_image: Mutex::new(None),
            counters: Counters::default(),
            download_target,
        }
    }

    pub(crate) fn stats(&self) -> EngineStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        EngineStats {
            session_generation: self.session.generation(),
            captures: load(&self.counters.captures),
            orphan_transfers: load(&self.counters.orphan_transfers),
            non_image_transfers: load(&self.counters.non_image_transfers),
            property_changes: load(&self.counters.property_changes),
            abandoned_captures: self.capture.abandoned(),
        }
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) captures: AtomicU64,
    pub(crate) orphan_transfers: AtomicU64,
    pub(crate) non_image_transfers: AtomicU64,
    pub(crate) property_changes: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineStats {
    /// Number of sessions opened so far; 0 before the first
    pub session_generation: u64,
    /// Successful downloads
    pub captures: u64,
    /// Image transfers that arrived with no capture waiting
    pub orphan_transfers: u64,
    /// Transfers acknowledged without download because they were not images
    pub non_image_transfers: u64,
    /// Property-changed notifications received
    pub property_changes: u64,
    /// Abandoned captures whose late transfer is still expected
    pub abandoned_captures: u64,
}
