//! Exclusive capture gate and transfer correlation.
//!
//! A shutter command returns as soon as the camera accepts it; the image shows
//! up later as a transfer-request event on the worker. Transfers carry no
//! correlation id, so the engine allows at most one capture in flight
//! ([`CaptureGate`]) and attributes each image transfer to "the current
//! capture" held in the [`CaptureSlot`].
//!
//! A published capture is only *armed* once its trigger command actually runs
//! on the worker. Transfers handled while the slot is empty or unarmed are
//! orphans: they are acknowledged and released but never downloaded. The slot
//! is cleared eagerly when the caller stops waiting (timeout, trigger failure,
//! dropped future). A capture that was armed and then abandoned still owes the
//! camera one transfer; the slot keeps a count of these and the next image
//! transfers are treated as orphans until the count is paid off, so a late
//! image never resolves a newer capture. The count is cleared when the session
//! ends.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};
use tracing::{debug, info, trace, warn};

use super::state::{Counters, EngineShared};
use super::CapturedImage;
use crate::config::DownloadTarget;
use crate::error::{AppResult, CameraError};
use crate::hardware::{
    CameraSdk, DirItemInfo, DirItemRef, ErrorCode, ObjectEvent, ObjectEventHandler, SdkObject,
    SdkResult, StreamRef,
};
use crate::runtime::{completion, Completion, CompletionToken};

/// File extensions treated as images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "cr2", "cr3", "crw", "raw", "heif", "heic", "tif", "tiff",
];

/// True if the file name looks like a still image.
pub fn is_image_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Single permit serializing capture-class operations.
pub(crate) struct CaptureGate {
    permits: Semaphore,
}

impl CaptureGate {
    pub(crate) fn new() -> Self {
        Self {
            permits: Semaphore::new(1),
        }
    }

    /// Wait for the permit.
    pub(crate) async fn acquire(&self) -> AppResult<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| CameraError::Disposed)
    }

    /// Take the permit only if it is free right now.
    pub(crate) fn try_acquire(&self) -> AppResult<Option<SemaphorePermit<'_>>> {
        match self.permits.try_acquire() {
            Ok(permit) => Ok(Some(permit)),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(CameraError::Disposed),
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Fail current and future waiters.
    pub(crate) fn close(&self) {
        self.permits.close();
    }
}

struct PendingCapture {
    id: u64,
    armed: bool,
    token: Arc<CompletionToken<CapturedImage>>,
}

/// The at-most-one capture waiting for its image.
pub(crate) struct CaptureSlot {
    pending: Mutex<Option<PendingCapture>>,
    next_id: AtomicU64,
    // Armed captures whose caller left before their transfer arrived.
    abandoned: AtomicU64,
}

impl CaptureSlot {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            next_id: AtomicU64::new(0),
            abandoned: AtomicU64::new(0),
        }
    }

    /// Publish a fresh, unarmed capture. Replaces any stale entry.
    pub(crate) fn publish(&self) -> (u64, Completion<CapturedImage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (token, done) = completion();
        let stale = self.pending.lock().replace(PendingCapture {
            id,
            armed: false,
            token: Arc::new(token),
        });
        if let Some(stale) = stale {
            warn!(stale = stale.id, capture = id, "Replaced a stale pending capture");
        }
        (id, done)
    }

    /// Mark capture `id` as triggered. Returns false if it is no longer current.
    pub(crate) fn arm(&self, id: u64) -> bool {
        match self.pending.lock().as_mut() {
            Some(pending) if pending.id == id => {
                pending.armed = true;
                true
            }
            _ => false,
        }
    }

    /// Clear the slot if it still holds capture `id`.
    pub(crate) fn disarm(&self, id: u64) {
        let mut pending = self.pending.lock();
        if pending.as_ref().map(|p| p.id) == Some(id) {
            trace!(capture = id, "Capture slot cleared");
            *pending = None;
        }
    }

    /// Clear the slot if it still holds capture `id`. If that capture was
    /// armed its transfer may still arrive, so it is counted as abandoned.
    pub(crate) fn abandon(&self, id: u64) {
        let mut pending = self.pending.lock();
        if pending.as_ref().map(|p| p.id) == Some(id) {
            let armed = pending.take().is_some_and(|p| p.armed);
            if armed {
                let owed = self.abandoned.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(capture = id, owed, "Armed capture abandoned");
            }
        }
    }

    /// Pay off one abandoned capture. True if one was owed.
    fn consume_abandoned(&self) -> bool {
        self.abandoned
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Forget abandoned captures; their transfers will never come.
    pub(crate) fn clear_abandoned(&self) {
        let owed = self.abandoned.swap(0, Ordering::AcqRel);
        if owed > 0 {
            debug!(owed, "Dropped abandoned capture debt");
        }
    }

    pub(crate) fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Remove and return the armed capture, if any.
    fn take_armed(&self) -> Option<(u64, Arc<CompletionToken<CapturedImage>>)> {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|p| p.armed) {
            pending.take().map(|p| (p.id, p.token))
        } else {
            None
        }
    }

    /// Fail whatever capture is pending, armed or not.
    pub(crate) fn fail_pending(&self, error: CameraError) {
        let pending = self.pending.lock().take();
        if let Some(pending) = pending {
            debug!(capture = pending.id, error = %error, "Failing pending capture");
            pending.token.fail(error);
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.pending.lock().as_ref().is_some_and(|p| p.armed)
    }
}

/// Clears the slot when the awaiting caller leaves, however it leaves.
pub(crate) struct SlotGuard<'a> {
    slot: &'a CaptureSlot,
    id: u64,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(slot: &'a CaptureSlot, id: u64) -> Self {
        Self { slot, id }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.abandon(self.id);
    }
}

/// Handler for object events. Runs on the worker inside the SDK event poll.
pub(crate) fn object_handler(shared: Arc<EngineShared>) -> ObjectEventHandler {
    Arc::new(move |sdk: &dyn CameraSdk, event: ObjectEvent| match event {
        ObjectEvent::DirItemRequestTransfer(item) => {
            handle_transfer(sdk, &shared, item);
            release_item(sdk, item);
        }
        ObjectEvent::Other { code, item } => {
            trace!(code, "Object event");
            if let Some(item) = item {
                release_item(sdk, item);
            }
        }
    })
}

fn release_item(sdk: &dyn CameraSdk, item: DirItemRef) {
    if let Err(code) = sdk.release(SdkObject::DirItem(item)) {
        warn!(%code, "Failed to release directory item");
    }
}

fn acknowledge(sdk: &dyn CameraSdk, item: DirItemRef) {
    if let Err(code) = sdk.download_complete(item) {
        warn!(%code, "Failed to acknowledge transfer");
    }
}

fn cancel(sdk: &dyn CameraSdk, item: DirItemRef) {
    if let Err(code) = sdk.download_cancel(item) {
        warn!(%code, "Failed to cancel transfer");
    }
}

fn handle_transfer(sdk: &dyn CameraSdk, shared: &EngineShared, item: DirItemRef) {
    let info = match sdk.dir_item_info(item) {
        Ok(info) => info,
        Err(code) => {
            warn!(%code, "Could not read transferred item");
            cancel(sdk, item);
            if let Some((id, token)) = shared.capture.take_armed() {
                debug!(capture = id, "Capture failed while inspecting transfer");
                token.fail(code.into());
            }
            return;
        }
    };

    if info.is_folder || !is_image_file(&info.file_name) {
        debug!(file = %info.file_name, "Acknowledging non-image transfer");
        Counters::bump(&shared.counters.non_image_transfers);
        acknowledge(sdk, item);
        return;
    }

    if shared.capture.consume_abandoned() {
        warn!(file = %info.file_name, "Late transfer from an abandoned capture; acknowledged without download");
        Counters::bump(&shared.counters.orphan_transfers);
        acknowledge(sdk, item);
        return;
    }

    let Some((id, token)) = shared.capture.take_armed() else {
        warn!(file = %info.file_name, "Transfer with no capture waiting; acknowledged without download");
        Counters::bump(&shared.counters.orphan_transfers);
        acknowledge(sdk, item);
        return;
    };

    let result = download(sdk, item, &info, shared.download_target);
    match &result {
        Ok(image) => {
            info!(
                capture = id,
                file = %image.file_name,
                bytes = image.bytes.len(),
                "Image downloaded"
            );
            Counters::bump(&shared.counters.captures);
            *shared.last_image.lock() = Some(image.clone());
        }
        Err(err) => warn!(capture = id, error = %err, "Image download failed"),
    }
    if !token.resolve(result) {
        debug!(capture = id, "Capture finished after its caller stopped waiting");
    }
}

/// Pull a directory item into host memory and acknowledge it.
fn download(
    sdk: &dyn CameraSdk,
    item: DirItemRef,
    info: &DirItemInfo,
    target: DownloadTarget,
) -> AppResult<CapturedImage> {
    let bytes = match target {
        DownloadTarget::Memory => download_to_memory(sdk, item, info.size)?,
        DownloadTarget::TempFile => download_to_temp_file(sdk, item, info)?,
    };
    if bytes.is_empty() {
        return Err(CameraError::Download(format!(
            "{} arrived empty",
            info.file_name
        )));
    }
    Ok(CapturedImage {
        bytes,
        file_name: info.file_name.clone(),
        captured_at: Utc::now(),
    })
}

fn download_to_memory(sdk: &dyn CameraSdk, item: DirItemRef, size: u64) -> AppResult<Vec<u8>> {
    let stream = match sdk.create_memory_stream(size) {
        Ok(stream) => stream,
        Err(code) => {
            cancel(sdk, item);
            return Err(code.into());
        }
    };
    let result = transfer_into(sdk, item, size, stream).and_then(|()| sdk.stream_bytes(stream));
    release_stream(sdk, stream);
    result.map_err(CameraError::from)
}

fn download_to_temp_file(
    sdk: &dyn CameraSdk,
    item: DirItemRef,
    info: &DirItemInfo,
) -> AppResult<Vec<u8>> {
    let suffix = Path::new(&info.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let file = match tempfile::Builder::new()
        .prefix("tethercam-")
        .suffix(&suffix)
        .tempfile()
    {
        Ok(file) => file,
        Err(err) => {
            cancel(sdk, item);
            return Err(err.into());
        }
    };

    let stream = match sdk.create_file_stream(file.path()) {
        Ok(stream) => stream,
        Err(code) => {
            cancel(sdk, item);
            return Err(code.into());
        }
    };
    let result = transfer_into(sdk, item, info.size, stream);
    // The SDK must let go of the file before it is read.
    release_stream(sdk, stream);
    result?;

    let bytes = std::fs::read(file.path())?;
    trace!(path = %file.path().display(), "Removing temporary download");
    Ok(bytes)
}

/// Download then acknowledge; cancels the transfer on failure.
fn transfer_into(
    sdk: &dyn CameraSdk,
    item: DirItemRef,
    size: u64,
    stream: StreamRef,
) -> SdkResult<()> {
    let result = sdk
        .download(item, size, stream)
        .and_then(|()| sdk.download_complete(item));
    if let Err(code) = result {
        warn!(%code, "Transfer failed; cancelling");
        cancel(sdk, item);
    }
    result
}

fn release_stream(sdk: &dyn CameraSdk, stream: StreamRef) {
    if let Err(code) = sdk.release(SdkObject::Stream(stream)) {
        warn!(%code, "Failed to release stream");
    }
}

/// Map the "nothing to show yet" status of a live-view read to `None`.
pub(crate) fn frame_or_none(result: SdkResult<Vec<u8>>) -> AppResult<Option<Vec<u8>>> {
    match result {
        Ok(bytes) => Ok(Some(bytes)),
        Err(ErrorCode::OBJECT_NOTREADY) => Ok(None),
        Err(code) => Err(code.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_image_extensions() {
        assert!(is_image_file("IMG_0001.JPG"));
        assert!(is_image_file("IMG_0001.cr3"));
        assert!(is_image_file("a.HEIC"));
        assert!(!is_image_file("MVI_0001.MP4"));
        assert!(!is_image_file("DCIM"));
    }

    #[tokio::test]
    async fn test_unarmed_capture_is_not_taken() {
        let slot = CaptureSlot::new();
        let (id, _done) = slot.publish();
        assert!(slot.take_armed().is_none());

        assert!(slot.arm(id));
        assert!(slot.is_armed());
        let (taken, _token) = slot.take_armed().unwrap();
        assert_eq!(taken, id);
        assert!(slot.take_armed().is_none());
    }

    #[tokio::test]
    async fn test_guard_disarms_only_its_own_capture() {
        let slot = CaptureSlot::new();
        let (first, _done1) = slot.publish();
        drop(SlotGuard::new(&slot, first));
        assert!(!slot.arm(first), "slot cleared by guard");

        let (second, _done2) = slot.publish();
        drop(SlotGuard::new(&slot, first));
        assert!(slot.arm(second), "older guard must not clear a newer capture");
    }

    #[tokio::test]
    async fn test_only_armed_captures_are_owed_a_transfer() {
        let slot = CaptureSlot::new();
        let (unarmed, _done1) = slot.publish();
        drop(SlotGuard::new(&slot, unarmed));
        assert_eq!(slot.abandoned(), 0);

        let (armed, _done2) = slot.publish();
        assert!(slot.arm(armed));
        drop(SlotGuard::new(&slot, armed));
        assert_eq!(slot.abandoned(), 1);
        assert!(slot.consume_abandoned());
        assert!(!slot.consume_abandoned());

        let (failed, _done3) = slot.publish();
        assert!(slot.arm(failed));
        slot.disarm(failed);
        drop(SlotGuard::new(&slot, failed));
        assert_eq!(slot.abandoned(), 0, "trigger failures owe nothing");

        for _ in 0..2 {
            let (id, _done) = slot.publish();
            slot.arm(id);
            drop(SlotGuard::new(&slot, id));
        }
        assert_eq!(slot.abandoned(), 2);
        slot.clear_abandoned();
        assert_eq!(slot.abandoned(), 0);
    }

    #[test]
    #[traced_test]
    fn test_failed_cancel_is_logged() {
        let sdk = crate::hardware::MockCameraSdk::new();
        cancel(&sdk, DirItemRef(404));
        assert!(logs_contain("Failed to cancel transfer"));
    }

    #[tokio::test]
    async fn test_fail_pending_resolves_waiter() {
        let slot = CaptureSlot::new();
        let (_id, done) = slot.publish();
        slot.fail_pending(CameraError::SessionShutdown);
        assert_eq!(done.await.unwrap_err(), CameraError::SessionShutdown);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_republish_replaces_and_logs_stale_capture() {
        let slot = CaptureSlot::new();
        let (first, stale) = slot.publish();
        let (second, _done) = slot.publish();
        assert_ne!(first, second);
        assert!(!slot.arm(first));
        assert_eq!(stale.await.unwrap_err(), CameraError::Disposed);
        assert!(logs_contain("Replaced a stale pending capture"));
    }

    #[test]
    fn test_gate_try_acquire_while_held() {
        let gate = CaptureGate::new();
        let held = gate.try_acquire().unwrap();
        assert!(held.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_acquire().unwrap().is_none());
        drop(held);
        assert!(gate.try_acquire().unwrap().is_some());

        gate.close();
        assert_eq!(gate.try_acquire().unwrap_err(), CameraError::Disposed);
    }

    #[test]
    fn test_not_ready_frame_is_none() {
        assert_eq!(frame_or_none(Err(ErrorCode::OBJECT_NOTREADY)), Ok(None));
        assert_eq!(frame_or_none(Ok(vec![1])), Ok(Some(vec![1])));
        assert!(frame_or_none(Err(ErrorCode::DEVICE_BUSY)).is_err());
    }
}
