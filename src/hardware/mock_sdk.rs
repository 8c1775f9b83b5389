//! In-process mock of the camera SDK.
//!
//! Behaves like a single tethered body: cameras are enumerated, sessions open
//! and close, properties hold values, and shutter commands queue transfer
//! events that are dispatched from [`CameraSdk::get_event`]. Clones share the
//! same state, so a test keeps one clone to script events and inspect calls
//! while the engine owns the other.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::codes::{evf_output, save_to, ErrorCode, PropertyId, SdkResult};
use super::sdk::{
    CameraCommand, CameraRef, CameraSdk, DeviceInfo, DirItemInfo, DirItemRef, EvfImageRef,
    HostCapacity, ObjectEvent, ObjectEventHandler, PropertyEvent, PropertyEventHandler,
    SdkObject, ShutterButton, StateEvent, StateEventHandler, StreamRef,
};

/// What the mock does when the shutter is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureBehavior {
    /// Queue a transfer request for an auto-numbered JPEG.
    Deliver,
    /// Queue a transfer request for the given file.
    #[allow(missing_docs)]
    DeliverFile { file_name: String, bytes: Vec<u8> },
    /// Accept the command but never report a file.
    Silent,
    /// Reject the command with the given status.
    Fail(ErrorCode),
}

/// A recorded SDK call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkCall {
    /// SDK entry point name
    pub method: &'static str,
    /// Name of the thread that made the call
    pub thread: Option<String>,
}

/// Host-visible state of a directory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockItemState {
    /// Bytes were pulled into a host stream
    pub downloaded: bool,
    /// The transfer was acknowledged
    pub completed: bool,
    /// The transfer was cancelled
    pub cancelled: bool,
    /// The host released its reference
    pub released: bool,
}

#[derive(Debug)]
struct MockItem {
    file_name: String,
    bytes: Vec<u8>,
    state: MockItemState,
}

#[derive(Debug)]
enum MockStream {
    Memory(Vec<u8>),
    File(PathBuf),
}

#[derive(Debug)]
enum QueuedEvent {
    Object(ObjectEvent),
    State(StateEvent),
    Property(PropertyEvent),
}

#[derive(Clone, Default)]
struct Handlers {
    camera: Option<CameraRef>,
    object: Option<ObjectEventHandler>,
    state: Option<StateEventHandler>,
    property: Option<PropertyEventHandler>,
}

#[derive(Debug)]
struct MockState {
    sdk_initialized: bool,
    attached_cameras: usize,
    camera_refs: HashSet<u64>,
    session_open: bool,
    open_session_count: u32,
    product_name: String,
    body_id: String,
    firmware: String,
    properties: HashMap<PropertyId, u32>,
    descriptions: HashMap<PropertyId, Vec<u32>>,
    capacity: Option<HostCapacity>,
    capture_plan: VecDeque<CaptureBehavior>,
    shot_counter: u32,
    items: HashMap<u64, MockItem>,
    streams: HashMap<u64, MockStream>,
    evf_images: HashMap<u64, u64>,
    live_view_frame: Vec<u8>,
    events: VecDeque<QueuedEvent>,
    commands: Vec<CameraCommand>,
    calls: Vec<SdkCall>,
    failures: HashMap<&'static str, ErrorCode>,
    next_ref: u64,
}

impl MockState {
    fn next_ref(&mut self) -> u64 {
        self.next_ref += 1;
        self.next_ref
    }

    fn require_session(&self) -> SdkResult<()> {
        if self.session_open {
            Ok(())
        } else {
            Err(ErrorCode::SESSION_NOT_OPEN)
        }
    }

    fn queue_transfer(&mut self, file_name: String, bytes: Vec<u8>) -> DirItemRef {
        let id = self.next_ref();
        self.items.insert(
            id,
            MockItem {
                file_name,
                bytes,
                state: MockItemState::default(),
            },
        );
        let item = DirItemRef(id);
        self.events
            .push_back(QueuedEvent::Object(ObjectEvent::DirItemRequestTransfer(item)));
        item
    }

    fn release_shutter(&mut self) -> SdkResult<()> {
        match self.capture_plan.pop_front().unwrap_or(CaptureBehavior::Deliver) {
            CaptureBehavior::Deliver => {
                self.shot_counter += 1;
                let n = self.shot_counter;
                let mut bytes = vec![0xFF, 0xD8];
                bytes.extend_from_slice(format!("mock frame {n}").as_bytes());
                bytes.extend_from_slice(&[0xFF, 0xD9]);
                self.queue_transfer(format!("IMG_{n:04}.JPG"), bytes);
                Ok(())
            }
            CaptureBehavior::DeliverFile { file_name, bytes } => {
                self.queue_transfer(file_name, bytes);
                Ok(())
            }
            CaptureBehavior::Silent => Ok(()),
            CaptureBehavior::Fail(code) => Err(code),
        }
    }
}

/// Scriptable mock camera SDK.
#[derive(Clone)]
pub struct MockCameraSdk {
    state: Arc<Mutex<MockState>>,
    handlers: Arc<Mutex<Handlers>>,
}

impl MockCameraSdk {
    /// A mock with one attached camera and typical property values.
    pub fn new() -> Self {
        let properties = HashMap::from([
            (PropertyId::SAVE_TO, save_to::CAMERA),
            (PropertyId::EVF_OUTPUT_DEVICE, evf_output::TFT),
            (PropertyId::ISO_SPEED, 0x48),
            (PropertyId::AV, 0x30),
            (PropertyId::TV, 0x70),
            (PropertyId::EXPOSURE_COMPENSATION, 0x00),
            (PropertyId::AE_MODE, 3),
            (PropertyId::WHITE_BALANCE, 0),
            (PropertyId::METERING_MODE, 3),
            (PropertyId::DRIVE_MODE, 0),
            (PropertyId::AF_MODE, 0),
        ]);
        let descriptions = HashMap::from([
            (
                PropertyId::ISO_SPEED,
                vec![0x00, 0x48, 0x4B, 0x4D, 0x50, 0x58, 0x60, 0x68, 0x70],
            ),
            (
                PropertyId::AV,
                vec![0x20, 0x23, 0x25, 0x28, 0x2B, 0x2D, 0x30, 0x38, 0x40, 0x48],
            ),
            (
                PropertyId::TV,
                vec![0x38, 0x48, 0x50, 0x58, 0x60, 0x68, 0x70, 0x78, 0x80, 0x88],
            ),
            (
                PropertyId::EXPOSURE_COMPENSATION,
                vec![0xF0, 0xF5, 0xF8, 0xFB, 0x00, 0x05, 0x08, 0x0B, 0x10],
            ),
            (PropertyId::AE_MODE, vec![0, 1, 2, 3, 4]),
            (PropertyId::WHITE_BALANCE, vec![0, 1, 2, 3, 4, 5, 8, 9]),
            (PropertyId::METERING_MODE, vec![1, 3, 4, 5]),
            (PropertyId::DRIVE_MODE, vec![0, 1, 4, 0x10, 0x11]),
            (PropertyId::AF_MODE, vec![0, 1, 2]),
        ]);

        let state = MockState {
            sdk_initialized: false,
            attached_cameras: 1,
            camera_refs: HashSet::new(),
            session_open: false,
            open_session_count: 0,
            product_name: "Canon EOS R6 (mock)".to_string(),
            body_id: "083021001234".to_string(),
            firmware: "1.8.1".to_string(),
            properties,
            descriptions,
            capacity: None,
            capture_plan: VecDeque::new(),
            shot_counter: 0,
            items: HashMap::new(),
            streams: HashMap::new(),
            evf_images: HashMap::new(),
            live_view_frame: vec![0xFF, 0xD8, b'e', b'v', b'f', 0xFF, 0xD9],
            events: VecDeque::new(),
            commands: Vec::new(),
            calls: Vec::new(),
            failures: HashMap::new(),
            next_ref: 0,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            handlers: Arc::new(Mutex::new(Handlers::default())),
        }
    }

    /// A mock with nothing plugged in.
    pub fn without_camera() -> Self {
        let sdk = Self::new();
        sdk.state.lock().attached_cameras = 0;
        sdk
    }

    /// Plug a camera in.
    pub fn attach_camera(&self) {
        self.state.lock().attached_cameras = 1;
    }

    /// Unplug the camera. Open sessions stay open until a shutdown event.
    pub fn detach_camera(&self) {
        self.state.lock().attached_cameras = 0;
    }

    /// Overwrite a numeric property value on the device.
    pub fn set_property(&self, property: PropertyId, value: u32) {
        self.state.lock().properties.insert(property, value);
    }

    /// Current numeric property value on the device.
    pub fn property(&self, property: PropertyId) -> Option<u32> {
        self.state.lock().properties.get(&property).copied()
    }

    /// Overwrite the legal value list of a property.
    pub fn set_property_desc(&self, property: PropertyId, values: Vec<u32>) {
        self.state.lock().descriptions.insert(property, values);
    }

    /// Script the outcome of the next shutter release. Unscripted shots deliver.
    pub fn push_capture_behavior(&self, behavior: CaptureBehavior) {
        self.state.lock().capture_plan.push_back(behavior);
    }

    /// Queue a transfer request as if the camera had just written a file.
    pub fn inject_transfer(&self, file_name: &str, bytes: &[u8]) -> DirItemRef {
        self.state
            .lock()
            .queue_transfer(file_name.to_string(), bytes.to_vec())
    }

    /// Queue a state event for the next poll.
    pub fn emit_state_event(&self, event: StateEvent) {
        self.state.lock().events.push_back(QueuedEvent::State(event));
    }

    /// Queue a session shutdown, as sent when the cable is pulled.
    pub fn emit_shutdown(&self) {
        self.emit_state_event(StateEvent::Shutdown);
    }

    /// Queue a property-changed notification.
    pub fn emit_property_changed(&self, property: PropertyId) {
        self.state
            .lock()
            .events
            .push_back(QueuedEvent::Property(PropertyEvent::PropertyChanged {
                property,
                param: 0,
            }));
    }

    /// Replace the frame served by live view.
    pub fn set_live_view_frame(&self, bytes: &[u8]) {
        self.state.lock().live_view_frame = bytes.to_vec();
    }

    /// Make the next call to `method` fail with `code`.
    pub fn fail_next(&self, method: &'static str, code: ErrorCode) {
        self.state.lock().failures.insert(method, code);
    }

    /// All recorded calls, excluding event polling.
    pub fn calls(&self) -> Vec<SdkCall> {
        self.state.lock().calls.clone()
    }

    /// How often `method` was called.
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Commands sent with `send_command`, in order.
    pub fn commands(&self) -> Vec<CameraCommand> {
        self.state.lock().commands.clone()
    }

    /// Successful session opens so far.
    pub fn open_session_count(&self) -> u32 {
        self.state.lock().open_session_count
    }

    /// Whether a session is currently open.
    pub fn is_session_open(&self) -> bool {
        self.state.lock().session_open
    }

    /// Whether the SDK is initialized and not yet terminated.
    pub fn is_sdk_initialized(&self) -> bool {
        self.state.lock().sdk_initialized
    }

    /// Camera references handed out and not yet released.
    pub fn outstanding_camera_refs(&self) -> usize {
        self.state.lock().camera_refs.len()
    }

    /// Streams and live-view containers not yet released.
    pub fn outstanding_streams(&self) -> usize {
        let state = self.state.lock();
        state.streams.len() + state.evf_images.len()
    }

    /// Host-side state of a directory item.
    pub fn item_state(&self, item: DirItemRef) -> Option<MockItemState> {
        self.state.lock().items.get(&item.0).map(|i| i.state)
    }

    /// Every directory item the camera has offered, oldest first.
    pub fn transferred_items(&self) -> Vec<DirItemRef> {
        let mut ids: Vec<u64> = self.state.lock().items.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(DirItemRef).collect()
    }

    /// Capacity last advertised by the host.
    pub fn host_capacity(&self) -> Option<HostCapacity> {
        self.state.lock().capacity
    }

    /// Whether an object event handler is registered.
    pub fn has_object_handler(&self) -> bool {
        self.handlers.lock().object.is_some()
    }

    /// Record a call and apply any scripted failure.
    fn begin(&self, method: &'static str) -> SdkResult<MutexGuard<'_, MockState>> {
        let mut state = self.state.lock();
        state.calls.push(SdkCall {
            method,
            thread: std::thread::current().name().map(str::to_owned),
        });
        match state.failures.remove(method) {
            Some(code) => Err(code),
            None => Ok(state),
        }
    }

    fn dispatch(&self, event: QueuedEvent) {
        // Handlers call back into the SDK, so no lock may be held here.
        let handlers = self.handlers.lock().clone();
        match event {
            QueuedEvent::Object(event) => match handlers.object {
                Some(handler) => handler(self as &dyn CameraSdk, event),
                None => {
                    if let ObjectEvent::DirItemRequestTransfer(item) = event {
                        let _ = self.release(SdkObject::DirItem(item));
                    }
                }
            },
            QueuedEvent::State(event) => {
                if let (Some(handler), Some(camera)) = (handlers.state, handlers.camera) {
                    handler(self as &dyn CameraSdk, camera, event);
                }
            }
            QueuedEvent::Property(event) => {
                if let Some(handler) = handlers.property {
                    handler(self as &dyn CameraSdk, event);
                }
            }
        }
    }
}

impl Default for MockCameraSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSdk for MockCameraSdk {
    fn initialize(&self) -> SdkResult<()> {
        let mut state = self.begin("initialize")?;
        state.sdk_initialized = true;
        tracing::debug!("Mock camera SDK initialized");
        Ok(())
    }

    fn terminate(&self) -> SdkResult<()> {
        let mut state = self.begin("terminate")?;
        state.sdk_initialized = false;
        state.session_open = false;
        drop(state);
        *self.handlers.lock() = Handlers::default();
        tracing::debug!("Mock camera SDK terminated");
        Ok(())
    }

    fn camera_list(&self) -> SdkResult<Vec<CameraRef>> {
        let mut state = self.begin("camera_list")?;
        if !state.sdk_initialized {
            return Err(ErrorCode::INTERNAL_ERROR);
        }
        let count = state.attached_cameras;
        let mut cameras = Vec::with_capacity(count);
        for _ in 0..count {
            let id = state.next_ref();
            state.camera_refs.insert(id);
            cameras.push(CameraRef(id));
        }
        Ok(cameras)
    }

    fn device_info(&self, camera: CameraRef) -> SdkResult<DeviceInfo> {
        let state = self.begin("device_info")?;
        if !state.camera_refs.contains(&camera.0) {
            return Err(ErrorCode::INVALID_HANDLE);
        }
        Ok(DeviceInfo {
            port_name: "usb:001,004".to_string(),
            description: state.product_name.clone(),
        })
    }

    fn open_session(&self, camera: CameraRef) -> SdkResult<()> {
        let mut state = self.begin("open_session")?;
        if !state.camera_refs.contains(&camera.0) {
            return Err(ErrorCode::INVALID_HANDLE);
        }
        if state.attached_cameras == 0 {
            return Err(ErrorCode::COMM_DISCONNECTED);
        }
        state.session_open = true;
        state.open_session_count += 1;
        Ok(())
    }

    fn close_session(&self, _camera: CameraRef) -> SdkResult<()> {
        let mut state = self.begin("close_session")?;
        state.session_open = false;
        Ok(())
    }

    fn get_property_u32(&self, _camera: CameraRef, property: PropertyId) -> SdkResult<u32> {
        let state = self.begin("get_property_u32")?;
        state.require_session()?;
        state
            .properties
            .get(&property)
            .copied()
            .ok_or(ErrorCode::DEVICEPROP_NOT_SUPPORTED)
    }

    fn get_property_string(&self, _camera: CameraRef, property: PropertyId) -> SdkResult<String> {
        let state = self.begin("get_property_string")?;
        state.require_session()?;
        match property {
            PropertyId::PRODUCT_NAME => Ok(state.product_name.clone()),
            PropertyId::BODY_ID_EX => Ok(state.body_id.clone()),
            PropertyId::FIRMWARE_VERSION => Ok(state.firmware.clone()),
            _ => Err(ErrorCode::DEVICEPROP_NOT_SUPPORTED),
        }
    }

    fn set_property_u32(
        &self,
        _camera: CameraRef,
        property: PropertyId,
        value: u32,
    ) -> SdkResult<()> {
        let mut state = self.begin("set_property_u32")?;
        state.require_session()?;
        if let Some(legal) = state.descriptions.get(&property) {
            if !legal.contains(&value) {
                return Err(ErrorCode::INVALID_DEVICEPROP_VALUE);
            }
        }
        let previous = state.properties.insert(property, value);
        if previous != Some(value) {
            state
                .events
                .push_back(QueuedEvent::Property(PropertyEvent::PropertyChanged {
                    property,
                    param: 0,
                }));
        }
        Ok(())
    }

    fn get_property_desc(&self, _camera: CameraRef, property: PropertyId) -> SdkResult<Vec<u32>> {
        let state = self.begin("get_property_desc")?;
        state.require_session()?;
        Ok(state.descriptions.get(&property).cloned().unwrap_or_default())
    }

    fn send_command(&self, _camera: CameraRef, command: CameraCommand) -> SdkResult<()> {
        let mut state = self.begin("send_command")?;
        state.require_session()?;
        state.commands.push(command);
        match command {
            CameraCommand::TakePicture
            | CameraCommand::PressShutterButton(
                ShutterButton::Completely | ShutterButton::CompletelyNonAf,
            ) => state.release_shutter(),
            CameraCommand::PressShutterButton(_) | CameraCommand::ExtendShutdownTimer => Ok(()),
        }
    }

    fn set_capacity(&self, _camera: CameraRef, capacity: HostCapacity) -> SdkResult<()> {
        let mut state = self.begin("set_capacity")?;
        state.require_session()?;
        state.capacity = Some(capacity);
        Ok(())
    }

    fn set_object_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<ObjectEventHandler>,
    ) -> SdkResult<()> {
        drop(self.begin("set_object_event_handler")?);
        let mut handlers = self.handlers.lock();
        handlers.camera = Some(camera);
        handlers.object = handler;
        Ok(())
    }

    fn set_state_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<StateEventHandler>,
    ) -> SdkResult<()> {
        drop(self.begin("set_state_event_handler")?);
        let mut handlers = self.handlers.lock();
        handlers.camera = Some(camera);
        handlers.state = handler;
        Ok(())
    }

    fn set_property_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<PropertyEventHandler>,
    ) -> SdkResult<()> {
        drop(self.begin("set_property_event_handler")?);
        let mut handlers = self.handlers.lock();
        handlers.camera = Some(camera);
        handlers.property = handler;
        Ok(())
    }

    fn get_event(&self) -> SdkResult<()> {
        let events: Vec<QueuedEvent> = self.state.lock().events.drain(..).collect();
        for event in events {
            self.dispatch(event);
        }
        Ok(())
    }

    fn dir_item_info(&self, item: DirItemRef) -> SdkResult<DirItemInfo> {
        let state = self.begin("dir_item_info")?;
        let entry = state.items.get(&item.0).ok_or(ErrorCode::INVALID_HANDLE)?;
        Ok(DirItemInfo {
            size: entry.bytes.len() as u64,
            is_folder: false,
            file_name: entry.file_name.clone(),
        })
    }

    fn create_memory_stream(&self, capacity: u64) -> SdkResult<StreamRef> {
        let mut state = self.begin("create_memory_stream")?;
        let id = state.next_ref();
        let capacity = usize::try_from(capacity).map_err(|_| ErrorCode::MEM_ALLOC_FAILED)?;
        state
            .streams
            .insert(id, MockStream::Memory(Vec::with_capacity(capacity)));
        Ok(StreamRef(id))
    }

    fn create_file_stream(&self, path: &std::path::Path) -> SdkResult<StreamRef> {
        let mut state = self.begin("create_file_stream")?;
        std::fs::write(path, []).map_err(|_| ErrorCode::FILE_WRITE_ERROR)?;
        let id = state.next_ref();
        state
            .streams
            .insert(id, MockStream::File(path.to_path_buf()));
        Ok(StreamRef(id))
    }

    fn download(&self, item: DirItemRef, size: u64, stream: StreamRef) -> SdkResult<()> {
        let mut state = self.begin("download")?;
        let bytes = {
            let entry = state.items.get(&item.0).ok_or(ErrorCode::INVALID_HANDLE)?;
            if entry.state.released {
                return Err(ErrorCode::INVALID_HANDLE);
            }
            if entry.bytes.len() as u64 != size {
                return Err(ErrorCode::INCOMPLETE_TRANSFER);
            }
            entry.bytes.clone()
        };
        match state.streams.get_mut(&stream.0) {
            Some(MockStream::Memory(buffer)) => buffer.extend_from_slice(&bytes),
            Some(MockStream::File(path)) => {
                std::fs::write(path, &bytes).map_err(|_| ErrorCode::FILE_WRITE_ERROR)?;
            }
            None => return Err(ErrorCode::INVALID_HANDLE),
        }
        if let Some(entry) = state.items.get_mut(&item.0) {
            entry.state.downloaded = true;
        }
        Ok(())
    }

    fn download_complete(&self, item: DirItemRef) -> SdkResult<()> {
        let mut state = self.begin("download_complete")?;
        let entry = state.items.get_mut(&item.0).ok_or(ErrorCode::INVALID_HANDLE)?;
        entry.state.completed = true;
        Ok(())
    }

    fn download_cancel(&self, item: DirItemRef) -> SdkResult<()> {
        let mut state = self.begin("download_cancel")?;
        let entry = state.items.get_mut(&item.0).ok_or(ErrorCode::INVALID_HANDLE)?;
        entry.state.cancelled = true;
        Ok(())
    }

    fn stream_bytes(&self, stream: StreamRef) -> SdkResult<Vec<u8>> {
        let state = self.begin("stream_bytes")?;
        match state.streams.get(&stream.0) {
            Some(MockStream::Memory(buffer)) => Ok(buffer.clone()),
            Some(MockStream::File(_)) => Err(ErrorCode::NOT_SUPPORTED),
            None => Err(ErrorCode::INVALID_HANDLE),
        }
    }

    fn create_evf_image(&self, stream: StreamRef) -> SdkResult<EvfImageRef> {
        let mut state = self.begin("create_evf_image")?;
        if !state.streams.contains_key(&stream.0) {
            return Err(ErrorCode::INVALID_HANDLE);
        }
        let id = state.next_ref();
        state.evf_images.insert(id, stream.0);
        Ok(EvfImageRef(id))
    }

    fn download_evf_image(&self, _camera: CameraRef, image: EvfImageRef) -> SdkResult<()> {
        let mut state = self.begin("download_evf_image")?;
        state.require_session()?;
        let output = state
            .properties
            .get(&PropertyId::EVF_OUTPUT_DEVICE)
            .copied()
            .unwrap_or(0);
        if output & evf_output::PC == 0 {
            return Err(ErrorCode::OBJECT_NOTREADY);
        }
        let stream = *state
            .evf_images
            .get(&image.0)
            .ok_or(ErrorCode::INVALID_HANDLE)?;
        let frame = state.live_view_frame.clone();
        match state.streams.get_mut(&stream) {
            Some(MockStream::Memory(buffer)) => {
                buffer.clear();
                buffer.extend_from_slice(&frame);
                Ok(())
            }
            _ => Err(ErrorCode::INVALID_HANDLE),
        }
    }

    fn release(&self, object: SdkObject) -> SdkResult<()> {
        let mut state = self.begin("release")?;
        let known = match object {
            SdkObject::Camera(camera) => state.camera_refs.remove(&camera.0),
            SdkObject::DirItem(item) => match state.items.get_mut(&item.0) {
                Some(entry) if !entry.state.released => {
                    entry.state.released = true;
                    true
                }
                _ => false,
            },
            SdkObject::Stream(stream) => state.streams.remove(&stream.0).is_some(),
            SdkObject::EvfImage(image) => state.evf_images.remove(&image.0).is_some(),
        };
        if known {
            Ok(())
        } else {
            Err(ErrorCode::INVALID_HANDLE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(sdk: &MockCameraSdk) -> CameraRef {
        sdk.initialize().unwrap();
        let camera = sdk.camera_list().unwrap()[0];
        sdk.open_session(camera).unwrap();
        camera
    }

    #[test]
    fn test_camera_list_respects_attachment() {
        let sdk = MockCameraSdk::without_camera();
        sdk.initialize().unwrap();
        assert!(sdk.camera_list().unwrap().is_empty());

        sdk.attach_camera();
        assert_eq!(sdk.camera_list().unwrap().len(), 1);
        assert_eq!(sdk.outstanding_camera_refs(), 1);
    }

    #[test]
    fn test_property_access_requires_session() {
        let sdk = MockCameraSdk::new();
        sdk.initialize().unwrap();
        let camera = sdk.camera_list().unwrap()[0];
        assert_eq!(
            sdk.get_property_u32(camera, PropertyId::ISO_SPEED),
            Err(ErrorCode::SESSION_NOT_OPEN)
        );
    }

    #[test]
    fn test_set_property_rejects_illegal_value() {
        let sdk = MockCameraSdk::new();
        let camera = open(&sdk);
        assert_eq!(
            sdk.set_property_u32(camera, PropertyId::ISO_SPEED, 0x01),
            Err(ErrorCode::INVALID_DEVICEPROP_VALUE)
        );
        sdk.set_property_u32(camera, PropertyId::ISO_SPEED, 0x58)
            .unwrap();
        assert_eq!(sdk.property(PropertyId::ISO_SPEED), Some(0x58));
    }

    #[test]
    fn test_take_picture_dispatches_transfer_to_handler() {
        let sdk = MockCameraSdk::new();
        let camera = open(&sdk);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: ObjectEventHandler = Arc::new(move |_sdk: &dyn CameraSdk, event: ObjectEvent| {
            sink.lock().push(event)
        });
        sdk.set_object_event_handler(camera, Some(handler)).unwrap();

        sdk.send_command(camera, CameraCommand::TakePicture).unwrap();
        assert!(seen.lock().is_empty(), "events only fire while polling");

        sdk.get_event().unwrap();
        let events = seen.lock().clone();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ObjectEvent::DirItemRequestTransfer(_)));
    }

    #[test]
    fn test_scripted_failure_applies_once() {
        let sdk = MockCameraSdk::new();
        let camera = open(&sdk);
        sdk.fail_next("send_command", ErrorCode::DEVICE_BUSY);
        assert_eq!(
            sdk.send_command(camera, CameraCommand::TakePicture),
            Err(ErrorCode::DEVICE_BUSY)
        );
        assert!(sdk.send_command(camera, CameraCommand::TakePicture).is_ok());
    }

    #[test]
    fn test_live_view_requires_pc_output() {
        let sdk = MockCameraSdk::new();
        let camera = open(&sdk);
        let stream = sdk.create_memory_stream(0).unwrap();
        let image = sdk.create_evf_image(stream).unwrap();
        assert_eq!(
            sdk.download_evf_image(camera, image),
            Err(ErrorCode::OBJECT_NOTREADY)
        );

        sdk.set_property(PropertyId::EVF_OUTPUT_DEVICE, evf_output::PC);
        sdk.download_evf_image(camera, image).unwrap();
        assert!(!sdk.stream_bytes(stream).unwrap().is_empty());
    }
}
