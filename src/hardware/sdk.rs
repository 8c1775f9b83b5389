//! Camera SDK boundary.
//!
//! The vendor SDK is single-threaded and event-driven: every call must come from
//! the thread that owns it, and asynchronous notifications are only delivered
//! while that thread calls [`CameraSdk::get_event`]. Registered handlers run
//! synchronously inside `get_event`, on the owning thread.
//!
//! The trait is `Send` but not `Sync`: an implementation is moved once into the
//! worker thread and stays there.

use std::path::Path;
use std::sync::Arc;

use super::codes::{PropertyId, SdkResult};

/// Reference to an enumerated camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraRef(pub u64);

/// Reference to a file (directory item) on the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirItemRef(pub u64);

/// Reference to a host-side byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamRef(pub u64);

/// Reference to a live-view (electronic viewfinder) image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvfImageRef(pub u64);

/// Any reference-counted SDK object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkObject {
    /// An enumerated camera
    Camera(CameraRef),
    /// A file on the camera
    DirItem(DirItemRef),
    /// A host-side stream
    Stream(StreamRef),
    /// A live-view image container
    EvfImage(EvfImageRef),
}

/// Static description of an enumerated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Port the camera is attached to (e.g. "usb:001,004")
    pub port_name: String,
    /// Model description reported by the device
    pub description: String,
}

/// Metadata of a file waiting on the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItemInfo {
    /// Size in bytes
    pub size: u64,
    /// Whether this item is a folder
    pub is_folder: bool,
    /// File name on the card (e.g. "IMG_0042.JPG")
    pub file_name: String,
}

/// Shutter button states for [`CameraCommand::PressShutterButton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterButton {
    /// Released.
    Off,
    /// Half-pressed: meter and autofocus.
    Halfway,
    /// Fully pressed with autofocus.
    Completely,
    /// Half-pressed, no autofocus.
    HalfwayNonAf,
    /// Fully pressed, no autofocus.
    CompletelyNonAf,
}

impl ShutterButton {
    /// Parameter value sent with the press command.
    pub fn raw(self) -> u32 {
        match self {
            ShutterButton::Off => 0x0000_0000,
            ShutterButton::Halfway => 0x0000_0001,
            ShutterButton::Completely => 0x0000_0003,
            ShutterButton::HalfwayNonAf => 0x0001_0001,
            ShutterButton::CompletelyNonAf => 0x0001_0003,
        }
    }
}

/// Commands accepted by [`CameraSdk::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    /// Autofocus and release in one step.
    TakePicture,
    /// Press or release the shutter button.
    PressShutterButton(ShutterButton),
    /// Postpone the camera's auto power off.
    ExtendShutdownTimer,
}

/// Host capacity advertised to the camera when saving to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapacity {
    /// Free clusters reported to the camera
    pub number_of_free_clusters: u32,
    /// Cluster size in bytes
    pub bytes_per_sector: u32,
    /// Reset the camera's remaining-shots estimate
    pub reset: bool,
}

/// Object events: files appearing on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEvent {
    /// A captured file is ready to be transferred to the host.
    DirItemRequestTransfer(DirItemRef),
    /// Any other object notification. The item, if any, must still be released.
    #[allow(missing_docs)]
    Other { code: u32, item: Option<DirItemRef> },
}

/// Camera state events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// The device ended the session (cable pulled, power off).
    Shutdown,
    /// The device will power off in the given number of seconds unless extended.
    WillSoonShutDown(u32),
    /// Anything else; logged and ignored.
    #[allow(missing_docs)]
    Other { code: u32, param: u32 },
}

/// Property events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PropertyEvent {
    /// A property value changed on the device.
    PropertyChanged { property: PropertyId, param: u32 },
    /// The legal-value list of a property changed.
    PropertyDescChanged { property: PropertyId, param: u32 },
}

/// Handler for object events. Lives as long as it stays registered.
pub type ObjectEventHandler = Arc<dyn Fn(&dyn CameraSdk, ObjectEvent) + Send + Sync>;

/// Handler for state events.
pub type StateEventHandler = Arc<dyn Fn(&dyn CameraSdk, CameraRef, StateEvent) + Send + Sync>;

/// Handler for property events.
pub type PropertyEventHandler = Arc<dyn Fn(&dyn CameraSdk, PropertyEvent) + Send + Sync>;

/// Opaque vendor SDK.
///
/// Every method maps to one SDK entry point and returns the SDK status as an
/// [`ErrorCode`](super::codes::ErrorCode) on failure.
pub trait CameraSdk: Send {
    /// Initialize the SDK library.
    fn initialize(&self) -> SdkResult<()>;

    /// Release all SDK resources.
    fn terminate(&self) -> SdkResult<()>;

    /// Enumerate attached cameras. Each returned reference must be released.
    fn camera_list(&self) -> SdkResult<Vec<CameraRef>>;

    /// Describe an enumerated camera.
    fn device_info(&self, camera: CameraRef) -> SdkResult<DeviceInfo>;

    fn open_session(&self, camera: CameraRef) -> SdkResult<()>;

    fn close_session(&self, camera: CameraRef) -> SdkResult<()>;

    /// Read a numeric property.
    fn get_property_u32(&self, camera: CameraRef, property: PropertyId) -> SdkResult<u32>;

    /// Read a string property.
    fn get_property_string(&self, camera: CameraRef, property: PropertyId) -> SdkResult<String>;

    /// Write a numeric property.
    fn set_property_u32(&self, camera: CameraRef, property: PropertyId, value: u32)
        -> SdkResult<()>;

    /// Ordered list of legal values for an enumerable property.
    fn get_property_desc(&self, camera: CameraRef, property: PropertyId) -> SdkResult<Vec<u32>>;

    fn send_command(&self, camera: CameraRef, command: CameraCommand) -> SdkResult<()>;

    fn set_capacity(&self, camera: CameraRef, capacity: HostCapacity) -> SdkResult<()>;

    fn set_object_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<ObjectEventHandler>,
    ) -> SdkResult<()>;

    fn set_state_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<StateEventHandler>,
    ) -> SdkResult<()>;

    fn set_property_event_handler(
        &self,
        camera: CameraRef,
        handler: Option<PropertyEventHandler>,
    ) -> SdkResult<()>;

    /// Dispatch pending events to the registered handlers on the calling thread.
    fn get_event(&self) -> SdkResult<()>;

    fn dir_item_info(&self, item: DirItemRef) -> SdkResult<DirItemInfo>;

    /// Create a growable in-memory stream.
    fn create_memory_stream(&self, capacity: u64) -> SdkResult<StreamRef>;

    /// Create a stream backed by a host file, truncating it.
    fn create_file_stream(&self, path: &Path) -> SdkResult<StreamRef>;

    /// Copy `size` bytes of a directory item into `stream`.
    fn download(&self, item: DirItemRef, size: u64, stream: StreamRef) -> SdkResult<()>;

    /// Tell the device the transfer is finished so it can free its buffer.
    fn download_complete(&self, item: DirItemRef) -> SdkResult<()>;

    /// Abort a pending transfer.
    fn download_cancel(&self, item: DirItemRef) -> SdkResult<()>;

    /// Contents of a memory stream.
    fn stream_bytes(&self, stream: StreamRef) -> SdkResult<Vec<u8>>;

    /// Create a live-view image container writing into `stream`.
    fn create_evf_image(&self, stream: StreamRef) -> SdkResult<EvfImageRef>;

    /// Fill a live-view container with the current viewfinder frame.
    fn download_evf_image(&self, camera: CameraRef, image: EvfImageRef) -> SdkResult<()>;

    /// Drop one reference to an SDK object.
    fn release(&self, object: SdkObject) -> SdkResult<()>;
}
