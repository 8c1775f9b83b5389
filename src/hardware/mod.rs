//! Hardware boundary
//!
//! The vendor camera SDK is consumed through the [`CameraSdk`] trait. A real
//! binding implements it on top of the vendor library; [`MockCameraSdk`] is a
//! scriptable stand-in used by the tests and the command-line demo.

pub mod codes;
pub mod mock_sdk;
pub mod sdk;

pub use codes::{check, ErrorCode, PropertyId, SdkResult};
pub use mock_sdk::{CaptureBehavior, MockCameraSdk, MockItemState, SdkCall};
pub use sdk::{
    CameraCommand, CameraRef, CameraSdk, DeviceInfo, DirItemInfo, DirItemRef, EvfImageRef,
    HostCapacity, ObjectEvent, ObjectEventHandler, PropertyEvent, PropertyEventHandler,
    SdkObject, ShutterButton, StateEvent, StateEventHandler, StreamRef,
};
