//! Error types for the camera engine.
//!
//! `CameraError` is the single error type returned by every engine operation.
//! Using the `thiserror` crate, it keeps the failure modes of a tethered camera
//! explicit instead of letting raw SDK status codes leak to callers.
//!
//! ## Error Hierarchy
//!
//! - **`Sdk`**: A non-zero status code returned by the vendor SDK, paired with
//!   the human-readable message from the fixed code table in
//!   [`crate::hardware::codes`].
//! - **`InvalidPropertyValue`**: A property label that has no entry in the
//!   property's translation table. Raised before anything is queued, so the
//!   hardware never sees it.
//! - **`CaptureTimeout`**: The camera accepted the shutter command but no image
//!   transfer arrived within the configured window.
//! - **`NoDevice`** / **`SessionShutdown`**: Lifecycle failures. Either no
//!   camera was enumerated, or the device ended the session underneath us.
//! - **`Disposed`**: The engine's worker thread has been shut down.
//! - **`Download`**: Moving image bytes from the device to the host failed on
//!   the host side (temporary file I/O, empty stream).
//! - **`Internal`**: A queued operation panicked on the worker thread.
//!
//! The type is `Clone` so that a single initialization failure can be handed
//! to every caller waiting on the shared session future.

use std::time::Duration;

use thiserror::Error;

use crate::hardware::codes::ErrorCode;

/// Convenience alias for results using the engine error type.
pub type AppResult<T> = std::result::Result<T, CameraError>;

/// Failure of an engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CameraError {
    #[error("SDK error 0x{code:08X}: {message}")]
    Sdk { code: u32, message: &'static str },

    #[error("Invalid value '{label}' for property {property}")]
    InvalidPropertyValue { property: String, label: String },

    #[error("Capture did not complete within {0:?}")]
    CaptureTimeout(Duration),

    #[error("No camera detected")]
    NoDevice,

    #[error("Camera session was shut down by the device")]
    SessionShutdown,

    #[error("Camera engine has been disposed")]
    Disposed,

    #[error("Image download failed: {0}")]
    Download(String),

    #[error("Internal worker error: {0}")]
    Internal(String),
}

impl CameraError {
    /// Returns the raw SDK status code for hardware errors.
    pub fn sdk_code(&self) -> Option<u32> {
        match self {
            CameraError::Sdk { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True for errors that say nothing about the request itself but about the
    /// state of the session (no camera, lost camera, torn down engine).
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            CameraError::NoDevice | CameraError::SessionShutdown | CameraError::Disposed
        )
    }
}

impl From<ErrorCode> for CameraError {
    fn from(code: ErrorCode) -> Self {
        CameraError::Sdk {
            code: code.raw(),
            message: code.message(),
        }
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Download(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_error_display_uses_code_table() {
        let err = CameraError::from(ErrorCode::DEVICE_BUSY);
        assert_eq!(err.to_string(), "SDK error 0x00000081: Device busy");
        assert_eq!(err.sdk_code(), Some(0x81));
    }

    #[test]
    fn test_validation_error_display() {
        let err = CameraError::InvalidPropertyValue {
            property: "ISO".into(),
            label: "99".into(),
        };
        assert_eq!(err.to_string(), "Invalid value '99' for property ISO");
        assert!(!err.is_lifecycle());
    }

    #[test]
    fn test_lifecycle_classification() {
        assert!(CameraError::NoDevice.is_lifecycle());
        assert!(CameraError::SessionShutdown.is_lifecycle());
        assert!(CameraError::Disposed.is_lifecycle());
        assert!(!CameraError::CaptureTimeout(Duration::from_secs(10)).is_lifecycle());
    }
}
