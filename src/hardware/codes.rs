//! Status codes, property identifiers and command constants of the camera SDK.
//!
//! The SDK reports every call outcome as a 32-bit status where zero means
//! success. [`check`] turns a raw status into a `Result`, and
//! [`ErrorCode::message`] maps non-zero codes to the fixed message table.

use std::fmt;

/// Result of a raw SDK call.
pub type SdkResult<T> = Result<T, ErrorCode>;

/// Non-zero SDK status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(u32);

// Status codes as named by the vendor headers. Messages are in `message()`.
#[allow(missing_docs)]
impl ErrorCode {
    pub const UNIMPLEMENTED: Self = Self(0x0000_0001);
    pub const INTERNAL_ERROR: Self = Self(0x0000_0002);
    pub const MEM_ALLOC_FAILED: Self = Self(0x0000_0003);
    pub const OPERATION_CANCELLED: Self = Self(0x0000_0005);
    pub const INCOMPATIBLE_VERSION: Self = Self(0x0000_0006);
    pub const NOT_SUPPORTED: Self = Self(0x0000_0007);
    pub const FILE_IO_ERROR: Self = Self(0x0000_0020);
    pub const FILE_NOT_FOUND: Self = Self(0x0000_0022);
    pub const FILE_WRITE_ERROR: Self = Self(0x0000_0025);
    pub const STREAM_IO_ERROR: Self = Self(0x0000_0040);
    pub const STREAM_READ_ERROR: Self = Self(0x0000_0047);
    pub const STREAM_WRITE_ERROR: Self = Self(0x0000_0048);
    pub const INVALID_PARAMETER: Self = Self(0x0000_0060);
    pub const INVALID_HANDLE: Self = Self(0x0000_0061);
    pub const INVALID_INDEX: Self = Self(0x0000_0063);
    pub const DEVICE_NOT_FOUND: Self = Self(0x0000_0080);
    pub const DEVICE_BUSY: Self = Self(0x0000_0081);
    pub const DEVICE_INVALID: Self = Self(0x0000_0082);
    pub const DEVICE_EMERGENCY: Self = Self(0x0000_0083);
    pub const DEVICE_MEMORY_FULL: Self = Self(0x0000_0084);
    pub const DEVICE_INTERNAL_ERROR: Self = Self(0x0000_0085);
    pub const DEVICE_INVALID_PARAMETER: Self = Self(0x0000_0086);
    pub const DEVICE_NO_DISK: Self = Self(0x0000_0087);
    pub const DEVICE_DISK_ERROR: Self = Self(0x0000_0088);
    pub const DEVICE_NOT_RELEASED: Self = Self(0x0000_008D);
    pub const COMM_PORT_IS_IN_USE: Self = Self(0x0000_00C0);
    pub const COMM_DISCONNECTED: Self = Self(0x0000_00C1);
    pub const COMM_DEVICE_INCOMPATIBLE: Self = Self(0x0000_00C2);
    pub const COMM_BUFFER_FULL: Self = Self(0x0000_00C3);
    pub const COMM_USB_BUS_ERR: Self = Self(0x0000_00C4);
    pub const SESSION_NOT_OPEN: Self = Self(0x0000_2003);
    pub const INCOMPLETE_TRANSFER: Self = Self(0x0000_2007);
    pub const DEVICEPROP_NOT_SUPPORTED: Self = Self(0x0000_200A);
    pub const CAPTURE_ALREADY_TERMINATED: Self = Self(0x0000_2018);
    pub const PTP_DEVICE_BUSY: Self = Self(0x0000_2019);
    pub const INVALID_DEVICEPROP_VALUE: Self = Self(0x0000_201C);
    pub const SESSION_ALREADY_OPEN: Self = Self(0x0000_201E);
    pub const TRANSACTION_CANCELLED: Self = Self(0x0000_201F);
    pub const TAKE_PICTURE_AF_NG: Self = Self(0x0000_8D01);
    pub const TAKE_PICTURE_RESERVED: Self = Self(0x0000_8D02);
    pub const TAKE_PICTURE_MIRROR_UP_NG: Self = Self(0x0000_8D03);
    pub const TAKE_PICTURE_SENSOR_CLEANING_NG: Self = Self(0x0000_8D04);
    pub const TAKE_PICTURE_SILENCE_NG: Self = Self(0x0000_8D05);
    pub const TAKE_PICTURE_NO_CARD_NG: Self = Self(0x0000_8D06);
    pub const TAKE_PICTURE_CARD_NG: Self = Self(0x0000_8D07);
    pub const TAKE_PICTURE_CARD_PROTECT_NG: Self = Self(0x0000_8D08);
    pub const TAKE_PICTURE_NO_LENS_NG: Self = Self(0x0000_8D0B);
    pub const OBJECT_NOTREADY: Self = Self(0x0000_A102);
    pub const CANNOT_MAKE_OBJECT: Self = Self(0x0000_A104);

    /// Wraps a raw status. Zero is not an error and yields `None`.
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw 32-bit status.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Human-readable message for this code.
    pub fn message(self) -> &'static str {
        match self.0 {
            0x0000_0001 => "Function not implemented",
            0x0000_0002 => "Internal SDK error",
            0x0000_0003 => "Memory allocation failed",
            0x0000_0004 => "Memory release failed",
            0x0000_0005 => "Operation cancelled",
            0x0000_0006 => "Incompatible SDK version",
            0x0000_0007 => "Operation not supported",
            0x0000_0008 => "Unexpected exception",
            0x0000_0009 => "Protection violation",
            0x0000_000A => "Missing SDK subcomponent",
            0x0000_000B => "Selection unavailable",
            0x0000_0020 => "File I/O error",
            0x0000_0021 => "Too many open files",
            0x0000_0022 => "File not found",
            0x0000_0023 => "File open error",
            0x0000_0024 => "File close error",
            0x0000_0025 => "File write error",
            0x0000_0026 => "File read error",
            0x0000_0040 => "Stream I/O error",
            0x0000_0041 => "Stream not open",
            0x0000_0042 => "Stream already open",
            0x0000_0043 => "Stream open error",
            0x0000_0044 => "Stream close error",
            0x0000_0045 => "Stream seek error",
            0x0000_0046 => "Stream tell error",
            0x0000_0047 => "Stream read error",
            0x0000_0048 => "Stream write error",
            0x0000_0049 => "Stream permission error",
            0x0000_004C => "End of stream",
            0x0000_0060 => "Invalid parameter",
            0x0000_0061 => "Invalid handle",
            0x0000_0062 => "Invalid pointer",
            0x0000_0063 => "Invalid index",
            0x0000_0064 => "Invalid length",
            0x0000_0080 => "Device not found",
            0x0000_0081 => "Device busy",
            0x0000_0082 => "Device invalid",
            0x0000_0083 => "Device emergency",
            0x0000_0084 => "Device memory full",
            0x0000_0085 => "Device internal error",
            0x0000_0086 => "Device invalid parameter",
            0x0000_0087 => "No memory card in device",
            0x0000_0088 => "Device disk error",
            0x0000_0089 => "Card gate changed",
            0x0000_008A => "Mode dial changed",
            0x0000_008B => "Device not installed",
            0x0000_008C => "Device is connected in stay-awake mode",
            0x0000_008D => "Device not released",
            0x0000_00C0 => "Port in use",
            0x0000_00C1 => "Device disconnected",
            0x0000_00C2 => "Device incompatible",
            0x0000_00C3 => "Communication buffer full",
            0x0000_00C4 => "USB bus error",
            0x0000_2003 => "Session not open",
            0x0000_2004 => "Invalid transaction id",
            0x0000_2007 => "Incomplete transfer",
            0x0000_2008 => "Invalid storage id",
            0x0000_200A => "Device property not supported",
            0x0000_200B => "Invalid object format code",
            0x0000_2011 => "Self test failed",
            0x0000_2012 => "Partial deletion",
            0x0000_2018 => "Capture already terminated",
            0x0000_2019 => "Device busy (PTP)",
            0x0000_201A => "Invalid parent object",
            0x0000_201B => "Invalid device property format",
            0x0000_201C => "Invalid device property value",
            0x0000_201E => "Session already open",
            0x0000_201F => "Transaction cancelled",
            0x0000_8D01 => "Auto focus failed",
            0x0000_8D02 => "Capture reserved",
            0x0000_8D03 => "Mirror up in progress",
            0x0000_8D04 => "Sensor cleaning in progress",
            0x0000_8D05 => "Silent operation in progress",
            0x0000_8D06 => "No memory card",
            0x0000_8D07 => "Memory card error",
            0x0000_8D08 => "Memory card write protected",
            0x0000_8D09 => "Movie crop in progress",
            0x0000_8D0A => "Flash charging",
            0x0000_8D0B => "No lens attached",
            0x0000_A102 => "Object not ready",
            0x0000_A104 => "Cannot make object",
            _ => "Unknown SDK error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X} ({})", self.0, self.message())
    }
}

/// Maps a raw SDK status to a `Result`; zero is success.
pub fn check(raw: u32) -> SdkResult<()> {
    match ErrorCode::new(raw) {
        None => Ok(()),
        Some(code) => Err(code),
    }
}

/// Numeric identifier of a camera property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub u32);

#[allow(missing_docs)]
impl PropertyId {
    pub const PRODUCT_NAME: Self = Self(0x0000_0002);
    pub const FIRMWARE_VERSION: Self = Self(0x0000_0007);
    pub const SAVE_TO: Self = Self(0x0000_000B);
    pub const BODY_ID_EX: Self = Self(0x0000_0015);
    pub const WHITE_BALANCE: Self = Self(0x0000_0106);
    pub const AE_MODE: Self = Self(0x0000_0400);
    pub const DRIVE_MODE: Self = Self(0x0000_0401);
    pub const ISO_SPEED: Self = Self(0x0000_0402);
    pub const METERING_MODE: Self = Self(0x0000_0403);
    pub const AF_MODE: Self = Self(0x0000_0404);
    pub const AV: Self = Self(0x0000_0405);
    pub const TV: Self = Self(0x0000_0406);
    pub const EXPOSURE_COMPENSATION: Self = Self(0x0000_0408);
    pub const EVF_OUTPUT_DEVICE: Self = Self(0x0000_0500);
    pub const EVF_MODE: Self = Self(0x0000_0501);
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Values of [`PropertyId::SAVE_TO`].
pub mod save_to {
    /// Keep images on the card only.
    pub const CAMERA: u32 = 1;
    /// Transfer images to the host only.
    pub const HOST: u32 = 2;
    /// Card and host.
    pub const BOTH: u32 = 3;
}

/// Bit flags of [`PropertyId::EVF_OUTPUT_DEVICE`].
pub mod evf_output {
    /// The camera's rear screen.
    pub const TFT: u32 = 1;
    /// The host.
    pub const PC: u32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_success() {
        assert_eq!(check(0), Ok(()));
        assert!(ErrorCode::new(0).is_none());
    }

    #[test]
    fn test_nonzero_maps_through_table() {
        let err = check(0x8D01).unwrap_err();
        assert_eq!(err, ErrorCode::TAKE_PICTURE_AF_NG);
        assert_eq!(err.message(), "Auto focus failed");
    }

    #[test]
    fn test_unknown_code_has_fallback_message() {
        let err = check(0xDEAD_BEEF).unwrap_err();
        assert_eq!(err.message(), "Unknown SDK error");
        assert_eq!(err.to_string(), "0xDEADBEEF (Unknown SDK error)");
    }
}
