//! Built-in translation tables.

use once_cell::sync::Lazy;

use super::PropertyDescriptor;
use crate::hardware::PropertyId;

/// ISO speed.
pub static ISO_SPEED: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "ISO",
        PropertyId::ISO_SPEED,
        [
            (0x00, "Auto"),
            (0x28, "6"),
            (0x30, "12"),
            (0x38, "25"),
            (0x40, "50"),
            (0x48, "100"),
            (0x4B, "125"),
            (0x4D, "160"),
            (0x50, "200"),
            (0x53, "250"),
            (0x55, "320"),
            (0x58, "400"),
            (0x5B, "500"),
            (0x5D, "640"),
            (0x60, "800"),
            (0x63, "1000"),
            (0x65, "1250"),
            (0x68, "1600"),
            (0x6B, "2000"),
            (0x6D, "2500"),
            (0x70, "3200"),
            (0x73, "4000"),
            (0x75, "5000"),
            (0x78, "6400"),
            (0x7B, "8000"),
            (0x7D, "10000"),
            (0x80, "12800"),
            (0x83, "16000"),
            (0x85, "20000"),
            (0x88, "25600"),
            (0x90, "51200"),
            (0x98, "102400"),
        ],
    )
});

// Third-stop apertures only; half-stop codes pass through numerically.
/// Aperture (Av) in f-numbers.
pub static APERTURE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "Av",
        PropertyId::AV,
        [
            (0x08, "1"),
            (0x0B, "1.1"),
            (0x0D, "1.2"),
            (0x10, "1.4"),
            (0x13, "1.6"),
            (0x15, "1.8"),
            (0x18, "2"),
            (0x1B, "2.2"),
            (0x1D, "2.5"),
            (0x20, "2.8"),
            (0x23, "3.2"),
            (0x25, "3.5"),
            (0x28, "4"),
            (0x2B, "4.5"),
            (0x2D, "5"),
            (0x30, "5.6"),
            (0x33, "6.3"),
            (0x35, "7.1"),
            (0x38, "8"),
            (0x3B, "9"),
            (0x3D, "10"),
            (0x40, "11"),
            (0x43, "13"),
            (0x45, "14"),
            (0x48, "16"),
            (0x4B, "18"),
            (0x4D, "20"),
            (0x50, "22"),
            (0x53, "25"),
            (0x55, "29"),
            (0x58, "32"),
        ],
    )
});

/// Shutter speed (Tv).
pub static SHUTTER_SPEED: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "Tv",
        PropertyId::TV,
        [
            (0x0C, "Bulb"),
            (0x10, "30\""),
            (0x13, "25\""),
            (0x15, "20\""),
            (0x18, "15\""),
            (0x1B, "13\""),
            (0x1D, "10\""),
            (0x20, "8\""),
            (0x23, "6\""),
            (0x25, "5\""),
            (0x28, "4\""),
            (0x2B, "3\"2"),
            (0x2D, "2\"5"),
            (0x30, "2\""),
            (0x33, "1\"6"),
            (0x35, "1\"3"),
            (0x38, "1\""),
            (0x3B, "0\"8"),
            (0x3D, "0\"6"),
            (0x40, "0\"5"),
            (0x43, "0\"4"),
            (0x45, "0\"3"),
            (0x48, "1/4"),
            (0x4B, "1/5"),
            (0x4D, "1/6"),
            (0x50, "1/8"),
            (0x53, "1/10"),
            (0x55, "1/13"),
            (0x58, "1/15"),
            (0x5B, "1/20"),
            (0x5D, "1/25"),
            (0x60, "1/30"),
            (0x63, "1/40"),
            (0x65, "1/50"),
            (0x68, "1/60"),
            (0x6B, "1/80"),
            (0x6D, "1/100"),
            (0x70, "1/125"),
            (0x73, "1/160"),
            (0x75, "1/200"),
            (0x78, "1/250"),
            (0x7B, "1/320"),
            (0x7D, "1/400"),
            (0x80, "1/500"),
            (0x83, "1/640"),
            (0x85, "1/800"),
            (0x88, "1/1000"),
            (0x8B, "1/1250"),
            (0x8D, "1/1600"),
            (0x90, "1/2000"),
            (0x93, "1/2500"),
            (0x95, "1/3200"),
            (0x98, "1/4000"),
            (0x9B, "1/5000"),
            (0x9D, "1/6400"),
            (0xA0, "1/8000"),
        ],
    )
});

/// Exposure compensation in stops.
pub static EXPOSURE_COMPENSATION: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "Exposure compensation",
        PropertyId::EXPOSURE_COMPENSATION,
        [
            (0x18, "+3"),
            (0x15, "+2 2/3"),
            (0x13, "+2 1/3"),
            (0x10, "+2"),
            (0x0D, "+1 2/3"),
            (0x0B, "+1 1/3"),
            (0x08, "+1"),
            (0x05, "+2/3"),
            (0x03, "+1/3"),
            (0x00, "0"),
            (0xFD, "-1/3"),
            (0xFB, "-2/3"),
            (0xF8, "-1"),
            (0xF5, "-1 1/3"),
            (0xF3, "-1 2/3"),
            (0xF0, "-2"),
            (0xED, "-2 1/3"),
            (0xEB, "-2 2/3"),
            (0xE8, "-3"),
        ],
    )
});

/// Shooting mode.
pub static AE_MODE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "AE mode",
        PropertyId::AE_MODE,
        [
            (0, "P"),
            (1, "Tv"),
            (2, "Av"),
            (3, "M"),
            (4, "Bulb"),
            (5, "A-DEP"),
            (6, "DEP"),
            (7, "Custom"),
            (8, "Lock"),
            (9, "Green"),
            (10, "Night Portrait"),
            (11, "Sports"),
            (12, "Portrait"),
            (13, "Landscape"),
            (14, "Close-Up"),
            (15, "Flash Off"),
            (19, "Creative Auto"),
            (22, "Scene Intelligent Auto"),
            (0xFFFF_FFFF, "Unknown"),
        ],
    )
});

/// White balance presets.
pub static WHITE_BALANCE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "White balance",
        PropertyId::WHITE_BALANCE,
        [
            (0, "Auto"),
            (1, "Daylight"),
            (2, "Cloudy"),
            (3, "Tungsten"),
            (4, "Fluorescent"),
            (5, "Flash"),
            (6, "Manual"),
            (8, "Shade"),
            (9, "Color Temperature"),
            (10, "Custom 1"),
            (11, "Custom 2"),
            (12, "Custom 3"),
            (23, "Auto (White Priority)"),
        ],
    )
});

/// Metering mode.
pub static METERING_MODE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "Metering mode",
        PropertyId::METERING_MODE,
        [
            (1, "Spot"),
            (3, "Evaluative"),
            (4, "Partial"),
            (5, "Center-weighted average"),
            (0xFFFF_FFFF, "Unknown"),
        ],
    )
});

/// Drive mode.
pub static DRIVE_MODE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "Drive mode",
        PropertyId::DRIVE_MODE,
        [
            (0x00, "Single"),
            (0x01, "Continuous"),
            (0x02, "Video"),
            (0x04, "High-Speed Continuous"),
            (0x05, "Low-Speed Continuous"),
            (0x07, "10-Sec Self-Timer (Continuous)"),
            (0x10, "10-Sec Self-Timer"),
            (0x11, "2-Sec Self-Timer"),
            (0x12, "14fps Super High Speed"),
            (0x13, "Silent Single"),
            (0x14, "Silent Continuous"),
        ],
    )
});

/// AF operation.
pub static AF_MODE: Lazy<PropertyDescriptor> = Lazy::new(|| {
    PropertyDescriptor::new(
        "AF mode",
        PropertyId::AF_MODE,
        [
            (0, "One-Shot"),
            (1, "AI Servo"),
            (2, "AI Focus"),
            (3, "Manual Focus"),
            (0xFFFF_FFFF, "Unknown"),
        ],
    )
});
