//! Property translation
//!
//! The SDK speaks in opaque numeric codes (`0x48` is ISO 100, `0x70` is
//! 1/125 s). A [`PropertyDescriptor`] pairs a property id with its forward
//! (code → label) and reverse (label → code) maps. Descriptors are immutable
//! once built, so they are shared freely without locking.
//!
//! Translation policy:
//! - a code missing from the table passes through as its decimal string, so a
//!   firmware that exposes a new value still round-trips to the caller;
//! - a label missing from the table is a validation error and never reaches the
//!   hardware.

mod tables;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::hardware::PropertyId;

pub use tables::{
    AE_MODE, AF_MODE, APERTURE, DRIVE_MODE, EXPOSURE_COMPENSATION, ISO_SPEED, METERING_MODE,
    SHUTTER_SPEED, WHITE_BALANCE,
};

/// Immutable numeric ↔ label map for one camera property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: &'static str,
    id: PropertyId,
    enumerable: bool,
    labels: Vec<(u32, String)>,
    forward: HashMap<u32, String>,
    reverse: HashMap<String, u32>,
}

impl PropertyDescriptor {
    /// Build a descriptor from `(code, label)` pairs.
    ///
    /// When a label appears twice the first code wins the reverse mapping.
    pub fn new<S: Into<String>>(
        name: &'static str,
        id: PropertyId,
        entries: impl IntoIterator<Item = (u32, S)>,
    ) -> Self {
        let mut labels = Vec::new();
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        for (code, label) in entries {
            let label = label.into();
            forward.insert(code, label.clone());
            reverse.entry(label.clone()).or_insert(code);
            labels.push((code, label));
        }
        Self {
            name,
            id,
            enumerable: true,
            labels,
            forward,
            reverse,
        }
    }

    /// Mark the property as having no legal-value list on the device.
    pub fn not_enumerable(mut self) -> Self {
        self.enumerable = false;
        self
    }

    /// Display name, e.g. "ISO".
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// SDK property id.
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// Whether the device reports a legal-value list for this property.
    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    /// Label for a code; unmapped codes pass through as decimal strings.
    pub fn label_for(&self, code: u32) -> String {
        self.forward
            .get(&code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Code for a label, if the table knows it.
    pub fn code_for(&self, label: &str) -> Option<u32> {
        self.reverse.get(label).copied()
    }

    /// Like [`code_for`](Self::code_for) but as a validation error.
    pub fn require_code(&self, label: &str) -> Result<u32, CameraError> {
        self.code_for(label)
            .ok_or_else(|| CameraError::InvalidPropertyValue {
                property: self.name.to_string(),
                label: label.to_string(),
            })
    }

    /// Translate an ordered list of codes, keeping the device's order.
    pub fn translate_all(&self, codes: &[u32]) -> Vec<String> {
        codes.iter().map(|&code| self.label_for(code)).collect()
    }

    /// Every label in table order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(_, label)| label.as_str())
    }
}

/// Current value and legal values of one property, already translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Property name
    pub property: String,
    /// Current label
    pub value: String,
    /// Legal labels in the order the device reported them
    pub supported: Vec<String>,
}

/// Properties with a built-in translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraProperty {
    /// ISO speed
    IsoSpeed,
    /// Aperture (Av)
    Aperture,
    /// Shutter speed (Tv)
    ShutterSpeed,
    /// Exposure compensation
    ExposureCompensation,
    /// Shooting mode
    AeMode,
    /// White balance
    WhiteBalance,
    /// Metering mode
    MeteringMode,
    /// Drive mode
    DriveMode,
    /// AF operation
    AfMode,
}

impl CameraProperty {
    /// Every built-in property, in display order.
    pub const ALL: [CameraProperty; 9] = [
        CameraProperty::IsoSpeed,
        CameraProperty::Aperture,
        CameraProperty::ShutterSpeed,
        CameraProperty::ExposureCompensation,
        CameraProperty::AeMode,
        CameraProperty::WhiteBalance,
        CameraProperty::MeteringMode,
        CameraProperty::DriveMode,
        CameraProperty::AfMode,
    ];

    /// The shared, immutable translation table for this property.
    pub fn descriptor(self) -> &'static PropertyDescriptor {
        match self {
            CameraProperty::IsoSpeed => &*ISO_SPEED,
            CameraProperty::Aperture => &*APERTURE,
            CameraProperty::ShutterSpeed => &*SHUTTER_SPEED,
            CameraProperty::ExposureCompensation => &*EXPOSURE_COMPENSATION,
            CameraProperty::AeMode => &*AE_MODE,
            CameraProperty::WhiteBalance => &*WHITE_BALANCE,
            CameraProperty::MeteringMode => &*METERING_MODE,
            CameraProperty::DriveMode => &*DRIVE_MODE,
            CameraProperty::AfMode => &*AF_MODE,
        }
    }

    /// Short name used on the command line and in config.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraProperty::IsoSpeed => "iso",
            CameraProperty::Aperture => "av",
            CameraProperty::ShutterSpeed => "tv",
            CameraProperty::ExposureCompensation => "ev",
            CameraProperty::AeMode => "ae-mode",
            CameraProperty::WhiteBalance => "wb",
            CameraProperty::MeteringMode => "metering",
            CameraProperty::DriveMode => "drive",
            CameraProperty::AfMode => "af-mode",
        }
    }
}

impl fmt::Display for CameraProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        CameraProperty::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = CameraProperty::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown property '{s}', expected one of: {}", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso_subset() -> PropertyDescriptor {
        PropertyDescriptor::new(
            "ISO",
            PropertyId::ISO_SPEED,
            [(0x48, "100"), (0x4B, "125")],
        )
    }

    #[test]
    fn test_unmapped_codes_pass_through_as_decimal() {
        let descriptor = iso_subset();
        assert_eq!(
            descriptor.translate_all(&[0x48, 0x4B, 0x4D]),
            vec!["100", "125", "77"]
        );
    }

    #[test]
    fn test_reverse_lookup() {
        let descriptor = iso_subset();
        assert_eq!(descriptor.code_for("125"), Some(0x4B));
        assert_eq!(descriptor.code_for("77"), None);
    }

    #[test]
    fn test_require_code_is_validation_error() {
        let err = iso_subset().require_code("3200").unwrap_err();
        assert_eq!(
            err,
            CameraError::InvalidPropertyValue {
                property: "ISO".into(),
                label: "3200".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_label_keeps_first_code() {
        let descriptor =
            PropertyDescriptor::new("Av", PropertyId::AV, [(0x0C, "1.2"), (0x0D, "1.2")]);
        assert_eq!(descriptor.code_for("1.2"), Some(0x0C));
        assert_eq!(descriptor.label_for(0x0D), "1.2");
    }

    #[test]
    fn test_builtin_tables_have_unique_labels() {
        for property in CameraProperty::ALL {
            let descriptor = property.descriptor();
            let mut seen = std::collections::HashSet::new();
            for label in descriptor.labels() {
                assert!(
                    seen.insert(label),
                    "{} has duplicate label {label}",
                    descriptor.name()
                );
            }
        }
    }

    #[test]
    fn test_builtin_tables_round_trip() {
        for property in CameraProperty::ALL {
            let descriptor = property.descriptor();
            for label in descriptor.labels() {
                let code = descriptor.code_for(label).unwrap();
                assert_eq!(descriptor.label_for(code), label);
            }
        }
    }

    #[test]
    fn test_property_names_parse() {
        assert_eq!("ISO".parse::<CameraProperty>(), Ok(CameraProperty::IsoSpeed));
        assert_eq!("tv".parse::<CameraProperty>(), Ok(CameraProperty::ShutterSpeed));
        assert!("zoom".parse::<CameraProperty>().is_err());
    }
}
