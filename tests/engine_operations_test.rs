//! Property, identity and live-view operations against the mock SDK.

mod common;

use std::time::Duration;

use common::{engine, eventually, settle, WORKER_THREAD};
use futures::future::join_all;
use tethercam::hardware::codes::evf_output;
use tethercam::hardware::{
    CameraCommand, ErrorCode, MockCameraSdk, PropertyId, ShutterButton, StateEvent,
};
use tethercam::{CameraError, CameraProperty, PropertyDescriptor};

#[tokio::test]
async fn test_identity_reports_body() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    let identity = engine.identity().await.unwrap();
    assert_eq!(identity.product_name, "Canon EOS R6 (mock)");
    assert_eq!(identity.serial_number, "083021001234");
    assert_eq!(identity.firmware_version, "1.8.1");
    assert_eq!(identity.port, "usb:001,004");
}

#[tokio::test]
async fn test_get_property_translates_value_and_supported_list() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    let snapshot = engine
        .get_property(CameraProperty::IsoSpeed.descriptor())
        .await
        .unwrap();
    assert_eq!(snapshot.property, "ISO");
    assert_eq!(snapshot.value, "100");
    assert_eq!(
        snapshot.supported,
        vec!["Auto", "100", "125", "160", "200", "400", "800", "1600", "3200"]
    );

    let tv = engine
        .get_property_value(CameraProperty::ShutterSpeed.descriptor())
        .await
        .unwrap();
    assert_eq!(tv, "1/125");
}

#[tokio::test]
async fn test_supported_values_pass_unmapped_codes_through() {
    let sdk = MockCameraSdk::new();
    sdk.set_property_desc(PropertyId::ISO_SPEED, vec![0x48, 0x4B, 0x4D]);
    sdk.set_property(PropertyId::ISO_SPEED, 0x4D);
    let engine = engine(&sdk);

    let descriptor = PropertyDescriptor::new(
        "ISO",
        PropertyId::ISO_SPEED,
        [(0x48, "100"), (0x4B, "125")],
    );

    let supported = engine.supported_values(&descriptor).await.unwrap();
    assert_eq!(supported, vec!["100", "125", "77"]);

    let value = engine.get_property_value(&descriptor).await.unwrap();
    assert_eq!(value, "77");
}

#[tokio::test]
async fn test_non_enumerable_property_skips_description() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);
    let descriptor =
        PropertyDescriptor::new("AE mode", PropertyId::AE_MODE, [(3, "M")]).not_enumerable();

    let snapshot = engine.get_property(&descriptor).await.unwrap();
    assert_eq!(snapshot.value, "M");
    assert!(snapshot.supported.is_empty());
    assert_eq!(sdk.call_count("get_property_desc"), 0);
}

#[tokio::test]
async fn test_set_property_writes_reverse_translated_code() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    engine
        .set_property(CameraProperty::IsoSpeed.descriptor(), "400")
        .await
        .unwrap();
    assert_eq!(sdk.property(PropertyId::ISO_SPEED), Some(0x58));

    let value = engine
        .get_property_value(CameraProperty::IsoSpeed.descriptor())
        .await
        .unwrap();
    assert_eq!(value, "400");
}

#[tokio::test]
async fn test_unknown_label_never_reaches_hardware() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    let err = engine
        .set_property(CameraProperty::IsoSpeed.descriptor(), "ISO 99")
        .await
        .unwrap_err();
    assert!(matches!(err, CameraError::InvalidPropertyValue { .. }));
    assert!(sdk.calls().is_empty(), "validation must not even open a session");

    // Same with a session already open.
    engine.identity().await.unwrap();
    sdk.clear_calls();
    let err = engine
        .set_property(CameraProperty::ShutterSpeed.descriptor(), "1/7")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CameraError::InvalidPropertyValue {
            property: "Tv".into(),
            label: "1/7".into(),
        }
    );
    assert!(sdk.calls().is_empty());
}

#[tokio::test]
async fn test_camera_rejection_surfaces_as_sdk_error() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    // Known label, but not in the body's legal list.
    let err = engine
        .set_property(CameraProperty::IsoSpeed.descriptor(), "102400")
        .await
        .unwrap_err();
    assert_eq!(err, CameraError::from(ErrorCode::INVALID_DEVICEPROP_VALUE));
    assert_eq!(err.to_string(), "SDK error 0x0000201C: Invalid device property value");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_sdk_call_runs_on_worker_thread() {
    let sdk = MockCameraSdk::new();
    let engine = std::sync::Arc::new(engine(&sdk));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let engine = std::sync::Arc::clone(&engine);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    engine
                        .get_property(CameraProperty::Aperture.descriptor())
                        .await
                        .map(|_| ())
                } else {
                    engine.take_picture(true).await.map(|_| ())
                }
            })
        })
        .collect();
    for task in join_all(tasks).await {
        task.unwrap().unwrap();
    }

    let calls = sdk.calls();
    assert!(!calls.is_empty());
    for call in calls {
        assert_eq!(
            call.thread.as_deref(),
            Some(WORKER_THREAD),
            "{} called off the worker",
            call.method
        );
    }
}

#[tokio::test]
async fn test_concurrent_reads_each_resolve_once() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    let reads = CameraProperty::ALL
        .iter()
        .map(|property| engine.get_property(property.descriptor()));
    let results = join_all(reads).await;

    assert_eq!(results.len(), CameraProperty::ALL.len());
    for (property, result) in CameraProperty::ALL.iter().zip(results) {
        let snapshot = result.unwrap();
        assert_eq!(snapshot.property, property.descriptor().name());
    }
    assert_eq!(sdk.open_session_count(), 1);
}

#[tokio::test]
async fn test_property_change_events_are_counted() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    engine
        .set_property(CameraProperty::WhiteBalance.descriptor(), "Daylight")
        .await
        .unwrap();
    sdk.emit_property_changed(PropertyId::AE_MODE);

    assert!(eventually(Duration::from_secs(1), || engine.stats().property_changes >= 2).await);
}

#[tokio::test]
async fn test_auto_power_off_warning_extends_timer() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);
    engine.identity().await.unwrap();

    sdk.emit_state_event(StateEvent::WillSoonShutDown(10));
    assert!(
        eventually(Duration::from_secs(1), || sdk
            .commands()
            .contains(&CameraCommand::ExtendShutdownTimer))
        .await
    );
    assert!(sdk.is_session_open());
}

#[tokio::test]
async fn test_live_view_start_read_stop() {
    let sdk = MockCameraSdk::new();
    sdk.set_live_view_frame(b"\xFF\xD8frame\xFF\xD9");
    let engine = engine(&sdk);

    // Not routed to the host yet: the camera has nothing to hand over.
    assert_eq!(engine.live_view_frame().await, Ok(None));

    engine.start_live_view().await.unwrap();
    assert_eq!(sdk.property(PropertyId::EVF_OUTPUT_DEVICE), Some(evf_output::PC));
    let frame = engine.live_view_frame().await.unwrap();
    assert_eq!(frame.as_deref(), Some(&b"\xFF\xD8frame\xFF\xD9"[..]));

    engine.stop_live_view().await.unwrap();
    assert_eq!(sdk.property(PropertyId::EVF_OUTPUT_DEVICE), Some(evf_output::TFT));

    settle().await;
    assert_eq!(sdk.outstanding_streams(), 0, "streams and evf images released");
}

#[tokio::test]
async fn test_autofocus_half_presses_and_releases() {
    let sdk = MockCameraSdk::new();
    let engine = engine(&sdk);

    engine.autofocus().await.unwrap();

    assert_eq!(
        sdk.commands(),
        vec![
            CameraCommand::PressShutterButton(ShutterButton::Halfway),
            CameraCommand::PressShutterButton(ShutterButton::Off),
        ]
    );
    assert!(sdk.transferred_items().is_empty());
}
