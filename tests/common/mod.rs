//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use tethercam::config::{DownloadTarget, TetherConfig};
use tethercam::hardware::MockCameraSdk;
use tethercam::CameraEngine;

pub const WORKER_THREAD: &str = "tethercam-worker";

/// Defaults with short timings so tests stay fast.
pub fn fast_config() -> TetherConfig {
    let mut config = TetherConfig::default();
    config.worker.idle_poll_interval = Duration::from_millis(1);
    config.capture.timeout = Duration::from_millis(300);
    config.capture.shutter_settle = Duration::from_millis(5);
    config.capture.focus_hold = Duration::from_millis(5);
    config
}

pub fn engine(sdk: &MockCameraSdk) -> CameraEngine {
    engine_with(sdk, &fast_config())
}

pub fn engine_with(sdk: &MockCameraSdk, config: &TetherConfig) -> CameraEngine {
    CameraEngine::new(Box::new(sdk.clone()), config).expect("engine should start")
}

pub fn tempfile_config() -> TetherConfig {
    let mut config = fast_config();
    config.capture.download_target = DownloadTarget::TempFile;
    config
}

/// Poll `condition` every few milliseconds until it holds or `within` elapses.
pub async fn eventually<F: Fn() -> bool>(within: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    condition()
}

/// Give the idle worker a few poll cycles.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

pub async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = std::time::Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}
