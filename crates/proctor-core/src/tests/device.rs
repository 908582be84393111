use crate::{
    AcquisitionFailure, AcquisitionTimeouts, DeviceManager, FrameDimensions, HardwareHandle,
    MediaConstraints, MediaDevices, MediaStream, PreviewSink, ProctorError, TestPatternConfig,
    TestPatternDevices, tests::support::small_pattern,
};

use std::{sync::Arc, time::Duration};

fn timeouts() -> AcquisitionTimeouts {
    AcquisitionTimeouts {
        grant: Duration::from_secs(2),
        preview: Duration::from_secs(1),
    }
}

fn manager(devices: &Arc<TestPatternDevices>) -> DeviceManager {
    DeviceManager::new(
        Arc::clone(devices) as Arc<dyn MediaDevices>,
        Arc::new(PreviewSink::new()),
    )
}

/// WHAT: Releasing a handle stops the stream exactly once
/// WHY: Every exit path releases, so repeats must be harmless
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_live_handle_when_released_twice_then_second_is_noop() {
    // Given: A handle over a granted stream
    let devices = TestPatternDevices::new(small_pattern());
    let stream = devices
        .get_user_media(&MediaConstraints::default())
        .await
        .unwrap();
    let handle = HardwareHandle::new(Arc::clone(&stream));
    assert!(handle.audio_only().is_some());

    // When: Releasing twice
    let first = handle.release();
    let second = handle.release();

    // Then: The stream is stopped and accessors go dark
    assert!(first);
    assert!(!second);
    assert!(handle.is_released());
    assert!(!stream.is_live());
    assert!(handle.audio_only().is_none());
    assert!(handle.video_frames().is_none());
}

/// WHAT: Dropping a handle releases the hardware
/// WHY: A forgotten handle must not keep the camera light on
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_handle_when_dropped_then_stream_stopped() {
    let devices = TestPatternDevices::new(small_pattern());
    let stream = devices
        .get_user_media(&MediaConstraints::default())
        .await
        .unwrap();

    drop(HardwareHandle::new(Arc::clone(&stream)));

    assert!(!stream.is_live());
}

/// WHAT: Successful acquisition reports both readiness stages
/// WHY: Capture may only begin once the preview shows a frame
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_granting_backend_when_acquiring_then_stream_and_preview_ready() {
    // Given: A backend that grants 32x24 frames
    let devices = Arc::new(TestPatternDevices::new(small_pattern()));
    let mut manager = manager(&devices);

    // When: Acquiring
    let stream_id = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .unwrap()
        .stream_id()
        .to_string();

    // Then: Both stages are ready and the preview is muted
    assert_eq!(stream_id, "test-pattern-0");
    assert!(manager.readiness().stream_acquired);
    assert!(manager.readiness().preview_ready);
    assert!(manager.preview().is_attached());
    assert!(manager.preview().is_muted());
    assert_eq!(
        manager.preview().decoded_dimensions(),
        Some(FrameDimensions {
            width: 32,
            height: 24
        })
    );
}

/// WHAT: Acquiring twice reuses the ready handle
/// WHY: A second prompt would re-open the devices for nothing
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_ready_manager_when_acquiring_again_then_same_stream() {
    let devices = Arc::new(TestPatternDevices::new(small_pattern()));
    let mut manager = manager(&devices);

    manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .unwrap();
    manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .unwrap();

    assert_eq!(devices.granted_streams().len(), 1);
}

/// WHAT: A refused prompt maps to PermissionDenied
/// WHY: The user needs a specific message to fix their browser settings
#[tokio::test(start_paused = true)]
async fn given_denied_permission_when_acquiring_then_permission_denied_error() {
    // Given: A backend that refuses access
    let devices = Arc::new(
        TestPatternDevices::new(small_pattern()).failing_with(AcquisitionFailure::PermissionDenied),
    );
    let mut manager = manager(&devices);

    // When: Acquiring
    let result = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());

    // Then: No hardware is held and nothing is attached
    assert!(matches!(result, Err(ProctorError::PermissionDenied { .. })));
    assert!(manager.handle().is_none());
    assert!(!manager.readiness().stream_acquired);
    assert!(!manager.preview().is_attached());
}

/// WHAT: Busy and missing devices keep their distinct errors
/// WHY: Each failure has its own remedy
#[tokio::test(start_paused = true)]
async fn given_busy_or_missing_device_when_acquiring_then_specific_errors() {
    let devices = Arc::new(TestPatternDevices::new(small_pattern()));
    let mut manager = manager(&devices);

    devices.set_failure(Some(AcquisitionFailure::DeviceBusy));
    let busy = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());
    assert!(matches!(busy, Err(ProctorError::DeviceBusy { .. })));

    devices.set_failure(Some(AcquisitionFailure::NotFound));
    let missing = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());
    assert!(matches!(missing, Err(ProctorError::NoDeviceFound { .. })));
}

/// WHAT: An unanswered prompt times out
/// WHY: A pending permission request must not hang the session forever
#[tokio::test(start_paused = true)]
async fn given_never_resolving_backend_when_acquiring_then_times_out() {
    // Given: A backend whose prompt never resolves
    let devices = Arc::new(TestPatternDevices::new(small_pattern()).never_resolving());
    let mut manager = manager(&devices);

    // When: Acquiring
    let started = tokio::time::Instant::now();
    let result = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());

    // Then: The grant timeout elapsed and nothing is held
    assert!(matches!(
        result,
        Err(ProctorError::AcquisitionTimedOut {
            waited_ms: 2_000,
            ..
        })
    ));
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(manager.handle().is_none());
}

/// WHAT: A stream without camera frames is released and reported
/// WHY: Snapshots need a preview; a partial grant must not leak the microphone
#[tokio::test(start_paused = true)]
async fn given_audio_only_stream_when_acquiring_then_preview_unavailable_and_released() {
    // Given: A backend that grants no camera track
    let devices = Arc::new(TestPatternDevices::new(TestPatternConfig {
        video: false,
        ..small_pattern()
    }));
    let mut manager = manager(&devices);

    // When: Acquiring
    let result = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());

    // Then: Preview is unavailable and the granted stream was stopped
    assert!(matches!(
        result,
        Err(ProctorError::PreviewUnavailable { .. })
    ));
    let granted = devices.granted_streams();
    assert_eq!(granted.len(), 1);
    assert!(!granted[0].is_live());
    assert!(manager.handle().is_none());
}

/// WHAT: A preview that never decodes a frame times out and releases
/// WHY: Capture must not start against a black preview
#[tokio::test(start_paused = true)]
async fn given_slow_first_frame_when_acquiring_then_preview_timeout_releases() {
    let devices = Arc::new(TestPatternDevices::new(TestPatternConfig {
        first_frame_delay: Duration::from_secs(30),
        ..small_pattern()
    }));
    let mut manager = manager(&devices);

    let result = manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .map(|_| ());

    assert!(matches!(
        result,
        Err(ProctorError::PreviewUnavailable { .. })
    ));
    assert!(!devices.granted_streams()[0].is_live());
    assert!(!manager.preview().is_attached());
}

/// WHAT: release detaches the preview and can be repeated
/// WHY: Teardown calls release from several paths
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_acquired_manager_when_released_twice_then_everything_stopped() {
    let devices = Arc::new(TestPatternDevices::new(small_pattern()));
    let mut manager = manager(&devices);
    manager
        .acquire(&MediaConstraints::default(), timeouts())
        .await
        .unwrap();

    manager.release();
    manager.release();

    assert!(manager.handle().is_none());
    assert!(!manager.preview().is_attached());
    assert!(manager.preview().rasterize().is_none());
    assert_eq!(manager.readiness(), Default::default());
    assert!(!devices.granted_streams()[0].is_live());
}
