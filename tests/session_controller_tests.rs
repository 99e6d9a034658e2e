// Integration tests for the recording session controller
//
// Time is paused so the one-second duration timer can be driven
// deterministically with `tokio::time::sleep`.

mod common;

use anyhow::Result;
use common::FakeDevice;
use micro_tasks::device::{FixedPermissionGate, PromptPermissionGate};
use micro_tasks::session::{RecordingSessionController, SessionOutcome, SessionState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

async fn wait_until_pending(gate: &PromptPermissionGate) {
    while !gate.is_pending() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_hold_within_window_is_valid() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    let pressed = handle.press().await?;
    assert_eq!(pressed, SessionState::Recording { elapsed_secs: 0 });

    sleep(Duration::from_millis(12_500)).await;
    assert_eq!(handle.state(), SessionState::Recording { elapsed_secs: 12 });

    let released = handle.release().await?;
    let outcome = handle.wait_for_outcome().await?;
    assert_eq!(released.outcome(), Some(&outcome));

    match outcome {
        SessionOutcome::Valid {
            duration_secs,
            audio_ref,
        } => {
            assert_eq!(duration_secs, 12);
            let audio_ref = audio_ref.expect("valid recording keeps its output");
            let name = audio_ref.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("text_reading_audio_"));
            assert!(name.ends_with(".wav"));
        }
        other => panic!("expected Valid, got {:?}", other),
    }

    assert_eq!(probe.starts(), 1);
    assert_eq!(probe.stops(), 1);
    assert_eq!(probe.discards(), 0);
    assert_eq!(probe.releases(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_short_hold_is_discarded() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(5_500)).await;
    handle.release().await?;

    assert_eq!(handle.wait_for_outcome().await?, SessionOutcome::TooShort);
    assert_eq!(probe.stops(), 1);
    assert_eq!(probe.discards(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_hold_past_max_auto_stops() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "image_description",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;

    // 21st tick stops the session without any release
    let outcome = handle.wait_for_outcome().await?;
    assert_eq!(outcome, SessionOutcome::TooLong);
    assert_eq!(probe.stops(), 1);
    assert_eq!(probe.discards(), 1);

    // Timer is cancelled: nothing changes afterwards
    sleep(Duration::from_secs(5)).await;
    handle.release().await?;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.state().outcome(), Some(&SessionOutcome::TooLong));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_recording() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(14_500)).await;
    handle.cancel().await?;

    let outcome = handle.wait_for_outcome().await?;
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(outcome.duration_secs(), 0);
    assert_eq!(probe.discards(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_never_starts_device() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let gate = Arc::new(PromptPermissionGate::new(false));
    let handle =
        RecordingSessionController::new("text_reading", Box::new(device), gate.clone()).spawn();

    handle.press().await?;
    handle
        .wait_for(|state| *state == SessionState::AwaitingPermission)
        .await?;

    wait_until_pending(&gate).await;
    assert!(gate.resolve(false));

    let outcome = handle.wait_for_outcome().await?;
    assert_eq!(outcome, SessionOutcome::PermissionDenied);
    assert_eq!(outcome.message(), "Microphone permission denied.");
    assert_eq!(probe.starts(), 0);
    assert_eq!(probe.stops(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_permission_granted_starts_recording() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let gate = Arc::new(PromptPermissionGate::new(false));
    let handle =
        RecordingSessionController::new("text_reading", Box::new(device), gate.clone()).spawn();

    handle.press().await?;
    wait_until_pending(&gate).await;
    assert!(gate.resolve(true));

    handle.wait_for(SessionState::is_recording).await?;
    assert_eq!(probe.starts(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dispose_while_recording_releases_once() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(3_500)).await;

    handle.dispose().await?;
    assert_eq!(probe.releases(), 1);
    assert!(handle.state().is_idle());

    // The partial capture is stopped and thrown away
    assert_eq!(probe.stops(), 1);
    assert_eq!(probe.discards(), 1);

    // No further ticks and no second release once the controller exits
    sleep(Duration::from_secs(30)).await;
    assert!(handle.state().is_idle());
    assert_eq!(probe.releases(), 1);
    assert!(handle.is_closed());
    assert!(handle.press().await.is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dispose_from_idle_releases() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "photo_capture",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.dispose().await?;

    assert_eq!(probe.releases(), 1);
    assert_eq!(probe.starts(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_decision_after_dispose_is_ignored() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let gate = Arc::new(PromptPermissionGate::new(false));
    let handle =
        RecordingSessionController::new("text_reading", Box::new(device), gate.clone()).spawn();

    handle.press().await?;
    wait_until_pending(&gate).await;

    handle.dispose().await?;
    gate.resolve(true);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(probe.starts(), 0);
    assert_eq!(probe.releases(), 1);
    assert!(handle.state().is_idle());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dropping_all_handles_releases_device() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    drop(handle);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(probe.releases(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dropped_controller_releases_device() {
    let (device, probe) = FakeDevice::new();
    let controller = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    );

    drop(controller);

    assert_eq!(probe.releases(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_device_start_failure() -> Result<()> {
    let (device, probe) = FakeDevice::failing();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    let outcome = handle.wait_for_outcome().await?;

    assert_eq!(outcome, SessionOutcome::DeviceStartFailed);
    assert_eq!(probe.starts(), 1);

    // No timer was started
    sleep(Duration::from_secs(25)).await;
    assert_eq!(handle.state().outcome(), Some(&SessionOutcome::DeviceStartFailed));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_record_again_after_reset() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    handle.release().await?;
    assert_eq!(handle.wait_for_outcome().await?, SessionOutcome::TooShort);

    handle.reset().await?;
    handle.wait_for(SessionState::is_idle).await?;

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(10_500)).await;
    handle.release().await?;

    let outcome = handle.wait_for_outcome().await?;
    assert_eq!(outcome.duration_secs(), 10);
    assert!(outcome.audio_ref().is_some());
    assert_eq!(probe.starts(), 2);
    assert_eq!(probe.releases(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_valid_outcome_without_output_has_no_audio_ref() -> Result<()> {
    struct SilentDevice;

    impl micro_tasks::device::AudioDevice for SilentDevice {
        fn start(&mut self, _output_name: &str) -> bool {
            true
        }
        fn stop(&mut self) -> Option<PathBuf> {
            None
        }
        fn release(&mut self) {}
        fn name(&self) -> &str {
            "silent"
        }
    }

    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(SilentDevice),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(11_500)).await;
    handle.release().await?;

    let outcome = handle.wait_for_outcome().await?;
    assert!(outcome.is_valid());
    assert_eq!(outcome.audio_ref(), None);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_record_again_discards_previous_take() -> Result<()> {
    let (device, probe) = FakeDevice::new();
    let handle = RecordingSessionController::new(
        "text_reading",
        Box::new(device),
        Arc::new(FixedPermissionGate::granted()),
    )
    .spawn();

    handle.press().await?;
    handle.wait_for(SessionState::is_recording).await?;
    sleep(Duration::from_millis(12_500)).await;
    handle.release().await?;
    assert!(handle.wait_for_outcome().await?.is_valid());
    assert_eq!(probe.discards(), 0);

    handle.reset().await?;
    handle.wait_for(SessionState::is_idle).await?;
    assert_eq!(probe.discards(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dispose_keeps_finished_recording_but_abandon_drops_it() -> Result<()> {
    for abandon in [false, true] {
        let (device, probe) = FakeDevice::new();
        let handle = RecordingSessionController::new(
            "text_reading",
            Box::new(device),
            Arc::new(FixedPermissionGate::granted()),
        )
        .spawn();

        handle.press().await?;
        handle.wait_for(SessionState::is_recording).await?;
        sleep(Duration::from_millis(10_500)).await;
        handle.release().await?;
        assert!(handle.wait_for_outcome().await?.is_valid());

        if abandon {
            handle.abandon().await?;
        } else {
            handle.dispose().await?;
        }

        assert_eq!(probe.releases(), 1);
        assert_eq!(probe.discards(), usize::from(abandon));
    }

    Ok(())
}
