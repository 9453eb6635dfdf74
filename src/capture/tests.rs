use super::*;
use crate::analysis::BackpressureStrategy;
use crate::config::{CameraConfig, CaptureConfig};
use crate::error::CaptureError;
use crate::platform::SimulatedPlatform;
use crate::session::{BindOutcome, CameraSession, CameraSessionManager, LensFacing, LifecycleId};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap() + chrono::Duration::milliseconds(42)
}

fn utc() -> TimestampZone {
    TimestampZone::Named(chrono_tz::UTC)
}

fn create_test_capture_config(root: &std::path::Path) -> CaptureConfig {
    CaptureConfig {
        media_root: root.join("media").to_string_lossy().into_owned(),
        app_name: "Snapcam".to_string(),
        files_dir: root.join("files").to_string_lossy().into_owned(),
        timezone: "UTC".to_string(),
    }
}

async fn bound_session(platform: &SimulatedPlatform) -> CameraSession {
    let config = CameraConfig {
        lens_facing: LensFacing::Back,
        preview_resolution: (64, 48),
        capture_resolution: (64, 48),
        analysis_resolution: (32, 24),
        backpressure: BackpressureStrategy::KeepOnlyLatest,
        bind_analysis: false,
    };
    let mut manager =
        CameraSessionManager::new(config, LifecycleId::new(), Arc::new(platform.clone()));
    match manager.start_camera(Arc::new(platform.clone()), None).await {
        BindOutcome::Bound(session) => session,
        BindOutcome::Failed(e) => panic!("Test session failed to bind: {}", e),
    }
}

fn create_test_coordinator(dir: &std::path::Path) -> CaptureCoordinator {
    CaptureCoordinator::new(
        std::fs::canonicalize(dir).unwrap(),
        utc(),
        Arc::new(FixedClock(fixed_instant())),
    )
}

#[test]
fn test_capture_file_name_format() {
    assert_eq!(
        capture_file_name(utc(), fixed_instant()),
        "2024-03-05-14-07-09-042.jpg"
    );

    let tokyo = TimestampZone::Named(chrono_tz::Asia::Tokyo);
    assert_eq!(
        capture_file_name(tokyo, fixed_instant()),
        "2024-03-05-23-07-09-042.jpg"
    );
}

#[test]
fn test_resolve_timestamp_zone() {
    assert_eq!(resolve_timestamp_zone("local"), TimestampZone::Local);
    assert_eq!(resolve_timestamp_zone("UTC"), utc());
    assert_eq!(
        resolve_timestamp_zone("Europe/Berlin"),
        TimestampZone::Named(chrono_tz::Europe::Berlin)
    );
    assert_eq!(resolve_timestamp_zone("Mars/Olympus"), TimestampZone::Local);
}

#[test]
fn test_colliding_names_get_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let at = fixed_instant();

    let first = unique_capture_path(dir.path(), utc(), at);
    assert_eq!(
        first.file_name().unwrap().to_str().unwrap(),
        "2024-03-05-14-07-09-042.jpg"
    );
    std::fs::write(&first, b"x").unwrap();

    let second = unique_capture_path(dir.path(), utc(), at);
    assert_eq!(
        second.file_name().unwrap().to_str().unwrap(),
        "2024-03-05-14-07-09-042-1.jpg"
    );
    std::fs::write(&second, b"x").unwrap();

    let third = unique_capture_path(dir.path(), utc(), at);
    assert_eq!(
        third.file_name().unwrap().to_str().unwrap(),
        "2024-03-05-14-07-09-042-2.jpg"
    );
}

#[test]
fn test_output_directory_prefers_media_root() {
    let root = tempfile::tempdir().unwrap();
    let config = create_test_capture_config(root.path());

    let dir = resolve_output_directory(&config).unwrap();
    assert!(dir.is_absolute());
    assert!(dir.is_dir());
    assert!(dir.ends_with("media/Snapcam"));
}

#[test]
fn test_output_directory_falls_back_to_files_dir() {
    let root = tempfile::tempdir().unwrap();
    let config = create_test_capture_config(root.path());
    // A plain file where the media root should be
    std::fs::write(root.path().join("media"), b"not a directory").unwrap();

    let dir = resolve_output_directory(&config).unwrap();
    assert!(dir.is_dir());
    assert!(dir.ends_with("files"));
}

#[test]
fn test_output_directory_unavailable() {
    let root = tempfile::tempdir().unwrap();
    let config = create_test_capture_config(root.path());
    std::fs::write(root.path().join("media"), b"x").unwrap();
    std::fs::write(root.path().join("files"), b"x").unwrap();

    assert!(matches!(
        resolve_output_directory(&config),
        Err(CaptureError::OutputDirectory { .. })
    ));
}

#[tokio::test]
async fn test_capture_before_session_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = create_test_coordinator(dir.path());

    assert!(matches!(
        coordinator.begin(None),
        Err(CaptureError::NotReady)
    ));
    assert!(matches!(
        coordinator.capture(None).await,
        Err(CaptureError::NotReady)
    ));
    assert!(!coordinator.is_in_flight());
}

#[tokio::test]
async fn test_capture_writes_file_and_uri() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder().build();
    let session = bound_session(&platform).await;
    let coordinator = create_test_coordinator(dir.path());

    let image = coordinator.capture(Some(&session)).await.unwrap();

    assert_eq!(image.path.parent().unwrap(), coordinator.output_dir());
    assert_eq!(
        image.path.file_name().unwrap().to_str().unwrap(),
        "2024-03-05-14-07-09-042.jpg"
    );
    assert!(image.path.is_file());
    assert!(image.uri.starts_with("file:///"));
    assert!(image.uri.ends_with("/2024-03-05-14-07-09-042.jpg"));
    assert!(!coordinator.is_in_flight());
    assert_eq!(platform.captures_taken(), 1);
}

#[tokio::test]
async fn test_second_capture_rejected_while_pending() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder().build();
    let session = bound_session(&platform).await;
    let coordinator = create_test_coordinator(dir.path());

    let pending = coordinator.begin(Some(&session)).unwrap();
    assert!(coordinator.is_in_flight());
    assert!(matches!(
        coordinator.begin(Some(&session)),
        Err(CaptureError::InFlight)
    ));

    let outcome = pending.complete().await;
    assert!(coordinator.is_in_flight());
    let first = outcome.into_result().unwrap();
    assert!(!coordinator.is_in_flight());

    // Same millisecond: the second file must not overwrite the first
    let second = coordinator.capture(Some(&session)).await.unwrap();
    assert_ne!(first.path, second.path);
    assert!(first.path.is_file());
    assert!(second.path.is_file());
}

#[tokio::test]
async fn test_dropped_request_clears_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder().build();
    let session = bound_session(&platform).await;
    let coordinator = create_test_coordinator(dir.path());

    let pending = coordinator.begin(Some(&session)).unwrap();
    drop(pending);

    assert!(!coordinator.is_in_flight());
    assert!(coordinator.begin(Some(&session)).is_ok());
}

#[tokio::test]
async fn test_capture_failure_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder()
        .capture_failure("storage full")
        .build();
    let session = bound_session(&platform).await;
    let coordinator = create_test_coordinator(dir.path());

    match coordinator.capture(Some(&session)).await {
        Err(CaptureError::Device { details }) => assert_eq!(details, "storage full"),
        other => panic!("Expected device failure, got {:?}", other),
    }
    assert!(!coordinator.is_in_flight());
    assert_eq!(std::fs::read_dir(coordinator.output_dir()).unwrap().count(), 0);

    // Manual retry after the failure clears
    platform.set_capture_failure(None);
    assert!(coordinator.capture(Some(&session)).await.is_ok());
}
