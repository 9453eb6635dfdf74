use super::*;
use crate::capture::OutputFileOptions;
use crate::error::{BindError, CaptureError};
use crate::routing::ResultCode;
use crate::session::{ImageCapture, LensFacing, Preview, UseCase, UseCaseKind};

fn preview_and_capture(resolution: (u32, u32)) -> (ImageCapture, Vec<UseCase>) {
    let mut preview = Preview::builder().target_resolution(resolution).build();
    preview.set_surface_provider(SurfaceProvider("test-surface".to_string()));
    let capture = ImageCapture::builder().target_resolution(resolution).build();
    let use_cases = vec![
        UseCase::Preview(preview),
        UseCase::ImageCapture(capture.clone()),
    ];
    (capture, use_cases)
}

#[tokio::test]
async fn test_provider_acquisition() {
    let platform = SimulatedPlatform::builder().build();
    let provider = platform.acquire().await.unwrap();
    assert_eq!(provider.available_cameras().len(), 2);
    assert!(provider.bound_use_cases().is_empty());

    let unavailable = SimulatedPlatform::builder().provider_available(false).build();
    assert!(matches!(
        unavailable.acquire().await,
        Err(BindError::ProviderUnavailable { .. })
    ));
}

#[test]
fn test_bind_commits_all_use_cases() {
    let platform = SimulatedPlatform::builder().build();
    let (_, use_cases) = preview_and_capture((720, 1280));
    let lifecycle = LifecycleId::new();

    let handle = platform
        .bind_to_lifecycle(
            lifecycle,
            &CameraSelector::require_lens_facing(LensFacing::Front),
            &use_cases,
        )
        .unwrap();

    assert_eq!(handle.camera_id, "1");
    assert_eq!(handle.lens_facing, LensFacing::Front);
    assert_eq!(handle.lifecycle, lifecycle);
    assert_eq!(
        platform.bound_use_cases(),
        vec![UseCaseKind::Preview, UseCaseKind::ImageCapture]
    );
    assert!(platform.surface_attached());

    platform.unbind_all();
    assert!(platform.bound_use_cases().is_empty());
    assert!(!platform.surface_attached());
}

#[test]
fn test_bind_unsupported_resolution_binds_nothing() {
    let platform = SimulatedPlatform::builder().build();
    let (_, use_cases) = preview_and_capture((4000, 6000));

    let result = platform.bind_to_lifecycle(
        LifecycleId::new(),
        &CameraSelector::require_lens_facing(LensFacing::Front),
        &use_cases,
    );

    assert!(matches!(
        result,
        Err(BindError::UnsupportedResolution { .. })
    ));
    assert!(platform.bound_use_cases().is_empty());
    assert_eq!(platform.bind_attempts(), 1);
}

#[test]
fn test_bind_rejects_missing_lens_and_busy_device() {
    let platform = SimulatedPlatform::builder()
        .cameras(vec![CameraInfo {
            id: "0".to_string(),
            lens_facing: LensFacing::Back,
            max_resolution: (3024, 4032),
        }])
        .build();
    let (_, use_cases) = preview_and_capture((720, 1280));

    let result = platform.bind_to_lifecycle(
        LifecycleId::new(),
        &CameraSelector::require_lens_facing(LensFacing::Front),
        &use_cases,
    );
    assert_eq!(
        result.unwrap_err(),
        BindError::NoMatchingCamera {
            lens: "front".to_string()
        }
    );

    platform.set_device_busy(true);
    let result = platform.bind_to_lifecycle(
        LifecycleId::new(),
        &CameraSelector::require_lens_facing(LensFacing::Back),
        &use_cases,
    );
    assert!(matches!(result, Err(BindError::DeviceBusy { .. })));
    assert!(platform.bound_use_cases().is_empty());
}

#[test]
fn test_second_lifecycle_cannot_bind_until_unbound() {
    let platform = SimulatedPlatform::builder().build();
    let selector = CameraSelector::require_lens_facing(LensFacing::Back);
    let (_, first) = preview_and_capture((720, 1280));
    let (_, second) = preview_and_capture((720, 1280));

    platform
        .bind_to_lifecycle(LifecycleId::new(), &selector, &first)
        .unwrap();
    assert!(matches!(
        platform.bind_to_lifecycle(LifecycleId::new(), &selector, &second),
        Err(BindError::DeviceBusy { .. })
    ));

    platform.unbind_all();
    assert!(platform
        .bind_to_lifecycle(LifecycleId::new(), &selector, &second)
        .is_ok());
}

#[tokio::test]
async fn test_take_picture_writes_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder().build();
    let (capture, use_cases) = preview_and_capture((64, 48));
    platform
        .bind_to_lifecycle(
            LifecycleId::new(),
            &CameraSelector::require_lens_facing(LensFacing::Back),
            &use_cases,
        )
        .unwrap();

    let path = dir.path().join("shot.jpg");
    let results = platform
        .take_picture(&capture, OutputFileOptions { path: path.clone() })
        .await
        .unwrap();

    assert_eq!(results.saved_path, path);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.to_rgb8().dimensions(), (64, 48));
    assert_eq!(platform.captures_taken(), 1);
}

#[tokio::test]
async fn test_take_picture_requires_bound_use_case() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder().build();
    let capture = ImageCapture::builder().target_resolution((64, 48)).build();

    let result = platform
        .take_picture(
            &capture,
            OutputFileOptions {
                path: dir.path().join("never.jpg"),
            },
        )
        .await;

    assert!(matches!(result, Err(CaptureError::Device { .. })));
    assert!(!dir.path().join("never.jpg").exists());
}

#[tokio::test]
async fn test_injected_capture_failure() {
    let dir = tempfile::tempdir().unwrap();
    let platform = SimulatedPlatform::builder()
        .capture_failure("sensor timeout")
        .build();
    let (capture, use_cases) = preview_and_capture((64, 48));
    platform
        .bind_to_lifecycle(
            LifecycleId::new(),
            &CameraSelector::require_lens_facing(LensFacing::Back),
            &use_cases,
        )
        .unwrap();

    let path = dir.path().join("fail.jpg");
    match platform
        .take_picture(&capture, OutputFileOptions { path: path.clone() })
        .await
    {
        Err(CaptureError::Device { details }) => assert_eq!(details, "sensor timeout"),
        other => panic!("Expected device failure, got {:?}", other),
    }
    assert!(!path.exists());

    platform.set_capture_failure(None);
    assert!(platform
        .take_picture(&capture, OutputFileOptions { path: path.clone() })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_picker_scripts() {
    let platform = SimulatedPlatform::builder()
        .picker(PickerScript::Pick("content://media/42".to_string()))
        .build();

    let picked = platform.pick(100).await;
    assert_eq!(picked.request_code, 100);
    assert_eq!(picked.result_code, ResultCode::Ok);
    assert_eq!(picked.data.as_deref(), Some("content://media/42"));

    platform.set_picker(PickerScript::Cancel);
    let canceled = platform.pick(100).await;
    assert_eq!(canceled.result_code, ResultCode::Canceled);
    assert!(canceled.data.is_none());

    platform.set_picker(PickerScript::Fail(3));
    assert_eq!(platform.pick(100).await.result_code, ResultCode::Other(3));
}

#[test]
fn test_shared_services_route_to_one_platform() {
    let platform = SimulatedPlatform::builder().build();
    let services = PlatformServices::from_shared(Arc::new(platform.clone()));

    services.host.show_message("hello");
    services.host.finish();
    services
        .navigator
        .start(crate::routing::NavigationPayload::new("draw"));

    assert_eq!(platform.messages(), vec!["hello".to_string()]);
    assert!(platform.is_finished());
    assert_eq!(platform.navigations().len(), 1);
    assert_eq!(
        services.host.surface_provider(),
        SurfaceProvider("sim-viewfinder".to_string())
    );
}
