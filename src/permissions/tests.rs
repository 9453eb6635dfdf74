use super::*;
use crate::error::PermissionError;
use crate::platform::{PermissionAuthority, SimulatedPlatform};
use std::sync::Arc;

fn required() -> Vec<Permission> {
    vec![
        Permission::Camera,
        Permission::ReadExternalStorage,
        Permission::Internet,
    ]
}

fn create_test_gate(platform: &SimulatedPlatform) -> PermissionGate {
    PermissionGate::new(required(), 10, Arc::new(platform.clone()))
}

#[test]
fn test_permission_names() {
    assert_eq!(Permission::Camera.to_string(), "android.permission.CAMERA");
    assert_eq!("camera".parse::<Permission>().unwrap(), Permission::Camera);
    assert_eq!(
        "android.permission.INTERNET".parse::<Permission>().unwrap(),
        Permission::Internet
    );
    assert!("microphone".parse::<Permission>().is_err());
}

#[test]
fn test_all_granted_starts_camera_once() {
    let platform = SimulatedPlatform::builder().grant_all(required()).build();
    let mut gate = create_test_gate(&platform);

    assert!(gate.all_granted());
    assert!(gate.missing().is_empty());
    assert_eq!(gate.on_create(), GateStep::StartCamera);
    assert!(gate.start_issued());
    assert_eq!(gate.on_create(), GateStep::AlreadyStarted);
}

#[test]
fn test_missing_permissions_are_requested() {
    let platform = SimulatedPlatform::builder()
        .grant(Permission::Camera)
        .build();
    let mut gate = create_test_gate(&platform);

    assert!(!gate.all_granted());
    match gate.on_create() {
        GateStep::Request(missing) => {
            assert_eq!(
                missing,
                vec![Permission::ReadExternalStorage, Permission::Internet]
            );
        }
        other => panic!("Expected a permission request, got {:?}", other),
    }
    assert!(!gate.start_issued());
}

#[test]
fn test_required_list_is_deduplicated() {
    let platform = SimulatedPlatform::builder().build();
    let gate = PermissionGate::new(
        vec![Permission::Camera, Permission::Camera, Permission::Internet],
        10,
        Arc::new(platform),
    );
    assert_eq!(gate.required(), &[Permission::Camera, Permission::Internet]);
    assert_eq!(gate.request_code(), 10);
}

#[tokio::test]
async fn test_dialog_grant_starts_camera() {
    let platform = SimulatedPlatform::builder().build();
    let mut gate = create_test_gate(&platform);
    assert!(matches!(gate.on_create(), GateStep::Request(_)));

    let request = gate.request_missing();
    assert_eq!(request.permissions().len(), 3);
    let result = request.send().await;

    assert_eq!(result.request_code, 10);
    assert_eq!(platform.permission_requests(), 1);
    assert_eq!(gate.on_permission_result(&result), GateDecision::StartCamera);
    assert_eq!(
        gate.on_permission_result(&result),
        GateDecision::AlreadyStarted
    );
}

#[tokio::test]
async fn test_dialog_denial_is_reported() {
    let platform = SimulatedPlatform::builder()
        .dialog_answer(Permission::Camera, false)
        .build();
    let mut gate = create_test_gate(&platform);
    gate.on_create();

    let result = gate.request_missing().send().await;
    match gate.on_permission_result(&result) {
        GateDecision::Denied(PermissionError::Denied { missing }) => {
            assert_eq!(missing, vec!["android.permission.CAMERA".to_string()]);
        }
        other => panic!("Expected denial, got {:?}", other),
    }
    assert!(!gate.start_issued());
}

#[test]
fn test_foreign_request_code_is_ignored() {
    let platform = SimulatedPlatform::builder().build();
    let mut gate = create_test_gate(&platform);

    let result = PermissionResult::new(42, required().into_iter().map(|p| (p, true)));
    assert_eq!(gate.on_permission_result(&result), GateDecision::Ignored);
    assert!(!gate.start_issued());
}

#[test]
fn test_result_counts_previously_granted_permissions() {
    // The dialog only lists what was missing
    let platform = SimulatedPlatform::builder()
        .grant(Permission::Camera)
        .grant(Permission::Internet)
        .grant(Permission::ReadExternalStorage)
        .build();
    let mut gate = create_test_gate(&platform);

    let result = PermissionResult::new(10, [(Permission::ReadExternalStorage, true)]);
    assert_eq!(gate.on_permission_result(&result), GateDecision::StartCamera);
}

/// Authority whose dialog claims success but never records a grant
struct StubbornAuthority;

#[async_trait::async_trait]
impl PermissionAuthority for StubbornAuthority {
    fn check(&self, _permission: Permission) -> bool {
        false
    }

    async fn request(&self, request_code: i32, permissions: Vec<Permission>) -> PermissionResult {
        PermissionResult::new(request_code, permissions.into_iter().map(|p| (p, true)))
    }
}

#[tokio::test]
async fn test_dialog_answer_without_authority_grant_is_denied() {
    let mut gate = PermissionGate::new(required(), 10, Arc::new(StubbornAuthority));
    assert!(matches!(gate.on_create(), GateStep::Request(_)));

    let result = gate.request_missing().send().await;
    assert!(result.is_granted(Permission::Camera));
    assert!(!gate.all_granted());

    match gate.on_permission_result(&result) {
        GateDecision::Denied(PermissionError::Denied { missing }) => assert_eq!(missing.len(), 3),
        other => panic!("Expected denial, got {:?}", other),
    }
    assert!(!gate.start_issued());
}
