use super::{Permission, PermissionResult};
use crate::error::PermissionError;
use crate::platform::PermissionAuthority;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the screen should do right after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStep {
    /// Everything is granted; start the camera now
    StartCamera,
    /// Show the OS dialog for the missing permissions
    Request(Vec<Permission>),
    /// Camera start was already issued for this screen
    AlreadyStarted,
}

/// Outcome of a permission dialog callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    StartCamera,
    AlreadyStarted,
    /// Fatal to the screen: show the message and close
    Denied(PermissionError),
    /// Callback for a different request code
    Ignored,
}

/// Pending OS permission dialog; owns everything it needs to run on a task
pub struct PermissionRequest {
    authority: Arc<dyn PermissionAuthority>,
    request_code: i32,
    permissions: Vec<Permission>,
}

impl PermissionRequest {
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub async fn send(self) -> PermissionResult {
        debug!(
            "Requesting permissions {:?} (request code {})",
            self.permissions, self.request_code
        );
        self.authority
            .request(self.request_code, self.permissions)
            .await
    }
}

/// Verifies required permissions before any camera operation.
///
/// Camera startup is issued at most once per gate, whether the permissions
/// were already granted or arrived through the dialog callback. A denial is
/// never retried.
pub struct PermissionGate {
    required: Vec<Permission>,
    request_code: i32,
    authority: Arc<dyn PermissionAuthority>,
    start_issued: bool,
}

impl PermissionGate {
    pub fn new(
        required: Vec<Permission>,
        request_code: i32,
        authority: Arc<dyn PermissionAuthority>,
    ) -> Self {
        let mut required = required;
        required.sort();
        required.dedup();
        Self {
            required,
            request_code,
            authority,
            start_issued: false,
        }
    }

    pub fn required(&self) -> &[Permission] {
        &self.required
    }

    pub fn request_code(&self) -> i32 {
        self.request_code
    }

    pub fn start_issued(&self) -> bool {
        self.start_issued
    }

    /// True iff every required permission is granted by the authority
    pub fn all_granted(&self) -> bool {
        self.required.iter().all(|p| self.authority.check(*p))
    }

    pub fn missing(&self) -> Vec<Permission> {
        self.required
            .iter()
            .copied()
            .filter(|p| !self.authority.check(*p))
            .collect()
    }

    /// Decide the first step when the screen is created
    pub fn on_create(&mut self) -> GateStep {
        if self.all_granted() {
            if self.take_start() {
                GateStep::StartCamera
            } else {
                GateStep::AlreadyStarted
            }
        } else {
            GateStep::Request(self.missing())
        }
    }

    /// Build the OS dialog request for whatever is still missing
    pub fn request_missing(&self) -> PermissionRequest {
        PermissionRequest {
            authority: Arc::clone(&self.authority),
            request_code: self.request_code,
            permissions: self.missing(),
        }
    }

    /// Handle the one-shot dialog callback
    pub fn on_permission_result(&mut self, result: &PermissionResult) -> GateDecision {
        if result.request_code != self.request_code {
            debug!(
                "Ignoring permission result for request code {}",
                result.request_code
            );
            return GateDecision::Ignored;
        }

        debug!("Permission dialog answered {:?}", result.grants);

        // The authority is the source of truth; the dialog answer alone
        // does not start the camera
        let missing = self.missing();
        if !missing.is_empty() {
            warn!("Permissions not granted by the user: {:?}", missing);
            return GateDecision::Denied(PermissionError::Denied {
                missing: missing.iter().map(|p| p.to_string()).collect(),
            });
        }

        if self.take_start() {
            info!("All required permissions granted");
            GateDecision::StartCamera
        } else {
            GateDecision::AlreadyStarted
        }
    }

    fn take_start(&mut self) -> bool {
        !std::mem::replace(&mut self.start_issued, true)
    }
}
