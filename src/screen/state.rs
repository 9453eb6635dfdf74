use tracing::debug;

/// Where the camera screen is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenPhase {
    #[default]
    Created,
    AwaitingPermission,
    AcquiringProvider,
    Previewing,
    /// Binding failed; the screen stays up without a working preview
    PreviewUnavailable { reason: String },
    Closed,
}

/// User-visible failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    CameraBindingFailure,
    CaptureFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Inputs to the UI-state reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    PermissionsRequested,
    PermissionsDenied(String),
    CameraStarting,
    CameraBound,
    CameraBindFailed(String),
    CaptureIssued,
    CaptureSaved,
    CaptureFailed(String),
    ImageRouted,
    PickIgnored,
    Notified(String),
    Destroyed,
}

/// State rendered by the camera screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    pub phase: ScreenPhase,
    pub capture_in_flight: bool,
    pub last_failure: Option<Failure>,
    pub routed: u32,
    pub ignored_picks: u32,
    pub last_message: Option<String>,
}

impl UiState {
    pub fn is_closed(&self) -> bool {
        self.phase == ScreenPhase::Closed
    }

    /// Capture button is live only while previewing with nothing pending
    pub fn can_capture(&self) -> bool {
        self.phase == ScreenPhase::Previewing && !self.capture_in_flight
    }

    pub fn reduce(&mut self, action: UiAction) {
        if self.is_closed() {
            debug!("Ignoring {:?} on a closed screen", action);
            return;
        }

        match action {
            UiAction::PermissionsRequested => self.phase = ScreenPhase::AwaitingPermission,
            UiAction::PermissionsDenied(message) => {
                self.last_failure = Some(Failure {
                    kind: FailureKind::PermissionDenied,
                    message,
                });
                self.phase = ScreenPhase::Closed;
            }
            UiAction::CameraStarting => self.phase = ScreenPhase::AcquiringProvider,
            UiAction::CameraBound => {
                self.phase = ScreenPhase::Previewing;
                if matches!(
                    self.last_failure,
                    Some(Failure {
                        kind: FailureKind::CameraBindingFailure,
                        ..
                    })
                ) {
                    self.last_failure = None;
                }
            }
            UiAction::CameraBindFailed(reason) => {
                self.last_failure = Some(Failure {
                    kind: FailureKind::CameraBindingFailure,
                    message: reason.clone(),
                });
                self.phase = ScreenPhase::PreviewUnavailable { reason };
            }
            UiAction::CaptureIssued => self.capture_in_flight = true,
            UiAction::CaptureSaved => self.capture_in_flight = false,
            UiAction::CaptureFailed(message) => {
                self.capture_in_flight = false;
                self.last_failure = Some(Failure {
                    kind: FailureKind::CaptureFailure,
                    message,
                });
            }
            UiAction::ImageRouted => self.routed += 1,
            UiAction::PickIgnored => self.ignored_picks += 1,
            UiAction::Notified(message) => self.last_message = Some(message),
            UiAction::Destroyed => {
                self.capture_in_flight = false;
                self.phase = ScreenPhase::Closed;
            }
        }
    }
}
