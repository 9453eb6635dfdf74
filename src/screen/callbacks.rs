use super::state::UiAction;
use super::types::ScreenEvent;
use super::CameraScreen;
use crate::capture::CaptureOutcome;
use crate::events::SnapcamEvent;
use crate::permissions::{GateDecision, PermissionResult};
use crate::routing::{ActivityResult, NavigationPayload, SourceType};
use crate::session::BindOutcome;
use std::time::SystemTime;
use tracing::{debug, error, warn};

const PERMISSION_DENIED_MESSAGE: &str = "Permissions not granted by the user.";

impl CameraScreen {
    /// Wait for the next callback. `None` once nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<ScreenEvent> {
        if self.outstanding == 0 {
            return None;
        }
        self.callbacks_rx.recv().await
    }

    /// Deliver callbacks until none are outstanding
    pub async fn settle(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle(event);
        }
    }

    /// Apply one callback on the UI queue
    pub fn handle(&mut self, event: ScreenEvent) {
        self.outstanding = self.outstanding.saturating_sub(1);

        if self.state.is_closed() {
            debug!("Dropping {:?} delivered after close", event);
            return;
        }

        match event {
            ScreenEvent::PermissionResult(result) => self.on_permission_result(result),
            ScreenEvent::ProviderReady(provider) => {
                let sink = self.analyzer.as_ref().map(|a| a.sink());
                let outcome = self.sessions.on_provider_ready(provider, sink);
                self.on_bind_outcome(outcome);
            }
            ScreenEvent::CaptureFinished(outcome) => self.on_capture_finished(outcome),
            ScreenEvent::PickerResult(result) => self.on_picker_result(result),
        }
    }

    fn on_permission_result(&mut self, result: PermissionResult) {
        match self.gate.on_permission_result(&result) {
            GateDecision::StartCamera => self.start_camera(),
            GateDecision::AlreadyStarted => debug!("Camera already started"),
            GateDecision::Ignored => {}
            GateDecision::Denied(e) => {
                let missing = match &e {
                    crate::error::PermissionError::Denied { missing } => missing.clone(),
                };
                self.notify(PERMISSION_DENIED_MESSAGE.to_string());
                self.publish(SnapcamEvent::PermissionsDenied { missing });
                self.reduce(UiAction::PermissionsDenied(e.to_string()));
                self.close("permissions denied");
            }
        }
    }

    fn on_bind_outcome(&mut self, outcome: BindOutcome) {
        match outcome {
            BindOutcome::Bound(session) => {
                self.publish(SnapcamEvent::CameraBound {
                    camera_id: session.camera.camera_id.clone(),
                    lens_facing: session.camera.lens_facing.to_string(),
                    use_cases: session.camera.bound.iter().map(|k| k.to_string()).collect(),
                });
                self.session = Some(session);
                self.reduce(UiAction::CameraBound);
            }
            BindOutcome::Failed(e) => {
                warn!("Preview unavailable: {}", e);
                self.session = None;
                self.publish(SnapcamEvent::CameraBindFailed {
                    reason: e.to_string(),
                });
                self.reduce(UiAction::CameraBindFailed(e.to_string()));
            }
        }
    }

    fn on_capture_finished(&mut self, outcome: CaptureOutcome) {
        // Frees the coordinator in step with the UI state
        match outcome.into_result() {
            Ok(image) => {
                self.notify(format!("Photo capture succeeded: {}", image.uri));
                self.publish(SnapcamEvent::CaptureSaved {
                    uri: image.uri.clone(),
                    timestamp: SystemTime::now(),
                });
                self.reduce(UiAction::CaptureSaved);

                let navigation = self.router.route_uri(image.uri, SourceType::Captured);
                self.on_routed(navigation);
            }
            Err(e) => {
                error!("Photo capture failed: {}", e);
                self.publish(SnapcamEvent::CaptureFailed {
                    error: e.to_string(),
                });
                self.reduce(UiAction::CaptureFailed(e.to_string()));
            }
        }
    }

    fn on_picker_result(&mut self, result: ActivityResult) {
        let request_code = result.request_code;
        let result_code = result.result_code.code();
        match self.router.on_activity_result(result) {
            Some(navigation) => self.on_routed(navigation),
            None => {
                self.publish(SnapcamEvent::PickIgnored {
                    request_code,
                    result_code,
                });
                self.reduce(UiAction::PickIgnored);
            }
        }
    }

    fn on_routed(&mut self, navigation: NavigationPayload) {
        let routing = &self.config.routing;
        self.publish(SnapcamEvent::ImageRouted {
            uri: navigation
                .get_string(&routing.extra_message)
                .unwrap_or_default()
                .to_string(),
            source_type: navigation.get_int(&routing.extra_type).unwrap_or(-1),
            target: navigation.target.clone(),
        });
        self.reduce(UiAction::ImageRouted);
    }
}
