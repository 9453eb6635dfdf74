use super::state::UiAction;
use super::types::ScreenEvent;
use super::CameraScreen;
use crate::analysis::AnalyzerExecutor;
use crate::error::{CaptureError, Result};
use crate::events::SnapcamEvent;
use crate::permissions::GateStep;
use std::sync::Arc;
use tracing::{debug, info};

impl CameraScreen {
    /// Screen created: start the analyzer executor, then either start the
    /// camera or ask for the missing permissions.
    pub fn on_create(&mut self) -> Result<()> {
        info!("Camera screen created");

        if self.analyzer.is_none() {
            self.analyzer = Some(AnalyzerExecutor::spawn(
                self.config.camera.backpressure,
                self.frame_counter.clone(),
            )?);
        }

        match self.gate.on_create() {
            GateStep::StartCamera => self.start_camera(),
            GateStep::Request(missing) => {
                self.publish(SnapcamEvent::PermissionsRequested {
                    permissions: missing.iter().map(|p| p.to_string()).collect(),
                });
                self.reduce(UiAction::PermissionsRequested);
                let request = self.gate.request_missing();
                self.spawn_callback(async move {
                    ScreenEvent::PermissionResult(request.send().await)
                });
            }
            GateStep::AlreadyStarted => debug!("Camera already started for this screen"),
        }
        Ok(())
    }

    /// Ask for the camera provider; binding continues in `handle`
    pub(super) fn start_camera(&mut self) {
        self.reduce(UiAction::CameraStarting);
        let acquisition = self
            .sessions
            .begin_acquire(Arc::clone(&self.platform.cameras));
        self.spawn_callback(async move { ScreenEvent::ProviderReady(acquisition.resolve().await) });
    }

    /// Capture button. No-op until a session exists; rejected while an
    /// earlier capture is pending.
    pub fn on_capture_clicked(&mut self) -> std::result::Result<(), CaptureError> {
        if self.state.is_closed() {
            return Err(CaptureError::NotReady);
        }

        let pending = match self.coordinator.begin(self.session.as_ref()) {
            Ok(pending) => pending,
            Err(e) => {
                debug!("Capture not issued: {}", e);
                return Err(e);
            }
        };

        self.publish(SnapcamEvent::CaptureStarted {
            path: pending.path().display().to_string(),
        });
        self.reduce(UiAction::CaptureIssued);
        self.spawn_callback(async move { ScreenEvent::CaptureFinished(pending.complete().await) });
        Ok(())
    }

    /// Gallery button: launch the picker for a result
    pub fn on_gallery_clicked(&mut self) {
        if self.state.is_closed() {
            return;
        }
        let request = self.router.open_gallery(Arc::clone(&self.platform.picker));
        self.spawn_callback(async move { ScreenEvent::PickerResult(request.send().await) });
    }

    /// Lifecycle destroyed: drop pending callbacks, unbind and stop the analyzer
    pub fn on_destroy(&mut self) {
        if self.state.is_closed() && self.analyzer.is_none() {
            return;
        }
        info!("Camera screen destroyed");
        self.teardown();
        self.reduce(UiAction::Destroyed);
    }

    /// Close the screen from inside (permission denial)
    pub(super) fn close(&mut self, reason: &str) {
        self.platform.host.finish();
        self.publish(SnapcamEvent::ScreenClosed {
            reason: reason.to_string(),
        });
        self.teardown();
    }

    fn teardown(&mut self) {
        self.cancellation_token.cancel();
        self.outstanding = 0;
        // Queued callbacks still hold resources such as the in-flight slot
        while let Ok(event) = self.callbacks_rx.try_recv() {
            debug!("Discarding {:?} on teardown", event);
        }
        self.sessions.release();
        self.session = None;
        if let Some(mut analyzer) = self.analyzer.take() {
            analyzer.shutdown();
        }
    }
}
