use super::state::{UiAction, UiState};
use super::types::ScreenEvent;
use crate::analysis::{AnalysisStats, AnalyzerExecutor, FrameCounter};
use crate::capture::{
    resolve_output_directory, resolve_timestamp_zone, CaptureCoordinator, Clock, SystemClock,
};
use crate::config::SnapcamConfig;
use crate::error::Result;
use crate::events::{EventBus, SnapcamEvent};
use crate::permissions::PermissionGate;
use crate::platform::PlatformServices;
use crate::routing::ResultRouter;
use crate::session::{CameraSession, CameraSessionManager, LifecycleId};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Controller for one camera screen lifecycle.
///
/// Owns the permission gate, the session manager and the single
/// [`CameraSession`], the capture coordinator, the result router and the
/// analyzer executor. Platform callbacks run on spawned tasks and come back
/// as [`ScreenEvent`]s on one queue; only [`CameraScreen::handle`] mutates
/// session state.
pub struct CameraScreen {
    pub(super) config: SnapcamConfig,
    pub(super) platform: PlatformServices,
    pub(super) gate: PermissionGate,
    pub(super) sessions: CameraSessionManager,
    pub(super) session: Option<CameraSession>,
    pub(super) coordinator: CaptureCoordinator,
    pub(super) router: ResultRouter,
    pub(super) analyzer: Option<AnalyzerExecutor>,
    pub(super) frame_counter: FrameCounter,
    pub(super) state: UiState,
    pub(super) events: Arc<EventBus>,

    // UI queue
    pub(super) callbacks_tx: mpsc::UnboundedSender<ScreenEvent>,
    pub(super) callbacks_rx: mpsc::UnboundedReceiver<ScreenEvent>,
    pub(super) outstanding: usize,
    pub(super) cancellation_token: CancellationToken,
}

impl CameraScreen {
    /// Create a screen that timestamps captures with the system clock
    pub fn new(config: SnapcamConfig, platform: PlatformServices) -> Result<Self> {
        Self::with_clock(config, platform, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SnapcamConfig,
        platform: PlatformServices,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let lifecycle = LifecycleId::new();
        debug!("Creating camera screen with lifecycle {}", lifecycle);

        let output_dir = resolve_output_directory(&config.capture)?;
        let zone = resolve_timestamp_zone(&config.capture.timezone);

        let gate = PermissionGate::new(
            config.permissions.required.clone(),
            config.permissions.request_code,
            Arc::clone(&platform.permissions),
        );
        let sessions = CameraSessionManager::new(
            config.camera.clone(),
            lifecycle,
            Arc::clone(&platform.host),
        );
        let coordinator = CaptureCoordinator::new(output_dir, zone, clock);
        let router = ResultRouter::new(config.routing.clone(), Arc::clone(&platform.navigator));
        let (callbacks_tx, callbacks_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            platform,
            gate,
            sessions,
            session: None,
            coordinator,
            router,
            analyzer: None,
            frame_counter: FrameCounter::new(),
            state: UiState::default(),
            events: Arc::new(EventBus::default()),
            callbacks_tx,
            callbacks_rx,
            outstanding: 0,
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &SnapcamConfig {
        &self.config
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn output_dir(&self) -> &Path {
        self.coordinator.output_dir()
    }

    pub fn is_capture_in_flight(&self) -> bool {
        self.coordinator.is_in_flight()
    }

    /// Frames seen by the pass-through analyzer
    pub fn analyzed_frames(&self) -> u64 {
        self.frame_counter.count()
    }

    pub fn analysis_stats(&self) -> Option<Arc<AnalysisStats>> {
        self.analyzer.as_ref().map(AnalyzerExecutor::stats)
    }

    /// Number of one-shot callbacks not yet delivered
    pub fn outstanding_callbacks(&self) -> usize {
        self.outstanding
    }

    pub(super) fn reduce(&mut self, action: UiAction) {
        self.state.reduce(action);
    }

    pub(super) fn publish(&self, event: SnapcamEvent) {
        // No subscribers is normal
        let _ = self.events.publish(event);
    }

    pub(super) fn notify(&mut self, text: String) {
        self.platform.host.show_message(&text);
        self.reduce(UiAction::Notified(text));
    }

    /// Run a one-shot platform call on its own task and deliver its single
    /// result to the UI queue. Dropped without delivery once the screen is
    /// destroyed.
    pub(super) fn spawn_callback<F>(&mut self, callback: F)
    where
        F: Future<Output = ScreenEvent> + Send + 'static,
    {
        self.outstanding += 1;
        let tx = self.callbacks_tx.clone();
        let cancel = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                event = callback => {
                    let _ = tx.send(event);
                }
            }
        });
    }
}
