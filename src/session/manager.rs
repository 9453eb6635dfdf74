use super::use_cases::{
    format_resolution, CameraHandle, CameraSelector, ImageAnalysis, ImageCapture, LifecycleId,
    Preview, UseCase, UseCaseKind,
};
use crate::analysis::AnalysisSink;
use crate::config::CameraConfig;
use crate::error::BindError;
use crate::platform::{CameraProvider, ProviderSource, ScreenHost};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Session manager lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    AcquiringProvider,
    UseCasesBuilt,
    Bound,
}

/// The live use-cases and the camera they are bound to.
///
/// Exactly one exists per screen lifecycle; every rebind replaces it.
#[derive(Clone)]
pub struct CameraSession {
    pub preview: Preview,
    pub image_capture: ImageCapture,
    pub image_analysis: ImageAnalysis,
    pub camera: CameraHandle,
    provider: Arc<dyn CameraProvider>,
}

impl CameraSession {
    pub fn provider(&self) -> Arc<dyn CameraProvider> {
        Arc::clone(&self.provider)
    }

    pub fn is_bound(&self, kind: UseCaseKind) -> bool {
        self.camera.bound.contains(&kind)
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("preview", &self.preview)
            .field("image_capture", &self.image_capture)
            .field("image_analysis", &self.image_analysis)
            .field("camera", &self.camera)
            .finish()
    }
}

/// Result of a bind attempt
#[derive(Debug)]
pub enum BindOutcome {
    Bound(CameraSession),
    Failed(BindError),
}

/// In-flight provider request; resolves once
pub struct ProviderAcquisition {
    source: Arc<dyn ProviderSource>,
}

impl ProviderAcquisition {
    pub async fn resolve(self) -> Result<Arc<dyn CameraProvider>, BindError> {
        self.source.acquire().await
    }
}

/// Acquires the camera provider and binds use-cases to one lifecycle
pub struct CameraSessionManager {
    config: CameraConfig,
    lifecycle: LifecycleId,
    host: Arc<dyn ScreenHost>,
    state: SessionState,
    provider: Option<Arc<dyn CameraProvider>>,
    last_error: Option<BindError>,
}

impl CameraSessionManager {
    pub fn new(config: CameraConfig, lifecycle: LifecycleId, host: Arc<dyn ScreenHost>) -> Self {
        Self {
            config,
            lifecycle,
            host,
            state: SessionState::Unbound,
            provider: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lifecycle(&self) -> LifecycleId {
        self.lifecycle
    }

    pub fn last_error(&self) -> Option<&BindError> {
        self.last_error.as_ref()
    }

    pub fn selector(&self) -> CameraSelector {
        CameraSelector::require_lens_facing(self.config.lens_facing)
    }

    /// Start acquiring the provider. The returned future owns its inputs so
    /// it can run on a separate task.
    pub fn begin_acquire(&mut self, source: Arc<dyn ProviderSource>) -> ProviderAcquisition {
        debug!("Requesting camera provider");
        self.state = SessionState::AcquiringProvider;
        ProviderAcquisition { source }
    }

    /// Acquire the provider and bind in one go
    pub async fn start_camera(
        &mut self,
        source: Arc<dyn ProviderSource>,
        analyzer: Option<AnalysisSink>,
    ) -> BindOutcome {
        let acquisition = self.begin_acquire(source);
        let provider = acquisition.resolve().await;
        self.on_provider_ready(provider, analyzer)
    }

    /// Build the three use-cases from configuration
    pub fn build_use_cases(
        &self,
        analyzer: Option<AnalysisSink>,
    ) -> (Preview, ImageCapture, ImageAnalysis) {
        let preview = Preview::builder()
            .target_resolution(self.config.preview_resolution)
            .build();

        let image_capture = ImageCapture::builder()
            .target_resolution(self.config.capture_resolution)
            .build();

        let mut image_analysis = ImageAnalysis::builder()
            .backpressure_strategy(self.config.backpressure)
            .target_resolution(self.config.analysis_resolution)
            .build();
        if let Some(sink) = analyzer {
            image_analysis.set_analyzer(sink);
        }

        (preview, image_capture, image_analysis)
    }

    /// Continuation of the provider future, run on the UI queue
    pub fn on_provider_ready(
        &mut self,
        provider: Result<Arc<dyn CameraProvider>, BindError>,
        analyzer: Option<AnalysisSink>,
    ) -> BindOutcome {
        let provider = match provider {
            Ok(provider) => provider,
            Err(e) => {
                error!("Camera provider acquisition failed: {}", e);
                return self.fail(e);
            }
        };
        self.provider = Some(Arc::clone(&provider));

        let (mut preview, image_capture, image_analysis) = self.build_use_cases(analyzer);
        self.state = SessionState::UseCasesBuilt;

        let selector = self.selector();

        provider.unbind_all();

        preview.set_surface_provider(self.host.surface_provider());

        let mut use_cases = vec![
            UseCase::Preview(preview.clone()),
            UseCase::ImageCapture(image_capture.clone()),
        ];
        if self.config.bind_analysis {
            use_cases.push(UseCase::ImageAnalysis(image_analysis.clone()));
        }

        debug!(
            "Binding {} use-cases to lifecycle {} (preview {}, capture {})",
            use_cases.len(),
            self.lifecycle,
            format_resolution(preview.target_resolution()),
            format_resolution(image_capture.target_resolution())
        );

        match provider.bind_to_lifecycle(self.lifecycle, &selector, &use_cases) {
            Ok(camera) => {
                info!(
                    "Bound {:?} to {} camera {}",
                    camera.bound, camera.lens_facing, camera.camera_id
                );
                self.state = SessionState::Bound;
                self.last_error = None;
                BindOutcome::Bound(CameraSession {
                    preview,
                    image_capture,
                    image_analysis,
                    camera,
                    provider,
                })
            }
            Err(e) => {
                error!("Use case binding failed: {}", e);
                provider.unbind_all();
                self.fail(e)
            }
        }
    }

    /// Unbind everything; called when the lifecycle is destroyed
    pub fn release(&mut self) {
        if let Some(provider) = self.provider.take() {
            provider.unbind_all();
            info!("Released camera use-cases for lifecycle {}", self.lifecycle);
        } else if self.state == SessionState::AcquiringProvider {
            warn!("Lifecycle destroyed while the camera provider was still pending");
        }
        self.state = SessionState::Unbound;
    }

    fn fail(&mut self, error: BindError) -> BindOutcome {
        self.state = SessionState::Unbound;
        self.last_error = Some(error.clone());
        BindOutcome::Failed(error)
    }
}
