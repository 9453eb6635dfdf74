use crate::analysis::{AnalysisSink, BackpressureStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Target resolution (width, height)
pub type Resolution = (u32, u32);

pub(crate) fn format_resolution(resolution: Resolution) -> String {
    format!("{}x{}", resolution.0, resolution.1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    Front,
    Back,
    External,
}

impl fmt::Display for LensFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LensFacing::Front => "front",
            LensFacing::Back => "back",
            LensFacing::External => "external",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LensFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(LensFacing::Front),
            "back" => Ok(LensFacing::Back),
            "external" => Ok(LensFacing::External),
            other => Err(format!("unknown lens facing '{}'", other)),
        }
    }
}

/// Physical camera as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    pub id: String,
    pub lens_facing: LensFacing,
    pub max_resolution: Resolution,
}

impl CameraInfo {
    /// Whether a target resolution fits the sensor in either orientation
    pub fn supports(&self, resolution: Resolution) -> bool {
        let (w, h) = resolution;
        let (max_w, max_h) = self.max_resolution;
        (w <= max_w && h <= max_h) || (w <= max_h && h <= max_w)
    }
}

/// Fixed lens-facing preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelector {
    pub lens_facing: LensFacing,
}

impl CameraSelector {
    pub fn require_lens_facing(lens_facing: LensFacing) -> Self {
        Self { lens_facing }
    }

    /// First camera matching the preference
    pub fn select<'a>(&self, cameras: &'a [CameraInfo]) -> Option<&'a CameraInfo> {
        cameras.iter().find(|c| c.lens_facing == self.lens_facing)
    }
}

/// Identity of the lifecycle owner use-cases are bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LifecycleId(Uuid);

impl LifecycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LifecycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LifecycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display view surface a preview renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceProvider(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UseCaseKind {
    Preview,
    ImageCapture,
    ImageAnalysis,
}

impl fmt::Display for UseCaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UseCaseKind::Preview => "preview",
            UseCaseKind::ImageCapture => "image capture",
            UseCaseKind::ImageAnalysis => "image analysis",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Preview {
    id: Uuid,
    target_resolution: Resolution,
    surface: Option<SurfaceProvider>,
}

impl Preview {
    pub fn builder() -> PreviewBuilder {
        PreviewBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_resolution(&self) -> Resolution {
        self.target_resolution
    }

    pub fn set_surface_provider(&mut self, surface: SurfaceProvider) {
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<&SurfaceProvider> {
        self.surface.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct PreviewBuilder {
    target_resolution: Option<Resolution>,
}

impl PreviewBuilder {
    pub fn target_resolution(mut self, resolution: Resolution) -> Self {
        self.target_resolution = Some(resolution);
        self
    }

    pub fn build(self) -> Preview {
        Preview {
            id: Uuid::new_v4(),
            target_resolution: self.target_resolution.unwrap_or((640, 480)),
            surface: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageCapture {
    id: Uuid,
    target_resolution: Resolution,
}

impl ImageCapture {
    pub fn builder() -> ImageCaptureBuilder {
        ImageCaptureBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_resolution(&self) -> Resolution {
        self.target_resolution
    }
}

#[derive(Debug, Default)]
pub struct ImageCaptureBuilder {
    target_resolution: Option<Resolution>,
}

impl ImageCaptureBuilder {
    pub fn target_resolution(mut self, resolution: Resolution) -> Self {
        self.target_resolution = Some(resolution);
        self
    }

    pub fn build(self) -> ImageCapture {
        ImageCapture {
            id: Uuid::new_v4(),
            target_resolution: self.target_resolution.unwrap_or((640, 480)),
        }
    }
}

#[derive(Clone)]
pub struct ImageAnalysis {
    id: Uuid,
    target_resolution: Resolution,
    backpressure: BackpressureStrategy,
    analyzer: Option<AnalysisSink>,
}

impl fmt::Debug for ImageAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAnalysis")
            .field("id", &self.id)
            .field("target_resolution", &self.target_resolution)
            .field("backpressure", &self.backpressure)
            .field("has_analyzer", &self.analyzer.is_some())
            .finish()
    }
}

impl ImageAnalysis {
    pub fn builder() -> ImageAnalysisBuilder {
        ImageAnalysisBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_resolution(&self) -> Resolution {
        self.target_resolution
    }

    pub fn backpressure(&self) -> BackpressureStrategy {
        self.backpressure
    }

    /// Attach the analyzer running on its dedicated executor
    pub fn set_analyzer(&mut self, sink: AnalysisSink) {
        self.analyzer = Some(sink);
    }

    pub fn analyzer(&self) -> Option<&AnalysisSink> {
        self.analyzer.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct ImageAnalysisBuilder {
    target_resolution: Option<Resolution>,
    backpressure: Option<BackpressureStrategy>,
}

impl ImageAnalysisBuilder {
    pub fn target_resolution(mut self, resolution: Resolution) -> Self {
        self.target_resolution = Some(resolution);
        self
    }

    pub fn backpressure_strategy(mut self, strategy: BackpressureStrategy) -> Self {
        self.backpressure = Some(strategy);
        self
    }

    pub fn build(self) -> ImageAnalysis {
        ImageAnalysis {
            id: Uuid::new_v4(),
            target_resolution: self.target_resolution.unwrap_or((640, 480)),
            backpressure: self
                .backpressure
                .unwrap_or(BackpressureStrategy::KeepOnlyLatest),
            analyzer: None,
        }
    }
}

/// Any use-case handed to the provider for binding
#[derive(Debug, Clone)]
pub enum UseCase {
    Preview(Preview),
    ImageCapture(ImageCapture),
    ImageAnalysis(ImageAnalysis),
}

impl UseCase {
    pub fn kind(&self) -> UseCaseKind {
        match self {
            UseCase::Preview(_) => UseCaseKind::Preview,
            UseCase::ImageCapture(_) => UseCaseKind::ImageCapture,
            UseCase::ImageAnalysis(_) => UseCaseKind::ImageAnalysis,
        }
    }

    pub fn target_resolution(&self) -> Resolution {
        match self {
            UseCase::Preview(p) => p.target_resolution(),
            UseCase::ImageCapture(c) => c.target_resolution(),
            UseCase::ImageAnalysis(a) => a.target_resolution(),
        }
    }
}

/// A camera with use-cases bound to one lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraHandle {
    pub camera_id: String,
    pub lens_facing: LensFacing,
    pub lifecycle: LifecycleId,
    pub bound: Vec<UseCaseKind>,
}
