mod manager;
mod use_cases;

pub use manager::{
    BindOutcome, CameraSession, CameraSessionManager, ProviderAcquisition, SessionState,
};
pub use use_cases::{
    CameraHandle, CameraInfo, CameraSelector, ImageAnalysis, ImageAnalysisBuilder, ImageCapture,
    ImageCaptureBuilder, LensFacing, LifecycleId, Preview, PreviewBuilder, Resolution,
    SurfaceProvider, UseCase, UseCaseKind,
};
pub(crate) use use_cases::format_resolution;
