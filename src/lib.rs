pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod permissions;
pub mod platform;
pub mod routing;
pub mod screen;
pub mod session;

pub use analysis::{Analyzer, AnalyzerExecutor, BackpressureStrategy, FrameCounter};
pub use capture::{CaptureCoordinator, CapturedImage, PendingCapture};
pub use config::SnapcamConfig;
pub use error::{BindError, CaptureError, PermissionError, Result, SnapcamError};
pub use events::{EventBus, SnapcamEvent};
pub use frame::{FrameData, FrameFormat};
pub use permissions::{Permission, PermissionGate, PermissionResult};
pub use platform::{PlatformServices, SimulatedPlatform};
pub use routing::{ActivityResult, NavigationPayload, ResultPayload, ResultRouter, SourceType};
pub use screen::{CameraScreen, ScreenPhase, UiState};
pub use session::{BindOutcome, CameraSession, CameraSessionManager, LensFacing};
