use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

/// Permission gate failures. Denial is fatal to the screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Permissions not granted by the user: {}", missing.join(", "))]
    Denied { missing: Vec<String> },
}

/// Failures while binding use-cases to a lifecycle. Always recoverable:
/// the screen stays up with the preview unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Camera provider unavailable: {details}")]
    ProviderUnavailable { details: String },

    #[error("No camera with lens facing {lens}")]
    NoMatchingCamera { lens: String },

    #[error("{use_case} resolution {requested} not supported (max {max})")]
    UnsupportedResolution {
        use_case: String,
        requested: String,
        max: String,
    },

    #[error("Camera device busy: {details}")]
    DeviceBusy { details: String },
}

/// Still-capture failures. Recoverable; the user retries manually.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Still-capture use-case is not ready")]
    NotReady,

    #[error("A capture request is already in flight")]
    InFlight,

    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write image {path}: {details}")]
    Write { path: PathBuf, details: String },

    #[error("Camera device error: {details}")]
    Device { details: String },
}

/// Event bus failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },
}

impl SnapcamError {
    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapcamError>;
