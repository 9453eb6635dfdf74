mod callbacks;
mod controller;
mod lifecycle;
mod state;
mod types;


pub use controller::CameraScreen;
pub use state::{Failure, FailureKind, ScreenPhase, UiAction, UiState};
pub use types::ScreenEvent;
