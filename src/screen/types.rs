use crate::capture::CaptureOutcome;
use crate::error::BindError;
use crate::permissions::PermissionResult;
use crate::platform::CameraProvider;
use crate::routing::ActivityResult;
use std::fmt;
use std::sync::Arc;

/// One-shot platform callbacks, delivered to the screen's UI queue
pub enum ScreenEvent {
    PermissionResult(PermissionResult),
    ProviderReady(Result<Arc<dyn CameraProvider>, BindError>),
    /// Holds the coordinator busy until the screen handles it
    CaptureFinished(CaptureOutcome),
    PickerResult(ActivityResult),
}

impl fmt::Debug for ScreenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenEvent::PermissionResult(r) => f.debug_tuple("PermissionResult").field(r).finish(),
            ScreenEvent::ProviderReady(Ok(_)) => f.write_str("ProviderReady(Ok(..))"),
            ScreenEvent::ProviderReady(Err(e)) => {
                f.debug_tuple("ProviderReady").field(&Err::<(), _>(e)).finish()
            }
            ScreenEvent::CaptureFinished(o) => {
                f.debug_tuple("CaptureFinished").field(o.result()).finish()
            }
            ScreenEvent::PickerResult(r) => f.debug_tuple("PickerResult").field(r).finish(),
        }
    }
}
