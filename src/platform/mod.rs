//! Seams to the host platform: permission authority, camera framework,
//! gallery picker, downstream navigation and the screen surface.
//!
//! Every asynchronous method resolves at most once. The screen controller
//! runs each one on its own task and feeds the single result back onto the
//! UI queue.

mod sim;
#[cfg(test)]
mod tests;

pub use sim::{PickerScript, SimulatedPlatform, SimulatedPlatformBuilder};

use crate::capture::{OutputFileOptions, OutputFileResults};
use crate::error::{BindError, CaptureError};
use crate::permissions::{Permission, PermissionResult};
use crate::routing::{ActivityResult, NavigationPayload};
use crate::session::{
    CameraHandle, CameraInfo, CameraSelector, ImageCapture, LifecycleId, SurfaceProvider,
    UseCase, UseCaseKind,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OS permission authority
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Current grant state of one permission
    fn check(&self, permission: Permission) -> bool;

    /// Show the permission dialog. Resolves once with the user's answer.
    async fn request(&self, request_code: i32, permissions: Vec<Permission>) -> PermissionResult;
}

/// Source of the process-wide camera provider
#[async_trait]
pub trait ProviderSource: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn CameraProvider>, BindError>;
}

/// Camera provider: binds use-cases to lifecycles and services captures
#[async_trait]
pub trait CameraProvider: Send + Sync {
    fn available_cameras(&self) -> Vec<CameraInfo>;

    /// Unbind every use-case from every lifecycle. Safe when nothing is bound.
    fn unbind_all(&self);

    /// Bind all of `use_cases` or none of them.
    fn bind_to_lifecycle(
        &self,
        lifecycle: LifecycleId,
        selector: &CameraSelector,
        use_cases: &[UseCase],
    ) -> Result<CameraHandle, BindError>;

    fn bound_use_cases(&self) -> Vec<UseCaseKind>;

    /// Persist one frame from a bound still-capture use-case
    async fn take_picture(
        &self,
        capture: &ImageCapture,
        options: OutputFileOptions,
    ) -> Result<OutputFileResults, CaptureError>;
}

/// External image-selection screen
#[async_trait]
pub trait GalleryPicker: Send + Sync {
    async fn pick(&self, request_code: i32) -> ActivityResult;
}

/// Downstream drawing/annotation screen launcher. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn start(&self, payload: NavigationPayload);
}

/// The hosting screen: transient messages, closing, preview surface
pub trait ScreenHost: Send + Sync {
    fn show_message(&self, text: &str);
    fn finish(&self);
    fn surface_provider(&self) -> SurfaceProvider;
}

/// Bundle of platform collaborators handed to the screen controller
#[derive(Clone)]
pub struct PlatformServices {
    pub permissions: Arc<dyn PermissionAuthority>,
    pub cameras: Arc<dyn ProviderSource>,
    pub picker: Arc<dyn GalleryPicker>,
    pub navigator: Arc<dyn Navigator>,
    pub host: Arc<dyn ScreenHost>,
}

impl PlatformServices {
    /// Use one object for every seam
    pub fn from_shared<P>(platform: Arc<P>) -> Self
    where
        P: PermissionAuthority + ProviderSource + GalleryPicker + Navigator + ScreenHost + 'static,
    {
        Self {
            permissions: platform.clone(),
            cameras: platform.clone(),
            picker: platform.clone(),
            navigator: platform.clone(),
            host: platform,
        }
    }
}
