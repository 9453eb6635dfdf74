use super::{
    CameraProvider, GalleryPicker, Navigator, PermissionAuthority, ProviderSource, ScreenHost,
};
use crate::analysis::SubmitOutcome;
use crate::capture::{OutputFileOptions, OutputFileResults};
use crate::error::{BindError, CaptureError};
use crate::frame::{FrameData, FrameFormat};
use crate::permissions::{Permission, PermissionResult};
use crate::routing::{ActivityResult, NavigationPayload, ResultCode};
use crate::session::{
    format_resolution, CameraHandle, CameraInfo, CameraSelector, ImageCapture, LensFacing,
    LifecycleId, Resolution, SurfaceProvider, UseCase, UseCaseKind,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Scripted answer of the gallery picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerScript {
    Pick(String),
    Cancel,
    Fail(i32),
}

#[derive(Debug, Clone)]
struct Binding {
    lifecycle: LifecycleId,
    camera_id: String,
    use_cases: Vec<UseCase>,
}

struct SimState {
    granted: BTreeSet<Permission>,
    dialog_answers: BTreeMap<Permission, bool>,
    cameras: Vec<CameraInfo>,
    provider_available: bool,
    device_busy: bool,
    bindings: Vec<Binding>,
    capture_failure: Option<String>,
    picker: PickerScript,
    surface_attached: bool,
}

struct SimShared {
    state: Mutex<SimState>,
    provider_delay: Duration,
    capture_delay: Duration,
    dialog_delay: Duration,
    navigations: Mutex<Vec<NavigationPayload>>,
    messages: Mutex<Vec<String>>,
    finished: AtomicBool,
    permission_requests: AtomicU64,
    bind_attempts: AtomicU64,
    captures_taken: AtomicU64,
    frame_counter: AtomicU64,
}

/// In-process implementation of every platform seam.
///
/// Captures are real JPEG files (a gradient at the capture resolution).
/// Binding validates every use-case before committing anything.
#[derive(Clone)]
pub struct SimulatedPlatform {
    shared: Arc<SimShared>,
}

impl SimulatedPlatform {
    pub fn builder() -> SimulatedPlatformBuilder {
        SimulatedPlatformBuilder::default()
    }

    pub fn navigations(&self) -> Vec<NavigationPayload> {
        self.shared.navigations.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.shared.messages.lock().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }

    pub fn permission_requests(&self) -> u64 {
        self.shared.permission_requests.load(Ordering::SeqCst)
    }

    pub fn bind_attempts(&self) -> u64 {
        self.shared.bind_attempts.load(Ordering::SeqCst)
    }

    pub fn captures_taken(&self) -> u64 {
        self.shared.captures_taken.load(Ordering::SeqCst)
    }

    pub fn surface_attached(&self) -> bool {
        self.shared.state.lock().surface_attached
    }

    pub fn granted(&self) -> BTreeSet<Permission> {
        self.shared.state.lock().granted.clone()
    }

    pub fn set_capture_failure(&self, failure: Option<String>) {
        self.shared.state.lock().capture_failure = failure;
    }

    pub fn set_picker(&self, script: PickerScript) {
        self.shared.state.lock().picker = script;
    }

    pub fn set_device_busy(&self, busy: bool) {
        self.shared.state.lock().device_busy = busy;
    }

    /// Feed `count` frames to every bound analysis use-case.
    ///
    /// Blocks the calling thread when the analyzer applies backpressure;
    /// call from a plain thread, not from an async task.
    pub fn emit_frames(&self, count: usize) -> Vec<SubmitOutcome> {
        let sinks: Vec<_> = {
            let state = self.shared.state.lock();
            state
                .bindings
                .iter()
                .flat_map(|b| b.use_cases.iter())
                .filter_map(|u| match u {
                    UseCase::ImageAnalysis(a) => a
                        .analyzer()
                        .cloned()
                        .map(|sink| (sink, a.target_resolution())),
                    _ => None,
                })
                .collect()
        };

        let mut outcomes = Vec::with_capacity(count * sinks.len());
        for _ in 0..count {
            for (sink, (width, height)) in &sinks {
                let id = self.shared.frame_counter.fetch_add(1, Ordering::Relaxed);
                let len = FrameFormat::Yuv420.frame_len(*width, *height);
                let frame = FrameData::new(
                    id,
                    SystemTime::now(),
                    vec![(id % 256) as u8; len],
                    *width,
                    *height,
                    FrameFormat::Yuv420,
                );
                outcomes.push(sink.submit(frame));
            }
        }
        outcomes
    }
}

#[async_trait]
impl PermissionAuthority for SimulatedPlatform {
    fn check(&self, permission: Permission) -> bool {
        self.shared.state.lock().granted.contains(&permission)
    }

    async fn request(&self, request_code: i32, permissions: Vec<Permission>) -> PermissionResult {
        self.shared.permission_requests.fetch_add(1, Ordering::SeqCst);
        if !self.shared.dialog_delay.is_zero() {
            tokio::time::sleep(self.shared.dialog_delay).await;
        }

        let mut state = self.shared.state.lock();
        let mut grants = BTreeMap::new();
        for permission in permissions {
            let answer = state
                .dialog_answers
                .get(&permission)
                .copied()
                .unwrap_or(true);
            if answer {
                state.granted.insert(permission);
            }
            grants.insert(permission, answer);
        }
        debug!("Simulated permission dialog answered {:?}", grants);
        PermissionResult {
            request_code,
            grants,
        }
    }
}

#[async_trait]
impl ProviderSource for SimulatedPlatform {
    async fn acquire(&self) -> Result<Arc<dyn CameraProvider>, BindError> {
        if !self.shared.provider_delay.is_zero() {
            tokio::time::sleep(self.shared.provider_delay).await;
        }
        if !self.shared.state.lock().provider_available {
            return Err(BindError::ProviderUnavailable {
                details: "camera service not running".to_string(),
            });
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl CameraProvider for SimulatedPlatform {
    fn available_cameras(&self) -> Vec<CameraInfo> {
        self.shared.state.lock().cameras.clone()
    }

    fn unbind_all(&self) {
        let mut state = self.shared.state.lock();
        for binding in &state.bindings {
            debug!(
                "Unbinding {} use-cases from simulated camera {}",
                binding.use_cases.len(),
                binding.camera_id
            );
        }
        state.bindings.clear();
        state.surface_attached = false;
    }

    fn bind_to_lifecycle(
        &self,
        lifecycle: LifecycleId,
        selector: &CameraSelector,
        use_cases: &[UseCase],
    ) -> Result<CameraHandle, BindError> {
        self.shared.bind_attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.shared.state.lock();

        if state.device_busy {
            return Err(BindError::DeviceBusy {
                details: "camera in use by another client".to_string(),
            });
        }

        let camera = selector
            .select(&state.cameras)
            .cloned()
            .ok_or_else(|| BindError::NoMatchingCamera {
                lens: selector.lens_facing.to_string(),
            })?;

        if state.bindings.iter().any(|b| b.lifecycle != lifecycle) {
            return Err(BindError::DeviceBusy {
                details: "camera bound to another lifecycle".to_string(),
            });
        }

        for use_case in use_cases {
            if !camera.supports(use_case.target_resolution()) {
                return Err(BindError::UnsupportedResolution {
                    use_case: use_case.kind().to_string(),
                    requested: format_resolution(use_case.target_resolution()),
                    max: format_resolution(camera.max_resolution),
                });
            }
        }

        let surface_attached = use_cases.iter().any(|u| match u {
            UseCase::Preview(p) => p.surface().is_some(),
            _ => false,
        });

        state.bindings.push(Binding {
            lifecycle,
            camera_id: camera.id.clone(),
            use_cases: use_cases.to_vec(),
        });
        state.surface_attached |= surface_attached;

        let bound: Vec<UseCaseKind> = use_cases.iter().map(UseCase::kind).collect();
        info!(
            "Simulated camera {} bound {:?} for lifecycle {}",
            camera.id, bound, lifecycle
        );

        Ok(CameraHandle {
            camera_id: camera.id,
            lens_facing: camera.lens_facing,
            lifecycle,
            bound,
        })
    }

    fn bound_use_cases(&self) -> Vec<UseCaseKind> {
        let state = self.shared.state.lock();
        let mut kinds: Vec<UseCaseKind> = state
            .bindings
            .iter()
            .flat_map(|b| b.use_cases.iter().map(UseCase::kind))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    async fn take_picture(
        &self,
        capture: &ImageCapture,
        options: OutputFileOptions,
    ) -> Result<OutputFileResults, CaptureError> {
        let failure = {
            let state = self.shared.state.lock();
            let bound = state.bindings.iter().any(|b| {
                b.use_cases.iter().any(|u| match u {
                    UseCase::ImageCapture(c) => c.id() == capture.id(),
                    _ => false,
                })
            });
            if !bound {
                return Err(CaptureError::Device {
                    details: "image capture use-case is not bound".to_string(),
                });
            }
            state.capture_failure.clone()
        };

        if !self.shared.capture_delay.is_zero() {
            tokio::time::sleep(self.shared.capture_delay).await;
        }

        if let Some(details) = failure {
            warn!("Simulated capture failure: {}", details);
            return Err(CaptureError::Device { details });
        }

        let seed = self.shared.captures_taken.fetch_add(1, Ordering::SeqCst);
        let (width, height) = capture.target_resolution();
        let path = options.path;
        let write_path = path.clone();

        let frame = FrameData::gradient(seed, width, height);
        tokio::task::spawn_blocking(move || write_jpeg(&write_path, &frame))
            .await
            .map_err(|e| CaptureError::Write {
                path: path.clone(),
                details: e.to_string(),
            })??;

        Ok(OutputFileResults { saved_path: path })
    }
}

fn write_jpeg(path: &Path, frame: &FrameData) -> Result<(), CaptureError> {
    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
        .ok_or_else(|| CaptureError::Write {
            path: path.to_path_buf(),
            details: "frame buffer size mismatch".to_string(),
        })?;
    image
        .save_with_format(path, image::ImageFormat::Jpeg)
        .map_err(|e| CaptureError::Write {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
}

#[async_trait]
impl GalleryPicker for SimulatedPlatform {
    async fn pick(&self, request_code: i32) -> ActivityResult {
        let script = self.shared.state.lock().picker.clone();
        match script {
            PickerScript::Pick(uri) => ActivityResult::ok(request_code, uri),
            PickerScript::Cancel => ActivityResult::canceled(request_code),
            PickerScript::Fail(code) => ActivityResult {
                request_code,
                result_code: ResultCode::from_code(code),
                data: None,
            },
        }
    }
}

impl Navigator for SimulatedPlatform {
    fn start(&self, payload: NavigationPayload) {
        debug!("Simulated navigation to {}", payload.target);
        self.shared.navigations.lock().push(payload);
    }
}

impl ScreenHost for SimulatedPlatform {
    fn show_message(&self, text: &str) {
        info!("Toast: {}", text);
        self.shared.messages.lock().push(text.to_string());
    }

    fn finish(&self) {
        self.shared.finished.store(true, Ordering::SeqCst);
    }

    fn surface_provider(&self) -> SurfaceProvider {
        SurfaceProvider("sim-viewfinder".to_string())
    }
}

/// Builder for [`SimulatedPlatform`]
pub struct SimulatedPlatformBuilder {
    granted: BTreeSet<Permission>,
    dialog_answers: BTreeMap<Permission, bool>,
    cameras: Vec<CameraInfo>,
    provider_available: bool,
    device_busy: bool,
    capture_failure: Option<String>,
    picker: PickerScript,
    provider_delay: Duration,
    capture_delay: Duration,
    dialog_delay: Duration,
}

impl Default for SimulatedPlatformBuilder {
    fn default() -> Self {
        Self {
            granted: BTreeSet::new(),
            dialog_answers: BTreeMap::new(),
            cameras: vec![
                CameraInfo {
                    id: "0".to_string(),
                    lens_facing: LensFacing::Back,
                    max_resolution: (3024, 4032),
                },
                CameraInfo {
                    id: "1".to_string(),
                    lens_facing: LensFacing::Front,
                    max_resolution: (1080, 1920),
                },
            ],
            provider_available: true,
            device_busy: false,
            capture_failure: None,
            picker: PickerScript::Cancel,
            provider_delay: Duration::ZERO,
            capture_delay: Duration::ZERO,
            dialog_delay: Duration::ZERO,
        }
    }
}

impl SimulatedPlatformBuilder {
    /// Permission already granted before the screen starts
    pub fn grant(mut self, permission: Permission) -> Self {
        self.granted.insert(permission);
        self
    }

    pub fn grant_all(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.granted.extend(permissions);
        self
    }

    /// User answer for `permission` in the dialog (default: allow)
    pub fn dialog_answer(mut self, permission: Permission, allow: bool) -> Self {
        self.dialog_answers.insert(permission, allow);
        self
    }

    /// Replace the camera list
    pub fn cameras(mut self, cameras: Vec<CameraInfo>) -> Self {
        self.cameras = cameras;
        self
    }

    pub fn camera(mut self, id: &str, lens_facing: LensFacing, max_resolution: Resolution) -> Self {
        self.cameras.push(CameraInfo {
            id: id.to_string(),
            lens_facing,
            max_resolution,
        });
        self
    }

    pub fn provider_available(mut self, available: bool) -> Self {
        self.provider_available = available;
        self
    }

    pub fn device_busy(mut self, busy: bool) -> Self {
        self.device_busy = busy;
        self
    }

    pub fn capture_failure(mut self, details: impl Into<String>) -> Self {
        self.capture_failure = Some(details.into());
        self
    }

    pub fn picker(mut self, script: PickerScript) -> Self {
        self.picker = script;
        self
    }

    pub fn provider_delay(mut self, delay: Duration) -> Self {
        self.provider_delay = delay;
        self
    }

    pub fn capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    pub fn dialog_delay(mut self, delay: Duration) -> Self {
        self.dialog_delay = delay;
        self
    }

    pub fn build(self) -> SimulatedPlatform {
        SimulatedPlatform {
            shared: Arc::new(SimShared {
                state: Mutex::new(SimState {
                    granted: self.granted,
                    dialog_answers: self.dialog_answers,
                    cameras: self.cameras,
                    provider_available: self.provider_available,
                    device_busy: self.device_busy,
                    bindings: Vec::new(),
                    capture_failure: self.capture_failure,
                    picker: self.picker,
                    surface_attached: false,
                }),
                provider_delay: self.provider_delay,
                capture_delay: self.capture_delay,
                dialog_delay: self.dialog_delay,
                navigations: Mutex::new(Vec::new()),
                messages: Mutex::new(Vec::new()),
                finished: AtomicBool::new(false),
                permission_requests: AtomicU64::new(0),
                bind_attempts: AtomicU64::new(0),
                captures_taken: AtomicU64::new(0),
                frame_counter: AtomicU64::new(0),
            }),
        }
    }
}
