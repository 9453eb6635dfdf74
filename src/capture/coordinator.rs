use super::naming::{unique_capture_path, Clock, TimestampZone};
use super::{OutputFileOptions, OutputFileResults};
use crate::error::CaptureError;
use crate::platform::CameraProvider;
use crate::session::{CameraSession, ImageCapture};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

/// A photo persisted by the camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub uri: String,
}

impl CapturedImage {
    fn from_results(results: OutputFileResults) -> Result<Self, CaptureError> {
        let uri = Url::from_file_path(&results.saved_path)
            .map_err(|_| CaptureError::Write {
                path: results.saved_path.clone(),
                details: "saved path is not absolute".to_string(),
            })?
            .to_string();
        Ok(Self {
            path: results.saved_path,
            uri,
        })
    }
}

/// Clears the in-flight flag however the request ends
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The single outstanding capture request. Consumed by [`PendingCapture::complete`],
/// so its outcome is observed exactly once.
pub struct PendingCapture {
    provider: Arc<dyn CameraProvider>,
    image_capture: ImageCapture,
    options: OutputFileOptions,
    _guard: InFlightGuard,
}

impl PendingCapture {
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    /// Run the request. The coordinator stays busy until the returned
    /// [`CaptureOutcome`] is consumed or dropped.
    pub async fn complete(self) -> CaptureOutcome {
        let path = self.options.path.clone();
        let result = self
            .provider
            .take_picture(&self.image_capture, self.options)
            .await
            .and_then(CapturedImage::from_results);

        match &result {
            Ok(image) => info!("Photo capture succeeded: {}", image.uri),
            Err(e) => error!("Photo capture failed for {}: {}", path.display(), e),
        }
        CaptureOutcome {
            result,
            _guard: self._guard,
        }
    }
}

/// Finished capture still holding the in-flight slot
#[derive(Debug)]
pub struct CaptureOutcome {
    result: Result<CapturedImage, CaptureError>,
    _guard: InFlightGuard,
}

impl CaptureOutcome {
    pub fn result(&self) -> &Result<CapturedImage, CaptureError> {
        &self.result
    }

    /// Release the in-flight slot and take the result
    pub fn into_result(self) -> Result<CapturedImage, CaptureError> {
        self.result
    }
}

/// Serializes still captures: at most one request is in flight
pub struct CaptureCoordinator {
    output_dir: PathBuf,
    zone: TimestampZone,
    clock: Arc<dyn Clock>,
    in_flight: Arc<AtomicBool>,
}

impl CaptureCoordinator {
    pub fn new(output_dir: PathBuf, zone: TimestampZone, clock: Arc<dyn Clock>) -> Self {
        Self {
            output_dir,
            zone,
            clock,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Issue a capture request against the session's still-capture use-case.
    ///
    /// Rejects with `NotReady` before a session exists and with `InFlight`
    /// while an earlier request is still pending.
    pub fn begin(&self, session: Option<&CameraSession>) -> Result<PendingCapture, CaptureError> {
        let session = session.ok_or(CaptureError::NotReady)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Capture rejected: a request is already in flight");
            return Err(CaptureError::InFlight);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let path = unique_capture_path(&self.output_dir, self.zone, self.clock.now());
        debug!("Capturing to {}", path.display());

        Ok(PendingCapture {
            provider: session.provider(),
            image_capture: session.image_capture.clone(),
            options: OutputFileOptions { path },
            _guard: guard,
        })
    }

    /// Issue and await a capture
    pub async fn capture(
        &self,
        session: Option<&CameraSession>,
    ) -> Result<CapturedImage, CaptureError> {
        self.begin(session)?.complete().await.into_result()
    }
}
