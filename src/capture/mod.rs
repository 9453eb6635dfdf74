mod coordinator;
mod naming;
mod output;
#[cfg(test)]
mod tests;

pub use coordinator::{CaptureCoordinator, CaptureOutcome, CapturedImage, PendingCapture};
pub use naming::{
    capture_file_name, resolve_timestamp_zone, unique_capture_path, Clock, SystemClock,
    TimestampZone, FILENAME_FORMAT, PHOTO_EXTENSION,
};
pub use output::resolve_output_directory;

use std::path::PathBuf;

/// Where the camera should write one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileOptions {
    pub path: PathBuf,
}

/// What the camera reports after writing a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileResults {
    pub saved_path: PathBuf,
}
