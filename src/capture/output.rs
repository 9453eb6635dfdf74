use crate::config::CaptureConfig;
use crate::error::CaptureError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolve the directory captures are written to.
///
/// Prefers `<media_root>/<app_name>`; falls back to the internal files
/// directory when the media directory cannot be created. The result is
/// absolute so file URIs can be derived from it.
pub fn resolve_output_directory(config: &CaptureConfig) -> Result<PathBuf, CaptureError> {
    let media_dir = Path::new(&config.media_root).join(&config.app_name);

    match ensure_dir(&media_dir) {
        Ok(dir) => {
            info!("Capture output directory: {}", dir.display());
            Ok(dir)
        }
        Err(e) => {
            warn!(
                "Media directory {} unavailable ({}), using internal storage",
                media_dir.display(),
                e
            );
            let files_dir = PathBuf::from(&config.files_dir);
            let dir = ensure_dir(&files_dir).map_err(|source| CaptureError::OutputDirectory {
                path: files_dir.clone(),
                source,
            })?;
            info!("Capture output directory: {}", dir.display());
            Ok(dir)
        }
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(path)?;
    let dir = std::fs::canonicalize(path)?;
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} is not a directory", dir.display()),
        ))
    }
}
