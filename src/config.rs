use crate::analysis::BackpressureStrategy;
use crate::permissions::Permission;
use crate::session::{LensFacing, Resolution};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SnapcamConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub permissions: PermissionsConfig,
    pub routing: RoutingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Preferred lens facing when selecting the physical camera
    #[serde(default = "default_lens_facing")]
    pub lens_facing: LensFacing,

    /// Preview target resolution (width, height)
    #[serde(default = "default_preview_resolution")]
    pub preview_resolution: Resolution,

    /// Still-capture target resolution (width, height)
    #[serde(default = "default_capture_resolution")]
    pub capture_resolution: Resolution,

    /// Frame-analysis target resolution (width, height)
    #[serde(default = "default_analysis_resolution")]
    pub analysis_resolution: Resolution,

    /// What the analysis producer does when the analyzer falls behind
    #[serde(default = "default_backpressure")]
    pub backpressure: BackpressureStrategy,

    /// Bind the analysis use-case alongside preview and capture
    #[serde(default = "default_bind_analysis")]
    pub bind_analysis: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// App-scoped external media root; images go to `<media_root>/<app_name>`
    #[serde(default = "default_media_root")]
    pub media_root: String,

    /// Subdirectory name under the media root
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Internal app storage used when the media directory is unavailable
    #[serde(default = "default_files_dir")]
    pub files_dir: String,

    /// Timezone for capture file names ("local" or an IANA name)
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PermissionsConfig {
    /// Permissions that must all be granted before the camera starts
    #[serde(default = "default_required_permissions")]
    pub required: Vec<Permission>,

    /// Request code passed to the OS permission dialog
    #[serde(default = "default_permission_request_code")]
    pub request_code: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoutingConfig {
    /// Name of the downstream drawing screen
    #[serde(default = "default_target")]
    pub target: String,

    /// Extra key carrying the image URI
    #[serde(default = "default_extra_message")]
    pub extra_message: String,

    /// Extra key carrying the source-type tag
    #[serde(default = "default_extra_type")]
    pub extra_type: String,

    /// Request code for the gallery picker
    #[serde(default = "default_pick_request_code")]
    pub pick_request_code: i32,
}

impl SnapcamConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let required: Vec<String> = default_required_permissions()
            .iter()
            .map(|p| p.key().to_string())
            .collect();

        let settings = Config::builder()
            .set_default("camera.lens_facing", "front")?
            .set_default(
                "camera.preview_resolution",
                vec![default_preview_resolution().0, default_preview_resolution().1],
            )?
            .set_default(
                "camera.capture_resolution",
                vec![default_capture_resolution().0, default_capture_resolution().1],
            )?
            .set_default(
                "camera.analysis_resolution",
                vec![
                    default_analysis_resolution().0,
                    default_analysis_resolution().1,
                ],
            )?
            .set_default("camera.backpressure", "block_producer")?
            .set_default("camera.bind_analysis", default_bind_analysis())?
            .set_default("capture.media_root", default_media_root())?
            .set_default("capture.app_name", default_app_name())?
            .set_default("capture.files_dir", default_files_dir())?
            .set_default("capture.timezone", default_timezone())?
            .set_default("permissions.required", required)?
            .set_default(
                "permissions.request_code",
                default_permission_request_code() as i64,
            )?
            .set_default("routing.target", default_target())?
            .set_default("routing.extra_message", default_extra_message())?
            .set_default("routing.extra_type", default_extra_type())?
            .set_default(
                "routing.pick_request_code",
                default_pick_request_code() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with SNAPCAM_ prefix, e.g. SNAPCAM_CAMERA__LENS_FACING
            .add_source(
                Environment::with_prefix("SNAPCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: SnapcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, resolution) in [
            ("preview", self.camera.preview_resolution),
            ("capture", self.camera.capture_resolution),
            ("analysis", self.camera.analysis_resolution),
        ] {
            if resolution.0 == 0 || resolution.1 == 0 {
                return Err(ConfigError::Message(format!(
                    "Camera {} resolution must be greater than 0",
                    name
                )));
            }
        }

        if self.capture.app_name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture app_name must not be empty".to_string(),
            ));
        }

        if self.capture.app_name.contains(['/', '\\']) {
            return Err(ConfigError::Message(
                "Capture app_name must be a single path component".to_string(),
            ));
        }

        if self.permissions.required.is_empty() {
            return Err(ConfigError::Message(
                "At least one required permission must be declared".to_string(),
            ));
        }

        if self.permissions.request_code == self.routing.pick_request_code {
            return Err(ConfigError::Message(
                "Permission and gallery request codes must differ".to_string(),
            ));
        }

        if self.routing.extra_message == self.routing.extra_type {
            return Err(ConfigError::Message(
                "Routing extra keys must differ".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SnapcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                lens_facing: default_lens_facing(),
                preview_resolution: default_preview_resolution(),
                capture_resolution: default_capture_resolution(),
                analysis_resolution: default_analysis_resolution(),
                backpressure: default_backpressure(),
                bind_analysis: default_bind_analysis(),
            },
            capture: CaptureConfig {
                media_root: default_media_root(),
                app_name: default_app_name(),
                files_dir: default_files_dir(),
                timezone: default_timezone(),
            },
            permissions: PermissionsConfig {
                required: default_required_permissions(),
                request_code: default_permission_request_code(),
            },
            routing: RoutingConfig {
                target: default_target(),
                extra_message: default_extra_message(),
                extra_type: default_extra_type(),
                pick_request_code: default_pick_request_code(),
            },
        }
    }
}

// Default value functions
fn default_lens_facing() -> LensFacing {
    LensFacing::Front
}
fn default_preview_resolution() -> Resolution {
    (720, 1280)
}
fn default_capture_resolution() -> Resolution {
    (720, 1280)
}
fn default_analysis_resolution() -> Resolution {
    (360, 640)
}
fn default_backpressure() -> BackpressureStrategy {
    BackpressureStrategy::BlockProducer
}
fn default_bind_analysis() -> bool {
    false
}

fn default_media_root() -> String {
    "./media".to_string()
}
fn default_app_name() -> String {
    "Snapcam".to_string()
}
fn default_files_dir() -> String {
    "./files".to_string()
}
fn default_timezone() -> String {
    "local".to_string()
}

fn default_required_permissions() -> Vec<Permission> {
    vec![
        Permission::Camera,
        Permission::ReadExternalStorage,
        Permission::Internet,
    ]
}
fn default_permission_request_code() -> i32 {
    10
}

fn default_target() -> String {
    "draw".to_string()
}
fn default_extra_message() -> String {
    "com.example.CameraXtest.MESSAGE".to_string()
}
fn default_extra_type() -> String {
    "com.example.CameraXtest.TYPE".to_string()
}
fn default_pick_request_code() -> i32 {
    100
}
