mod gate;
#[cfg(test)]
mod tests;

pub use gate::{GateDecision, GateStep, PermissionGate, PermissionRequest};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// OS capabilities the camera screen may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
    ReadExternalStorage,
    WriteExternalStorage,
    Internet,
}

impl Permission {
    /// Configuration key, also accepted by `FromStr`
    pub fn key(&self) -> &'static str {
        match self {
            Permission::Camera => "camera",
            Permission::ReadExternalStorage => "read_external_storage",
            Permission::WriteExternalStorage => "write_external_storage",
            Permission::Internet => "internet",
        }
    }

    /// Name as declared in the platform manifest
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Permission::Camera => "android.permission.CAMERA",
            Permission::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            Permission::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
            Permission::Internet => "android.permission.INTERNET",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_name())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Permission::Camera,
            Permission::ReadExternalStorage,
            Permission::WriteExternalStorage,
            Permission::Internet,
        ]
        .into_iter()
        .find(|p| p.key() == s || p.manifest_name() == s)
        .ok_or_else(|| format!("unknown permission '{}'", s))
    }
}

/// One-shot answer from the OS permission dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResult {
    pub request_code: i32,
    pub grants: BTreeMap<Permission, bool>,
}

impl PermissionResult {
    pub fn new(request_code: i32, grants: impl IntoIterator<Item = (Permission, bool)>) -> Self {
        Self {
            request_code,
            grants: grants.into_iter().collect(),
        }
    }

    pub fn is_granted(&self, permission: Permission) -> bool {
        self.grants.get(&permission).copied().unwrap_or(false)
    }
}
