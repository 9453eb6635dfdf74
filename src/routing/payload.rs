use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a routed image came from. The numeric value is what the
/// downstream screen reads from the type extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum SourceType {
    Captured = 0,
    Picked = 1,
}

impl SourceType {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SourceType::Captured),
            1 => Some(SourceType::Picked),
            _ => None,
        }
    }
}

/// An image ready for the downstream screen, consumed once by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPayload {
    CapturedPhoto { uri: String },
    PickedGallery { uri: String },
}

impl ResultPayload {
    pub fn new(uri: impl Into<String>, source_type: SourceType) -> Self {
        let uri = uri.into();
        match source_type {
            SourceType::Captured => ResultPayload::CapturedPhoto { uri },
            SourceType::Picked => ResultPayload::PickedGallery { uri },
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            ResultPayload::CapturedPhoto { uri } | ResultPayload::PickedGallery { uri } => uri,
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            ResultPayload::CapturedPhoto { .. } => SourceType::Captured,
            ResultPayload::PickedGallery { .. } => SourceType::Picked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Int(i32),
    Str(String),
}

/// Navigation request to a downstream screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub target: String,
    pub extras: BTreeMap<String, ExtraValue>,
}

impl NavigationPayload {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            extras: BTreeMap::new(),
        }
    }

    pub fn put_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), ExtraValue::Str(value.into()));
        self
    }

    pub fn put_int(mut self, key: impl Into<String>, value: i32) -> Self {
        self.extras.insert(key.into(), ExtraValue::Int(value));
        self
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.extras.get(key) {
            Some(ExtraValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.extras.get(key) {
            Some(ExtraValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Result code returned by an external screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Canceled,
    Other(i32),
}

impl ResultCode {
    pub const OK: i32 = -1;
    pub const CANCELED: i32 = 0;

    pub fn code(self) -> i32 {
        match self {
            ResultCode::Ok => Self::OK,
            ResultCode::Canceled => Self::CANCELED,
            ResultCode::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::OK => ResultCode::Ok,
            Self::CANCELED => ResultCode::Canceled,
            other => ResultCode::Other(other),
        }
    }
}

/// One-shot result of an external screen launched for a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResult {
    pub request_code: i32,
    pub result_code: ResultCode,
    pub data: Option<String>,
}

impl ActivityResult {
    pub fn ok(request_code: i32, uri: impl Into<String>) -> Self {
        Self {
            request_code,
            result_code: ResultCode::Ok,
            data: Some(uri.into()),
        }
    }

    pub fn canceled(request_code: i32) -> Self {
        Self {
            request_code,
            result_code: ResultCode::Canceled,
            data: None,
        }
    }
}
