use super::payload::{ActivityResult, NavigationPayload, ResultCode, ResultPayload, SourceType};
use crate::config::RoutingConfig;
use crate::platform::{GalleryPicker, Navigator};
use std::sync::Arc;
use tracing::{debug, info};

/// Pending gallery pick; owns everything it needs to run on a task
pub struct PickRequest {
    picker: Arc<dyn GalleryPicker>,
    request_code: i32,
}

impl PickRequest {
    pub async fn send(self) -> ActivityResult {
        debug!("Opening gallery (request code {})", self.request_code);
        self.picker.pick(self.request_code).await
    }
}

/// Forwards captured or picked images to the downstream drawing screen
pub struct ResultRouter {
    config: RoutingConfig,
    navigator: Arc<dyn Navigator>,
}

impl ResultRouter {
    pub fn new(config: RoutingConfig, navigator: Arc<dyn Navigator>) -> Self {
        Self { config, navigator }
    }

    pub fn pick_request_code(&self) -> i32 {
        self.config.pick_request_code
    }

    /// Build the navigation payload for a result without sending it
    pub fn payload_for(&self, payload: &ResultPayload) -> NavigationPayload {
        NavigationPayload::new(&self.config.target)
            .put_string(&self.config.extra_message, payload.uri())
            .put_int(&self.config.extra_type, payload.source_type().code())
    }

    /// Hand the payload to the navigator. Fire-and-forget.
    pub fn route(&self, payload: ResultPayload) -> NavigationPayload {
        let navigation = self.payload_for(&payload);
        info!(
            "Routing {:?} image {} to {}",
            payload.source_type(),
            payload.uri(),
            navigation.target
        );
        self.navigator.start(navigation.clone());
        navigation
    }

    pub fn route_uri(&self, uri: impl Into<String>, source_type: SourceType) -> NavigationPayload {
        self.route(ResultPayload::new(uri, source_type))
    }

    pub fn open_gallery(&self, picker: Arc<dyn GalleryPicker>) -> PickRequest {
        PickRequest {
            picker,
            request_code: self.config.pick_request_code,
        }
    }

    /// Route a gallery pick if it is ours and succeeded; ignore anything else
    pub fn on_activity_result(&self, result: ActivityResult) -> Option<NavigationPayload> {
        if result.request_code != self.config.pick_request_code {
            debug!("Ignoring result for request code {}", result.request_code);
            return None;
        }
        if result.result_code != ResultCode::Ok {
            debug!("Gallery pick ended with {:?}", result.result_code);
            return None;
        }
        match result.data {
            Some(uri) => Some(self.route_uri(uri, SourceType::Picked)),
            None => {
                debug!("Gallery pick returned no data");
                None
            }
        }
    }
}
