use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events emitted by the camera screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SnapcamEvent {
    /// The OS permission dialog was shown
    PermissionsRequested { permissions: Vec<String> },
    /// Required permissions were refused; the screen closes
    PermissionsDenied { missing: Vec<String> },
    /// Preview and capture are bound to the screen lifecycle
    CameraBound {
        camera_id: String,
        lens_facing: String,
        use_cases: Vec<String>,
    },
    /// Binding failed; the preview is unavailable
    CameraBindFailed { reason: String },
    /// A capture request was issued
    CaptureStarted { path: String },
    /// A capture was written to disk
    CaptureSaved { uri: String, timestamp: SystemTime },
    /// A capture request failed
    CaptureFailed { error: String },
    /// An image was handed to the downstream screen
    ImageRouted {
        uri: String,
        source_type: i32,
        target: String,
    },
    /// A picker result was not routed
    PickIgnored { request_code: i32, result_code: i32 },
    /// The screen finished
    ScreenClosed { reason: String },
}

impl SnapcamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SnapcamEvent::PermissionsRequested { permissions } => {
                format!("Requested permissions: {}", permissions.join(", "))
            }
            SnapcamEvent::PermissionsDenied { missing } => {
                format!("Permissions denied: {}", missing.join(", "))
            }
            SnapcamEvent::CameraBound {
                camera_id,
                lens_facing,
                use_cases,
            } => format!(
                "Camera {} ({}) bound: {}",
                camera_id,
                lens_facing,
                use_cases.join(", ")
            ),
            SnapcamEvent::CameraBindFailed { reason } => format!("Camera bind failed: {}", reason),
            SnapcamEvent::CaptureStarted { path } => format!("Capture started: {}", path),
            SnapcamEvent::CaptureSaved { uri, .. } => format!("Capture saved: {}", uri),
            SnapcamEvent::CaptureFailed { error } => format!("Capture failed: {}", error),
            SnapcamEvent::ImageRouted {
                uri,
                source_type,
                target,
            } => format!("Routed {} (type {}) to {}", uri, source_type, target),
            SnapcamEvent::PickIgnored {
                request_code,
                result_code,
            } => format!(
                "Ignored picker result {} for request {}",
                result_code, request_code
            ),
            SnapcamEvent::ScreenClosed { reason } => format!("Screen closed: {}", reason),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SnapcamEvent::PermissionsRequested { .. } => "permissions_requested",
            SnapcamEvent::PermissionsDenied { .. } => "permissions_denied",
            SnapcamEvent::CameraBound { .. } => "camera_bound",
            SnapcamEvent::CameraBindFailed { .. } => "camera_bind_failed",
            SnapcamEvent::CaptureStarted { .. } => "capture_started",
            SnapcamEvent::CaptureSaved { .. } => "capture_saved",
            SnapcamEvent::CaptureFailed { .. } => "capture_failed",
            SnapcamEvent::ImageRouted { .. } => "image_routed",
            SnapcamEvent::PickIgnored { .. } => "pick_ignored",
            SnapcamEvent::ScreenClosed { .. } => "screen_closed",
        }
    }
}

/// Broadcast bus for screen events
pub struct EventBus {
    sender: broadcast::Sender<SnapcamEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SnapcamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers. Fails only when nobody listens.
    pub fn publish(&self, event: SnapcamEvent) -> Result<usize, EventBusError> {
        match &event {
            SnapcamEvent::PermissionsDenied { missing } => {
                warn!("Permissions denied: {}", missing.join(", "));
            }
            SnapcamEvent::CameraBindFailed { reason } => {
                warn!("Camera bind failed: {}", reason);
            }
            SnapcamEvent::ImageRouted { .. } => {
                info!("{}", event.description());
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let delivered = bus
            .publish(SnapcamEvent::CaptureStarted {
                path: "/tmp/a.jpg".to_string(),
            })
            .unwrap();
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "capture_started");
        assert!(event.description().contains("/tmp/a.jpg"));
    }

    #[test]
    fn test_publish_without_subscribers_fails() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        let result = bus.publish(SnapcamEvent::ScreenClosed {
            reason: "test".to_string(),
        });
        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
    }

    #[test]
    fn test_event_serializes_to_json() {
        let event = SnapcamEvent::ImageRouted {
            uri: "file:///tmp/x.jpg".to_string(),
            source_type: 0,
            target: "draw".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ImageRouted"));
        assert!(json.contains("file:///tmp/x.jpg"));
    }
}
