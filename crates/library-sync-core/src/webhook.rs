use crate::store::SharedStore;
use library_sync_models::WebhookPayload;
use tracing::{debug, info};

pub const MEDIA_ADDED: &str = "library.mediaadded";
pub const MEDIA_DELETED: &str = "library.mediadeleted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    MediaAdded,
    MediaDeleted,
    Other(String),
    /// Payload carried no `Event` string
    Missing,
}

impl WebhookEvent {
    pub fn classify(payload: &WebhookPayload) -> Self {
        match payload.event_name() {
            Some(MEDIA_ADDED) => WebhookEvent::MediaAdded,
            Some(MEDIA_DELETED) => WebhookEvent::MediaDeleted,
            Some(other) => WebhookEvent::Other(other.to_string()),
            None => WebhookEvent::Missing,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, WebhookEvent::MediaAdded | WebhookEvent::MediaDeleted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub event: WebhookEvent,
    pub provider_id: Option<String>,
    /// Whether the store already tracks `provider_id`
    pub tracked: Option<bool>,
}

/// Classify and log an inbound notification. The store is only read.
pub async fn handle_webhook(store: &SharedStore, payload: &WebhookPayload) -> WebhookOutcome {
    let event = WebhookEvent::classify(payload);
    let provider_id = payload
        .item
        .as_ref()
        .and_then(|item| item.provider_id())
        .map(|id| id.key());

    let tracked = match &provider_id {
        Some(key) => Some(store.lock().await.contains(key)),
        None => None,
    };

    let item_name = payload.item.as_ref().map(|item| item.display_name());
    debug!(operation = "webhook", item = ?payload.item, "Webhook item");

    match &event {
        WebhookEvent::MediaAdded => {
            info!(
                operation = "webhook",
                event = MEDIA_ADDED,
                provider_id = ?provider_id,
                tracked = ?tracked,
                item = ?item_name,
                "Received media added event..."
            );
        }
        WebhookEvent::MediaDeleted => {
            info!(
                operation = "webhook",
                event = MEDIA_DELETED,
                provider_id = ?provider_id,
                tracked = ?tracked,
                item = ?item_name,
                "Received media deleted event..."
            );
        }
        WebhookEvent::Other(name) => {
            debug!("Unhandled event received: {}", name);
            info!(
                operation = "webhook",
                event = name.as_str(),
                payload = %serde_json::to_string(payload).unwrap_or_default(),
                "Unhandled webhook event"
            );
        }
        WebhookEvent::Missing => {
            debug!("Unhandled event received: <none>");
            info!(
                operation = "webhook",
                payload = %serde_json::to_string(payload).unwrap_or_default(),
                "Webhook without an Event field"
            );
        }
    }

    WebhookOutcome {
        event,
        provider_id,
        tracked,
    }
}
