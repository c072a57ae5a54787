use crate::library_item::LibraryItem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a media server webhook notification.
///
/// Nothing is required: a payload without `Event` is still accepted and
/// treated as an unrecognized event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "Event", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(rename = "Item", default, skip_serializing_if = "Option::is_none")]
    pub item: Option<LibraryItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookPayload {
    /// Build a payload from any JSON document.
    ///
    /// Documents that do not match the expected shape (a non-object body, an
    /// `Item` that is not an object) keep whatever `Event` string they carry.
    pub fn from_value(value: Value) -> Self {
        if let Ok(payload) = serde_json::from_value::<WebhookPayload>(value.clone()) {
            return payload;
        }
        let event = value
            .get("Event")
            .and_then(Value::as_str)
            .map(String::from);
        let extra = match value {
            Value::Object(mut map) => {
                map.remove("Event");
                map
            }
            _ => Map::new(),
        };
        Self {
            event,
            item: None,
            extra,
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_media_added() {
        let json = r#"{
            "Title": "New Movie",
            "Event": "library.mediaadded",
            "Item": {"Name": "The Matrix", "ProviderIds": {"Tmdb": "603"}},
            "Server": {"Name": "home"}
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.event.as_deref(), Some("library.mediaadded"));
        assert_eq!(payload.item.unwrap().provider_id().unwrap().to_string(), "tmdb:603");
        assert!(payload.extra.contains_key("Server"));
    }

    #[test]
    fn test_from_value_tolerates_odd_item() {
        let value = serde_json::json!({"Event": "library.mediadeleted", "Item": "not-an-object"});
        let payload = WebhookPayload::from_value(value);
        assert_eq!(payload.event_name(), Some("library.mediadeleted"));
        assert_eq!(payload.item, None);
        assert!(payload.extra.contains_key("Item"));
    }

    #[test]
    fn test_from_value_non_object() {
        let payload = WebhookPayload::from_value(serde_json::json!([1, 2, 3]));
        assert_eq!(payload.event, None);
        assert!(payload.extra.is_empty());
    }

    #[test]
    fn test_empty_object_is_valid() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.event, None);
        assert_eq!(payload.item, None);
    }
}
