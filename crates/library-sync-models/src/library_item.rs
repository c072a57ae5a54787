use crate::provider_id::{ProviderId, ProviderIds};
use serde::{Deserialize, Serialize};

/// One entry of the media server's item listing.
///
/// Only `DateCreated` and `ProviderIds` drive reconciliation; the rest is
/// carried for log output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(rename = "DateCreated", default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(rename = "ProviderIds", default)]
    pub provider_ids: ProviderIds,
}

impl LibraryItem {
    pub fn provider_id(&self) -> Option<ProviderId> {
        self.provider_ids.resolve()
    }

    /// Fingerprint recorded in the store to detect upstream changes.
    pub fn baseline(&self) -> Option<&str> {
        self.date_created.as_deref().filter(|d| !d.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

/// A page of the `/Users/{id}/Items` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<LibraryItem>,
    #[serde(rename = "TotalRecordCount", default, skip_serializing_if = "Option::is_none")]
    pub total_record_count: Option<u64>,
}

impl ItemsPage {
    pub fn new(items: Vec<LibraryItem>) -> Self {
        Self {
            items,
            total_record_count: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_items_page() {
        let json = r#"{
            "Items": [
                {
                    "Name": "The Matrix",
                    "Id": "12",
                    "Type": "Movie",
                    "DateCreated": "2023-04-01T10:00:00.0000000Z",
                    "ProviderIds": {"Tmdb": "603", "Imdb": "tt0133093"}
                },
                {"Name": "Home Video", "Type": "Movie"}
            ],
            "TotalRecordCount": 2
        }"#;
        let page: ItemsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.total_record_count, Some(2));

        let matrix = &page.items[0];
        assert_eq!(matrix.provider_id().unwrap().to_string(), "tmdb:603");
        assert_eq!(matrix.baseline(), Some("2023-04-01T10:00:00.0000000Z"));

        let home = &page.items[1];
        assert_eq!(home.provider_id(), None);
        assert_eq!(home.baseline(), None);
    }

    #[test]
    fn test_missing_items_array_is_empty_page() {
        let page: ItemsPage = serde_json::from_str(r#"{"TotalRecordCount": 0}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_empty_date_created_is_no_baseline() {
        let item = LibraryItem {
            date_created: Some(String::new()),
            ..LibraryItem::default()
        };
        assert_eq!(item.baseline(), None);
        assert_eq!(item.display_name(), "unknown");
    }
}
