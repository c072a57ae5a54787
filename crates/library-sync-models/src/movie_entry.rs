use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Persisted record for one tracked provider id.
///
/// Field names are camelCase on disk so existing store documents keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEntry {
    #[serde(default)]
    pub baseline: Option<String>,
    pub last_seen: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid lastSeen timestamp '{value}': {source}")]
pub struct LastSeenError {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

impl MovieEntry {
    /// Entry for an item observed at `now`.
    pub fn observed(baseline: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            baseline,
            last_seen: format_timestamp(now),
        }
    }

    pub fn mark_seen(&mut self, now: DateTime<Utc>) {
        self.last_seen = format_timestamp(now);
    }

    pub fn last_seen_at(&self) -> Result<DateTime<Utc>, LastSeenError> {
        DateTime::parse_from_rfc3339(&self.last_seen)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|source| LastSeenError {
                value: self.last_seen.clone(),
                source,
            })
    }
}

/// RFC 3339, millisecond precision, `Z` suffix (`2024-01-01T00:00:00.000Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_observed_formats_last_seen() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let entry = MovieEntry::observed(Some("2023-01-01T00:00:00Z".to_string()), now);
        assert_eq!(entry.last_seen, "2024-03-01T12:30:00.000Z");
        assert_eq!(entry.last_seen_at().unwrap(), now);
    }

    #[test]
    fn test_camel_case_on_disk() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let entry = MovieEntry::observed(None, now);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["lastSeen"], "2024-03-01T00:00:00.000Z");
        assert!(json.get("last_seen").is_none());
    }

    #[test]
    fn test_invalid_last_seen_is_error() {
        let entry = MovieEntry {
            baseline: None,
            last_seen: "yesterday".to_string(),
        };
        let err = entry.last_seen_at().unwrap_err();
        assert_eq!(err.value, "yesterday");
    }
}
