use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// External metadata catalog a provider id belongs to.
///
/// Declaration order is resolution priority: when an item carries several
/// catalog ids, the first namespace present wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Tmdb,
    Tvdb,
    Imdb,
}

impl Namespace {
    pub const PRIORITY: [Namespace; 3] = [Namespace::Tmdb, Namespace::Tvdb, Namespace::Imdb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Tmdb => "tmdb",
            Namespace::Tvdb => "tvdb",
            Namespace::Imdb => "imdb",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ProviderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmdb" => Ok(Namespace::Tmdb),
            "tvdb" => Ok(Namespace::Tvdb),
            "imdb" => Ok(Namespace::Imdb),
            other => Err(ProviderIdError::UnknownNamespace(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProviderIdError {
    #[error("provider id '{0}' is not in '<namespace>:<id>' form")]
    Malformed(String),
    #[error("unknown provider namespace '{0}'")]
    UnknownNamespace(String),
}

/// Composite store key, rendered as `"<namespace>:<external_id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId {
    pub namespace: Namespace,
    pub external_id: String,
}

impl ProviderId {
    pub fn new(namespace: Namespace, external_id: impl Into<String>) -> Self {
        Self {
            namespace,
            external_id: external_id.into(),
        }
    }

    /// Store key form of this id.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.external_id)
    }
}

impl FromStr for ProviderId {
    type Err = ProviderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, external_id) = s
            .split_once(':')
            .ok_or_else(|| ProviderIdError::Malformed(s.to_string()))?;
        if external_id.is_empty() {
            return Err(ProviderIdError::Malformed(s.to_string()));
        }
        Ok(Self::new(namespace.parse()?, external_id))
    }
}

/// Catalog identifiers as reported by the media server (`ProviderIds` object).
///
/// Keys the server sends for other catalogs are ignored. Ids may arrive as
/// strings or numbers; empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIds {
    #[serde(rename = "Tmdb", alias = "tmdb", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<String>,
    #[serde(rename = "Tvdb", alias = "tvdb", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<String>,
    #[serde(rename = "Imdb", alias = "imdb", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
}

impl ProviderIds {
    pub fn get(&self, namespace: Namespace) -> Option<&str> {
        let value = match namespace {
            Namespace::Tmdb => self.tmdb.as_deref(),
            Namespace::Tvdb => self.tvdb.as_deref(),
            Namespace::Imdb => self.imdb.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Pick the store key for an item: tmdb, else tvdb, else imdb.
    pub fn resolve(&self) -> Option<ProviderId> {
        Namespace::PRIORITY
            .iter()
            .find_map(|ns| self.get(*ns).map(|id| ProviderId::new(*ns, id)))
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tmdb: Option<&str>, tvdb: Option<&str>, imdb: Option<&str>) -> ProviderIds {
        ProviderIds {
            tmdb: tmdb.map(String::from),
            tvdb: tvdb.map(String::from),
            imdb: imdb.map(String::from),
        }
    }

    #[test]
    fn test_resolve_prefers_tmdb_over_tvdb() {
        let resolved = ids(Some("603"), Some("81189"), Some("tt0133093")).resolve().unwrap();
        assert_eq!(resolved.to_string(), "tmdb:603");
    }

    #[test]
    fn test_resolve_falls_back_to_tvdb_then_imdb() {
        assert_eq!(ids(None, Some("81189"), None).resolve().unwrap().to_string(), "tvdb:81189");
        assert_eq!(ids(None, None, Some("tt0133093")).resolve().unwrap().to_string(), "imdb:tt0133093");
    }

    #[test]
    fn test_resolve_none_when_no_ids() {
        assert_eq!(ids(None, None, None).resolve(), None);
    }

    #[test]
    fn test_empty_id_is_skipped() {
        let resolved = ids(Some(""), Some("81189"), None).resolve().unwrap();
        assert_eq!(resolved.namespace, Namespace::Tvdb);
    }

    #[test]
    fn test_deserialize_server_shape() {
        let json = r#"{"Tmdb": "603", "Imdb": "tt0133093", "TvRage": "1"}"#;
        let parsed: ProviderIds = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tmdb.as_deref(), Some("603"));
        assert_eq!(parsed.tvdb, None);
        assert_eq!(parsed.imdb.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let parsed: ProviderIds = serde_json::from_str(r#"{"Tvdb": 81189, "Tmdb": null}"#).unwrap();
        assert_eq!(parsed.tvdb.as_deref(), Some("81189"));
        assert_eq!(parsed.tmdb, None);
    }

    #[test]
    fn test_provider_id_parse() {
        let id: ProviderId = "imdb:tt0133093".parse().unwrap();
        assert_eq!(id.namespace, Namespace::Imdb);
        assert_eq!(id.external_id, "tt0133093");

        assert!(matches!("603".parse::<ProviderId>(), Err(ProviderIdError::Malformed(_))));
        assert!(matches!("tmdb:".parse::<ProviderId>(), Err(ProviderIdError::Malformed(_))));
        assert!(matches!("trakt:1".parse::<ProviderId>(), Err(ProviderIdError::UnknownNamespace(_))));
    }
}
