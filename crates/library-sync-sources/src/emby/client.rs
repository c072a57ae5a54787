use crate::error::SourceError;
use crate::traits::LibrarySource;
use async_trait::async_trait;
use library_sync_config::EmbyConfig;
use library_sync_models::ItemsPage;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Fields requested on every listing call; reconciliation needs nothing else.
pub const LISTING_FIELDS: &str = "DateCreated,ProviderIds";

pub struct EmbyClient {
    client: Client,
    base_url: Url,
    user_id: String,
    item_types: String,
}

impl EmbyClient {
    pub fn new(
        server_url: &str,
        api_key: &str,
        user_id: impl Into<String>,
        item_types: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let server_url = server_url.trim().trim_end_matches('/');
        if server_url.is_empty() {
            return Err(SourceError::InvalidConfig("server url is empty".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::HeaderName::from_static("x-emby-token"),
            reqwest::header::HeaderValue::from_str(api_key)
                .map_err(|_| SourceError::InvalidConfig("api key is not a valid header value".to_string()))?,
        );

        let base_url = Url::parse(&format!("{}/emby", server_url))
            .map_err(|e| SourceError::InvalidConfig(format!("invalid server url {:?}: {}", server_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidConfig(format!(
                "server url {:?} is not an http(s) base url",
                server_url
            )));
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            user_id: user_id.into(),
            item_types: item_types.into(),
        })
    }

    pub fn from_config(config: &EmbyConfig) -> Result<Self, SourceError> {
        let timeout = config
            .request_timeout()
            .map_err(|e| SourceError::InvalidConfig(format!("request_timeout: {}", e)))?;
        Self::new(
            &config.url,
            &config.api_key,
            config.library_user.clone(),
            config.item_types.clone(),
            timeout,
        )
    }

    /// `<base>/Users/{user}/Items`, with the user id encoded as one path segment.
    fn items_url(&self) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidConfig("server url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["Users", self.user_id.as_str(), "Items"]);
        Ok(url)
    }
}

#[async_trait]
impl LibrarySource for EmbyClient {
    fn source_name(&self) -> &str {
        "emby"
    }

    async fn fetch_page(&self, start_index: usize, limit: usize) -> Result<ItemsPage, SourceError> {
        let url = self.items_url()?;
        let start_param = start_index.to_string();
        let limit_param = limit.to_string();

        debug!(
            operation = "fetch_page",
            start_index = start_index,
            limit = limit,
            "Requesting library page"
        );

        let response = self
            .client
            .get(url.clone())
            .query(&[
                ("IncludeItemTypes", self.item_types.as_str()),
                ("Recursive", "true"),
                ("Fields", LISTING_FIELDS),
                ("StartIndex", start_param.as_str()),
                ("Limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let page: ItemsPage = serde_json::from_str(&body)
            .map_err(|source| SourceError::Decode {
                url: url.to_string(),
                source,
            })?;

        debug!(
            operation = "fetch_page",
            start_index = start_index,
            returned = page.len(),
            total = ?page.total_record_count,
            "Received library page"
        );

        Ok(page)
    }
}
