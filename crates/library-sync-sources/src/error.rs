#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to media server failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not decode media server response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),
}
