use crate::error::SourceError;
use async_trait::async_trait;
use library_sync_models::ItemsPage;

/// A remote library that can be listed in pages.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch up to `limit` items starting at `start_index` in listing order.
    async fn fetch_page(&self, start_index: usize, limit: usize) -> Result<ItemsPage, SourceError>;
}
