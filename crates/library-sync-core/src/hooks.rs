use async_trait::async_trait;
use library_sync_models::{LibraryItem, MovieEntry, ProviderId};

/// Extension points invoked by the reconciler as it classifies items.
///
/// Every method defaults to doing nothing. An error aborts the pass; the
/// store is only written after the hook returns, so a failed `on_added` or
/// `on_updated` is retried on the next pass.
#[async_trait]
pub trait ReconcileHooks: Send + Sync {
    /// First sighting of `provider_id`.
    async fn on_added(&self, _provider_id: &ProviderId, _item: &LibraryItem) -> anyhow::Result<()> {
        Ok(())
    }

    /// Known id whose baseline differs from the recorded one.
    async fn on_updated(
        &self,
        _provider_id: &ProviderId,
        _item: &LibraryItem,
        _previous: &MovieEntry,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Tracked entry absent from the listing. Called on every pass until the
    /// entry is forgotten. Entries are identified by their raw store key.
    async fn on_removed(&self, _provider_id: &str, _entry: &MovieEntry) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NoopHooks;

#[async_trait]
impl ReconcileHooks for NoopHooks {}
