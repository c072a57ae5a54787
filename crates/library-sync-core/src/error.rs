use crate::store::StoreError;
use library_sync_models::LastSeenError;
use library_sync_sources::SourceError;

/// Anything that aborts a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{hook} hook failed for {provider_id}: {message}")]
    Hook {
        hook: &'static str,
        provider_id: String,
        message: String,
    },

    #[error("entry {provider_id} has an unreadable lastSeen: {source}")]
    InvalidLastSeen {
        provider_id: String,
        #[source]
        source: LastSeenError,
    },
}

impl ReconcileError {
    pub(crate) fn hook(hook: &'static str, provider_id: &str, err: anyhow::Error) -> Self {
        Self::Hook {
            hook,
            provider_id: provider_id.to_string(),
            message: format!("{:#}", err),
        }
    }
}
