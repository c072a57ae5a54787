use crate::error::ReconcileError;
use crate::hooks::ReconcileHooks;
use crate::store::SharedStore;
use chrono::{DateTime, Utc};
use library_sync_models::{LibraryItem, MovieEntry};
use library_sync_sources::LibrarySource;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: usize = 250;

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub page_size: usize,
    /// Entries missing for strictly longer than this are deleted
    pub forget_after: chrono::Duration,
}

impl ReconcileSettings {
    pub fn new(forget_after: chrono::Duration) -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            forget_after,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub missing: usize,
    pub deleted: usize,
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Added {} database entries, Updated {} entries, {} missing entries, Deleted {} entries",
            self.created, self.updated, self.missing, self.deleted
        )
    }
}

/// Paging ends on an empty page or a short page.
///
/// A collection that is an exact multiple of `page_size` therefore costs one
/// extra request that returns nothing.
pub fn should_stop_paging(returned: usize, page_size: usize) -> bool {
    returned == 0 || returned < page_size
}

/// Diffs the remote library listing against the local store.
pub struct Reconciler {
    source: Arc<dyn LibrarySource>,
    store: SharedStore,
    hooks: Arc<dyn ReconcileHooks>,
    settings: ReconcileSettings,
    // Held for the duration of a pass
    pass_guard: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn LibrarySource>,
        store: SharedStore,
        hooks: Arc<dyn ReconcileHooks>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            source,
            store,
            hooks,
            settings,
            pass_guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run a pass now, waiting for any pass already in flight to finish first.
    pub async fn reconcile(&self) -> Result<ReconcileStats, ReconcileError> {
        self.reconcile_at(Utc::now()).await
    }

    /// Run a pass unless one is already in flight, in which case `Ok(None)`.
    pub async fn try_reconcile(&self) -> Result<Option<ReconcileStats>, ReconcileError> {
        let Ok(_guard) = self.pass_guard.try_lock() else {
            return Ok(None);
        };
        self.run_pass(Utc::now()).await.map(Some)
    }

    /// Run a pass with an explicit clock reading.
    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> Result<ReconcileStats, ReconcileError> {
        let _guard = self.pass_guard.lock().await;
        self.run_pass(now).await
    }

    async fn run_pass(&self, now: DateTime<Utc>) -> Result<ReconcileStats, ReconcileError> {
        let start = Instant::now();
        let page_size = self.settings.page_size;
        let mut stats = ReconcileStats::default();
        let mut seen: HashSet<String> = HashSet::new();

        info!(
            operation = "reconcile_start",
            source = self.source.source_name(),
            "Beginning sync with {} server...",
            self.source.source_name()
        );

        let mut start_index = 0;
        loop {
            let page = self.source.fetch_page(start_index, page_size).await?;
            let returned = page.len();

            for item in &page.items {
                self.classify_item(item, now, &mut seen, &mut stats).await?;
            }

            start_index += returned;
            if should_stop_paging(returned, page_size) {
                break;
            }
        }

        let refreshed = self.store.lock().await.touch_seen(&seen, now)?;
        debug!(
            operation = "reconcile_seen",
            seen = seen.len(),
            refreshed = refreshed,
            "Refreshed lastSeen for present entries"
        );

        self.sweep_missing(now, &seen, &mut stats).await?;

        info!(
            operation = "reconcile_complete",
            created = stats.created,
            updated = stats.updated,
            missing = stats.missing,
            deleted = stats.deleted,
            items_listed = start_index,
            duration_ms = start.elapsed().as_millis() as u64,
            "Finished syncing... {}",
            stats
        );

        Ok(stats)
    }

    async fn classify_item(
        &self,
        item: &LibraryItem,
        now: DateTime<Utc>,
        seen: &mut HashSet<String>,
        stats: &mut ReconcileStats,
    ) -> Result<(), ReconcileError> {
        let provider_id = item.provider_id();
        let baseline = item.baseline();

        let (Some(provider_id), Some(baseline)) = (provider_id, baseline) else {
            debug!(
                "Skipping item due to missing providerId:{:?} or createdAt:{:?} -- ({})",
                item.provider_id().map(|p| p.key()),
                item.date_created,
                item.display_name()
            );
            return Ok(());
        };

        let key = provider_id.key();
        // First occurrence wins; later items sharing the id (other versions
        // of the same film) are not compared against its fresh baseline.
        if !seen.insert(key.clone()) {
            debug!("Skipping repeated {} ({})", key, item.display_name());
            return Ok(());
        }
        debug!("Processing {} ({})", key, item.display_name());

        let existing = self.store.lock().await.get(&key).cloned();
        match existing {
            None => {
                debug!("New media found {} ({})", key, item.display_name());
                self.hooks
                    .on_added(&provider_id, item)
                    .await
                    .map_err(|e| ReconcileError::hook("on_added", &key, e))?;
                self.store
                    .lock()
                    .await
                    .set(key, MovieEntry::observed(Some(baseline.to_string()), now))?;
                stats.created += 1;
            }
            Some(entry) if entry.baseline.as_deref() != Some(baseline) => {
                debug!(
                    "Media updated date from {:?} to {} -- {} ({})",
                    entry.baseline,
                    baseline,
                    key,
                    item.display_name()
                );
                self.hooks
                    .on_updated(&provider_id, item, &entry)
                    .await
                    .map_err(|e| ReconcileError::hook("on_updated", &key, e))?;
                let refreshed = MovieEntry {
                    baseline: Some(baseline.to_string()),
                    ..entry
                };
                self.store.lock().await.set(key, refreshed)?;
                stats.updated += 1;
            }
            Some(_) => {}
        }

        Ok(())
    }

    async fn sweep_missing(
        &self,
        now: DateTime<Utc>,
        seen: &HashSet<String>,
        stats: &mut ReconcileStats,
    ) -> Result<(), ReconcileError> {
        let entries = self.store.lock().await.entries();

        for (key, entry) in entries {
            if seen.contains(&key) {
                continue;
            }

            self.hooks
                .on_removed(&key, &entry)
                .await
                .map_err(|e| ReconcileError::hook("on_removed", &key, e))?;
            stats.missing += 1;

            let last_seen = entry
                .last_seen_at()
                .map_err(|source| ReconcileError::InvalidLastSeen {
                    provider_id: key.clone(),
                    source,
                })?;

            if now - last_seen > self.settings.forget_after {
                debug!(
                    "Deleting {} from database due to being missing for longer than the forget duration.",
                    key
                );
                self.store.lock().await.delete(&key)?;
                stats.deleted += 1;
            }
        }

        Ok(())
    }
}
