pub mod error;
pub mod hooks;
pub mod reconcile;
pub mod store;
pub mod webhook;

pub use error::ReconcileError;
pub use hooks::{NoopHooks, ReconcileHooks};
pub use reconcile::{should_stop_paging, ReconcileSettings, ReconcileStats, Reconciler, DEFAULT_PAGE_SIZE};
pub use store::{JsonStore, SharedStore, StoreError};
pub use webhook::{handle_webhook, WebhookEvent, WebhookOutcome};
