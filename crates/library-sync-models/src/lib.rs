pub mod library_item;
pub mod movie_entry;
pub mod provider_id;
pub mod webhook;

pub use library_item::{ItemsPage, LibraryItem};
pub use movie_entry::{format_timestamp, LastSeenError, MovieEntry};
pub use provider_id::{Namespace, ProviderId, ProviderIdError, ProviderIds};
pub use webhook::WebhookPayload;
