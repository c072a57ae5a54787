pub mod emby;
pub mod error;
pub mod traits;

pub use emby::EmbyClient;
pub use error::SourceError;
pub use traits::LibrarySource;
