pub mod config;
pub mod duration;
pub mod paths;

pub use config::{Config, EmbyConfig, ServerConfig, StoreConfig, SyncConfig};
pub use duration::{parse_duration, DurationError};
pub use paths::{container_base_path, PathManager};
