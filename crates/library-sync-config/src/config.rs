use crate::duration::{parse_duration, DurationError};
use crate::paths::PathManager;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Same effect as `-v` on the command line
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub emby: EmbyConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbyConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    /// User whose library view is listed (`/Users/{id}/Items`)
    #[serde(default)]
    pub library_user: String,
    #[serde(default = "default_item_types")]
    pub item_types: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_forget_time")]
    pub forget_time: String,
    #[serde(default)]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_item_types() -> String {
    "Movie,Episode".to_string()
}

fn default_request_timeout() -> String {
    "60s".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_forget_time() -> String {
    "30d".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for EmbyConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            library_user: String::new(),
            item_types: default_item_types(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            forget_time: default_forget_time(),
            run_on_startup: false,
        }
    }
}

impl EmbyConfig {
    pub fn request_timeout(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.request_timeout)
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.interval)
    }

    pub fn forget_after(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.forget_time)
    }
}

/// `"true"` in any case enables a flag; anything else disables it.
fn env_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` when it exists (defaults otherwise), then apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override file settings with the deployment environment variables.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = lookup("EMBY_URL") {
            self.emby.url = url;
        }
        if let Some(key) = lookup("EMBY_API_KEY") {
            self.emby.api_key = key;
        }
        if let Some(user) = lookup("EMBY_LIBRARY_VIEW_USER") {
            self.emby.library_user = user;
        }
        if let Some(path) = lookup("DB_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(interval) = lookup("SYNC_INTERVAL") {
            self.sync.interval = interval;
        }
        if let Some(forget) = lookup("FORGET_TIME") {
            self.sync.forget_time = forget;
        }
        if let Some(flag) = lookup("PERFORM_INITIAL_SYNC") {
            self.sync.run_on_startup = env_flag(&flag);
        }
        if let Some(flag) = lookup("DEBUG") {
            self.debug = env_flag(&flag);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.emby.url.trim().is_empty() {
            return Err(anyhow::anyhow!("emby.url is required (or set EMBY_URL)"));
        }
        if self.emby.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("emby.api_key is required (or set EMBY_API_KEY)"));
        }
        if self.emby.library_user.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "emby.library_user is required (or set EMBY_LIBRARY_VIEW_USER)"
            ));
        }

        self.emby
            .request_timeout()
            .map_err(|e| anyhow::anyhow!("emby.request_timeout: {}", e))?;
        let interval = self
            .sync
            .interval()
            .map_err(|e| anyhow::anyhow!("sync.interval: {}", e))?;
        if interval.is_zero() {
            return Err(anyhow::anyhow!("sync.interval must be greater than zero"));
        }
        self.sync
            .forget_after()
            .map_err(|e| anyhow::anyhow!("sync.forget_time: {}", e))?;

        Ok(())
    }

    pub fn store_path(&self, paths: &PathManager) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| paths.store_file())
    }

    /// Copy safe for display; the api key is reduced to its last four characters.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.emby.api_key = mask_secret(&self.emby.api_key);
        masked
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn valid_config() -> Config {
        Config {
            emby: EmbyConfig {
                url: "http://emby.local:8096".to_string(),
                api_key: "0123456789abcdef".to_string(),
                library_user: "user-1".to_string(),
                ..EmbyConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = valid_config();
        config.sync.forget_time = "7d".to_string();

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.emby.url, "http://emby.local:8096");
        assert_eq!(loaded.emby.library_user, "user-1");
        assert_eq!(loaded.sync.forget_time, "7d");
        assert_eq!(loaded.server.port, 3000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [emby]
            url = "http://emby"
            api_key = "k"
            library_user = "u"
            "#,
        )
        .unwrap();
        assert_eq!(config.emby.item_types, "Movie,Episode");
        assert_eq!(config.sync.interval, "1h");
        assert!(!config.sync.run_on_startup);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("EMBY_URL", "http://other:8096"),
            ("EMBY_LIBRARY_VIEW_USER", "abc"),
            ("DB_PATH", "/tmp/db.json"),
            ("SYNC_INTERVAL", "15m"),
            ("FORGET_TIME", "2w"),
            ("PERFORM_INITIAL_SYNC", "TRUE"),
            ("DEBUG", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = valid_config();
        config.debug = true;
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.emby.url, "http://other:8096");
        assert_eq!(config.emby.api_key, "0123456789abcdef");
        assert_eq!(config.emby.library_user, "abc");
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/db.json")));
        assert_eq!(config.sync.interval().unwrap(), Duration::from_secs(900));
        assert_eq!(config.sync.forget_after().unwrap(), Duration::from_secs(14 * 86_400));
        assert!(config.sync.run_on_startup);
        assert!(!config.debug);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config = valid_config();
        assert!(config.validate().is_ok());

        config.sync.forget_time = "whenever".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.sync.interval = "0s".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_masked_hides_api_key() {
        let masked = valid_config().masked();
        assert_eq!(masked.emby.api_key, "************cdef");
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn test_store_path_override() {
        let paths = PathManager::with_base(PathBuf::from("/srv/librarywatch"));
        let mut config = valid_config();
        assert_eq!(config.store_path(&paths), PathBuf::from("/srv/librarywatch/data/db.json"));

        config.store.path = Some(PathBuf::from("/data/movies.json"));
        assert_eq!(config.store_path(&paths), PathBuf::from("/data/movies.json"));
    }
}
