use anyhow::Result;
use std::path::PathBuf;

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("LIBRARYWATCH_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("librarywatch");

        Ok(Self::with_base(base_dir))
    }

    /// Config file at `base`, the store under `base/data`
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            data_dir: base.join("data"),
            config_dir: base,
        }
    }

    pub fn from_docker_env() -> Self {
        Self::with_base(container_base_path())
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("db.json")
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory; its presence means Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let paths = PathManager::with_base(PathBuf::from("/srv/lw"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/lw/config.toml"));
        assert_eq!(paths.store_file(), PathBuf::from("/srv/lw/data/db.json"));
    }
}
