//! ConfigStore — reads the module file on demand.
//!
//! Every scrape calls [`ConfigStore::load`]. By default the file is read
//! and parsed each time, so edits take effect on the next scrape. The
//! optional modification-time cache keeps that property while skipping the
//! parse when the file has not changed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::debug;

use crate::error::ConfigError;
use crate::model::Configuration;

/// Module file location, relative to the process working directory.
pub const DEFAULT_CONFIG_PATH: &str = "conf/conf.yml";

struct CachedConfig {
    modified: SystemTime,
    config: Configuration,
}

/// Source of [`Configuration`] for scrape requests.
pub struct ConfigStore {
    path: PathBuf,
    cache: Option<Mutex<Option<CachedConfig>>>,
}

impl ConfigStore {
    /// A store that re-reads `path` on every load.
    ///
    /// Relative paths are joined onto the working directory at load time.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Enable the read-through cache keyed on the file's modification time.
    pub fn with_mtime_cache(mut self) -> Self {
        self.cache = Some(Mutex::new(None));
        self
    }

    /// Load the module file.
    pub fn load(&self) -> Result<Configuration, ConfigError> {
        let path = self.absolute_path()?;

        let Some(cache) = &self.cache else {
            return read_config(&path);
        };

        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|source| ConfigError::Unreadable {
                path: path.clone(),
                source,
            })?;

        let mut cached = cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = cached.as_ref()
            && entry.modified == modified
        {
            return Ok(entry.config.clone());
        }

        let config = read_config(&path)?;
        debug!(path = %path.display(), modules = config.modules.len(), "module file cached");
        *cached = Some(CachedConfig {
            modified,
            config: config.clone(),
        });
        Ok(config)
    }

    fn absolute_path(&self) -> Result<PathBuf, ConfigError> {
        if self.path.is_absolute() {
            return Ok(self.path.clone());
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.path))
            .map_err(|source| ConfigError::Unreadable {
                path: self.path.clone(),
                source,
            })
    }
}

fn read_config(path: &Path) -> Result<Configuration, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse module file contents. An empty or null document has no modules.
pub(crate) fn parse_config(content: &str) -> Result<Configuration, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Configuration::default());
    }
    let config: Option<Configuration> =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Malformed { source })?;
    Ok(config.unwrap_or_default())
}
