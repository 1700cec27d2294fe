use pkgdocs::docs::DEFAULT_INDEX_PATH;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

pub const CONFIG_FILE: &str = "pkgdocs.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_highlight")]
    pub highlight: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_index_path() -> String {
    DEFAULT_INDEX_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_highlight() -> bool {
    true
}

fn default_theme() -> String {
    "base16-ocean.dark".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_path: default_index_path(),
            timeout_secs: default_timeout_secs(),
            highlight: default_highlight(),
            theme: default_theme(),
        }
    }
}

impl Config {
    /// Load `path` (or `pkgdocs.toml`), falling back to defaults when the
    /// file is missing or unusable.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);

        if !config_path.exists() {
            return Config::default();
        }

        match Self::read(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using default configuration", e);
                Config::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where to fetch the index from.
    ///
    /// `index_path` is joined to `base_url` unless it is already a URL or
    /// `base_url` is empty, in which case it is used as-is (a URL or a file).
    pub fn index_location(&self) -> String {
        let is_url =
            self.index_path.starts_with("http://") || self.index_path.starts_with("https://");
        if is_url || self.base_url.is_empty() {
            return self.index_path.clone();
        }

        let base = self.base_url.trim_end_matches('/');
        if self.index_path.starts_with('/') {
            format!("{}{}", base, self.index_path)
        } else {
            format!("{}/{}", base, self.index_path)
        }
    }
}
