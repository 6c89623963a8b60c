//! `strata.json` configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strata_graph::LayoutConfig;
use thiserror::Error;
use tracing::debug;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "strata.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub layout: LayoutConfig,
    pub server: ServerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
    pub debounce_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: 8080,
            debounce_ms: 150,
        }
    }
}

impl StrataConfig {
    /// Loads the first config found in the working directory or the user
    /// config dir, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let user_dir = dirs::config_dir().map(|dir| dir.join("strata"));
        Self::load_from_dirs(Path::new("."), user_dir.as_deref())
    }

    pub fn load_from_dirs(work_dir: &Path, user_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = std::iter::once(work_dir.join(CONFIG_FILE))
            .chain(user_dir.map(|dir| dir.join("config.json")));

        for path in candidates {
            if path.is_file() {
                return Self::load_file(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
