//! User configuration loaded from `config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use vibediff_core::ResolutionMode;

const APP_DIR: &str = "vibediff";
const STORE_FILE: &str = "saved-diffs.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tracing filter used when neither `--log-level` nor `VIBEDIFF_LOG` is set
    pub log_level: Option<String>,
    pub diff: DiffConfig,
    pub merge: MergeConfig,
    pub store: StoreConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Give up refining the diff after this many milliseconds
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub mode: ResolutionMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Location of the saved-diffs file
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub line_numbers: bool,
    pub tab_width: usize,
    pub color: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
            tab_width: 4,
            color: true,
        }
    }
}

impl Config {
    /// Default config location, e.g. `~/.config/vibediff/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load the config. An explicit path must exist; the default path may be
    /// absent, in which case defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Where saved diffs live, e.g. `~/.local/share/vibediff/saved-diffs.json`
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.store.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(STORE_FILE))
            .unwrap_or_else(|| PathBuf::from(STORE_FILE))
    }

    pub fn diff_timeout(&self) -> Option<Duration> {
        self.diff.timeout_ms.map(Duration::from_millis)
    }
}
