//! Display configuration.

use anyhow::{Context, Result};
use buildwatch_core::{SessionOptions, DEFAULT_RECENT_LINES};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Lines replayed above the failure banner.
    #[serde(default = "default_recent_lines")]
    pub recent_lines: usize,
    /// Set the terminal title while building.
    #[serde(default = "default_set_title")]
    pub set_title: bool,
}

fn default_recent_lines() -> usize {
    DEFAULT_RECENT_LINES
}

fn default_set_title() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_lines: default_recent_lines(),
            set_title: default_set_title(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.recent_lines = config.recent_lines.max(1);
        Ok(config)
    }

    /// Load config from the user config directory, or fall back to defaults.
    pub fn load() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn to_session_options(&self) -> SessionOptions {
        SessionOptions {
            recent_lines: self.recent_lines,
            set_title: self.set_title,
        }
    }
}

/// `<config dir>/buildwatch/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("buildwatch").join("config.toml"))
}
