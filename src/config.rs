//! Runner settings persisted as JSON next to the executable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::Zones;
use crate::error::Result;

const CONFIG_FILENAME: &str = "padbind_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Applied to every axis of every controller, overriding profile defaults
    pub dead_zone: Option<f64>,
    pub hot_zone: Option<f64>,
    /// Longest the binder waits for input before re-checking for shutdown
    pub poll_timeout_ms: u64,
    /// Log every event the binder receives
    pub log_events: bool,
    /// Extra JSON controller profiles
    pub profiles: Vec<PathBuf>,
    pub sysfs_root: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dead_zone: None,
            hot_zone: None,
            poll_timeout_ms: 500,
            log_events: false,
            profiles: Vec::new(),
            sysfs_root: PathBuf::from("/sys"),
        }
    }
}

impl InputConfig {
    pub fn load() -> Option<Self> {
        let path = Self::config_path();
        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return Some(config),
                Err(e) => {
                    log::error!("Failed to load config {:?}: {}", path, e);
                }
            }
        }
        None
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILENAME)
    }

    pub fn zones(&self) -> Zones {
        Zones {
            dead_zone: self.dead_zone,
            hot_zone: self.hot_zone,
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}
