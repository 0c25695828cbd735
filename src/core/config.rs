use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_monitor::DEFAULT_DENYLIST;
use crate::error::MonitorError;

/// Library names tried, in order, when binding the NVIDIA management library
pub const DEFAULT_NVML_LIBRARIES: &[&str] = &["libnvidia-ml.so", "libnvidia-ml.so.1"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mount point of procfs
    pub proc_root: PathBuf,
    /// Mount point of sysfs
    pub sys_root: PathBuf,
    /// Mount table listing the filesystems to report
    pub mounts_file: PathBuf,
    /// Device name prefixes never reported as disks
    pub disk_denylist: Vec<String>,
    pub nvml_libraries: Vec<String>,
    /// Used when RUST_LOG is not set
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            mounts_file: PathBuf::from("/etc/mtab"),
            disk_denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            nvml_libraries: DEFAULT_NVML_LIBRARIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, defaults when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Reject settings the collector cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        for (name, path) in [
            ("proc_root", &self.proc_root),
            ("sys_root", &self.sys_root),
            ("mounts_file", &self.mounts_file),
        ] {
            if !path.is_absolute() {
                return Err(MonitorError::config(format!(
                    "{} must be an absolute path, got {:?}",
                    name, path
                )));
            }
        }

        if let Some(level) = &self.log_level {
            if level.parse::<log::LevelFilter>().is_err() {
                return Err(MonitorError::config(format!(
                    "unknown log_level {:?}",
                    level
                )));
            }
        }

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("hostmon").join("config.json"))
    }
}
