use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    location::{LocationOptions, SimulatedCourse},
    tracking::TrackingConfig,
};

pub const DATA_DIR_ENV: &str = "JOGGA_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "jogga-data";
pub const CONFIG_FILE: &str = "settings.json";

/// Timing of the scripted session the command-line shell plays through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DemoConfig {
    pub run_seconds: u64,
    pub pause_seconds: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            run_seconds: 30,
            pause_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub location: LocationOptions,
    pub simulation: SimulatedCourse,
    pub demo: DemoConfig,
}

/// Directory holding the database, snapshot and settings files.
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Loads `path`, falling back to defaults when the file is missing or unreadable.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> AppConfig {
        *self.read()
    }

    pub fn tracking(&self) -> TrackingConfig {
        self.read().tracking
    }

    pub fn update_tracking(&self, tracking: TrackingConfig) -> Result<()> {
        let mut guard = self.write();
        guard.tracking = tracking;
        self.persist(&guard)
    }

    /// Writes the current settings out, so a fresh install gets an editable file.
    pub fn save(&self) -> Result<()> {
        self.persist(&self.read())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, AppConfig> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppConfig> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
