//! User preferences and their persistence.
//!
//! Settings are stored as one JSON blob under [`SETTINGS_KEY`]. Loading never
//! fails: an absent or malformed blob yields the defaults, and a blob holding
//! only some keys is merged over the defaults key by key.

use crate::error::{DashboardError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

pub const SETTINGS_KEY: &str = "dashboardSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Area,
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            "area" => Ok(Self::Area),
            other => Err(format!("unknown chart type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Green,
    Purple,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "dark" => Ok(Self::Dark),
            "green" => Ok(Self::Green),
            "purple" => Ok(Self::Purple),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Percent, 0-100.
    pub cpu_threshold: u8,
    pub ram_threshold: u8,
    pub disk_threshold: u8,
    #[serde(rename = "refreshInterval")]
    pub refresh_interval_seconds: u32,
    pub enable_notifications: bool,
    pub enable_sounds: bool,
    pub chart_type: ChartType,
    pub theme: Theme,
    pub show_animations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpu_threshold: 85,
            ram_threshold: 90,
            disk_threshold: 95,
            refresh_interval_seconds: 2,
            enable_notifications: true,
            enable_sounds: false,
            chart_type: ChartType::Line,
            theme: Theme::Default,
            show_animations: true,
        }
    }
}

impl Settings {
    fn is_valid(&self) -> bool {
        self.cpu_threshold <= 100
            && self.ram_threshold <= 100
            && self.disk_threshold <= 100
            && self.refresh_interval_seconds >= 1
    }
}

/// Opaque key/value storage for serialized blobs.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Owns the live [`Settings`] and the blob store they persist to.
///
/// All mutation goes through the setters so that consumers only ever see a
/// validated value.
pub struct SettingsStore {
    store: Box<dyn BlobStore>,
    current: Settings,
}

impl SettingsStore {
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self {
            store,
            current: Settings::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.current
    }

    pub fn blob_store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Reads the persisted blob and merges it over the defaults.
    pub fn load(&mut self) -> Settings {
        let loaded = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => merge_over_defaults(&raw).unwrap_or_else(|err| {
                warn!("[settings] {err}; using defaults");
                Settings::default()
            }),
            Ok(None) => {
                debug!("[settings] nothing persisted; using defaults");
                Settings::default()
            }
            Err(err) => {
                warn!("[settings] failed to read stored settings: {err}");
                Settings::default()
            }
        };
        self.current = loaded.clone();
        loaded
    }

    /// Persists `settings` and makes them current.
    pub fn save(&mut self, settings: &Settings) -> Result<()> {
        let raw = serde_json::to_string(settings)
            .map_err(|err| DashboardError::Persistence(err.to_string()))?;
        self.store.put(SETTINGS_KEY, &raw)?;
        self.current = settings.clone();
        info!("[settings] saved");
        Ok(())
    }

    pub fn save_current(&mut self) -> Result<()> {
        let current = self.current.clone();
        self.save(&current)
    }

    /// Drops the persisted blob; the live settings revert to defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(SETTINGS_KEY)?;
        self.current = Settings::default();
        info!("[settings] reset to defaults");
        Ok(())
    }

    pub fn set_cpu_threshold(&mut self, pct: u8) {
        self.current.cpu_threshold = pct.min(100);
    }

    pub fn set_ram_threshold(&mut self, pct: u8) {
        self.current.ram_threshold = pct.min(100);
    }

    pub fn set_disk_threshold(&mut self, pct: u8) {
        self.current.disk_threshold = pct.min(100);
    }

    pub fn set_refresh_interval(&mut self, seconds: u32) {
        self.current.refresh_interval_seconds = seconds.max(1);
    }

    pub fn set_notifications(&mut self, enabled: bool) {
        self.current.enable_notifications = enabled;
    }

    pub fn set_sounds(&mut self, enabled: bool) {
        self.current.enable_sounds = enabled;
    }

    pub fn set_show_animations(&mut self, enabled: bool) {
        self.current.show_animations = enabled;
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.current.chart_type = chart_type;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.current.theme = theme;
    }

    /// Flips between the dark and default themes and returns the new one.
    pub fn toggle_dark_mode(&mut self) -> Theme {
        self.current.theme = if self.current.theme == Theme::Dark {
            Theme::Default
        } else {
            Theme::Dark
        };
        self.current.theme
    }
}

fn merge_over_defaults(raw: &str) -> Result<Settings> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| DashboardError::Persistence(format!("malformed JSON: {err}")))?;
    let Value::Object(persisted) = parsed else {
        return Err(DashboardError::Persistence(
            "stored value is not an object".to_string(),
        ));
    };

    let defaults = Settings::default();
    let mut merged: Map<String, Value> = match serde_json::to_value(&defaults) {
        Ok(Value::Object(map)) => map,
        _ => return Ok(defaults),
    };

    for (key, value) in persisted {
        let Some(previous) = merged.get(&key).cloned() else {
            debug!("[settings] ignoring unknown key '{key}'");
            continue;
        };
        merged.insert(key.clone(), value);
        let accepted = serde_json::from_value::<Settings>(Value::Object(merged.clone()))
            .map(|candidate| candidate.is_valid())
            .unwrap_or(false);
        if !accepted {
            warn!("[settings] stored value for '{key}' is invalid; keeping default");
            merged.insert(key, previous);
        }
    }

    serde_json::from_value(Value::Object(merged))
        .map_err(|err| DashboardError::Persistence(err.to_string()))
}
