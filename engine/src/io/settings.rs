//! Engine settings on disk
//!
//! `{settings_dir}/settings.json` is written through a staging file and a
//! rename. A missing or corrupt file loads as defaults, and older schema
//! versions load with defaults for the new fields.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::EngineConfig;
use crate::core::{CoreError, CoreResult};

/// Current settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Advisory lock file shared by readers and writers
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Persisted settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            engine: EngineConfig::default(),
        }
    }
}

impl AppSettings {
    /// Clamps every value so persisted state is always valid
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;
        self.engine.normalize();
    }
}

/// Advisory lock held for the duration of one settings operation
struct SettingsLock(fs::File);

impl SettingsLock {
    fn acquire(path: &Path, exclusive: bool) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        let locked = if exclusive {
            fs2::FileExt::lock_exclusive(&file)
        } else {
            fs2::FileExt::lock_shared(&file)
        };
        locked.map_err(|e| CoreError::Settings(format!("Failed to lock {:?}: {}", path, e)))?;
        Ok(Self(file))
    }
}

impl Drop for SettingsLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.0) {
            warn!("Failed to release settings lock: {}", e);
        }
    }
}

/// Writes `content` next to `path` and renames it into place
fn write_atomic(path: &Path, content: &str) -> CoreResult<()> {
    let staging = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    // rename does not replace an existing file on Windows
    if cfg!(windows) && path.exists() {
        fs::remove_file(path)?;
    }
    fs::rename(&staging, path)
        .map_err(|e| CoreError::Settings(format!("Failed to move settings into place: {}", e)))
}

/// Loads, saves and resets `settings.json` in one directory
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    fn lock(&self, exclusive: bool) -> CoreResult<SettingsLock> {
        let dir = self.settings_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        SettingsLock::acquire(&dir.join(SETTINGS_LOCK_FILE), exclusive)
    }

    fn read(&self) -> CoreResult<AppSettings> {
        let _lock = self.lock(false)?;
        if !self.settings_path.exists() {
            info!("No settings at {:?}, using defaults", self.settings_path);
            return Ok(AppSettings::default());
        }

        let mut settings: AppSettings =
            serde_json::from_str(&fs::read_to_string(&self.settings_path)?)?;
        if settings.version < SETTINGS_VERSION {
            // Every field has a serde default, so older files only need the bump
            info!(
                "Upgrading settings schema {} -> {}",
                settings.version, SETTINGS_VERSION
            );
        }
        settings.normalize();
        Ok(settings)
    }

    /// Settings on disk, or defaults when the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        self.read().unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings: {}", e);
            AppSettings::default()
        })
    }

    /// Normalizes and persists `settings`, returning what was written
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let _lock = self.lock(true)?;
        let mut normalized = settings.clone();
        normalized.normalize();

        write_atomic(&self.settings_path, &serde_json::to_string_pretty(&normalized)?)?;
        info!("Settings written to {:?}", self.settings_path);
        Ok(normalized)
    }

    /// Deletes the settings file and returns the defaults
    pub fn reset(&self) -> CoreResult<AppSettings> {
        let _lock = self.lock(true)?;
        if self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
            info!("Removed {:?}", self.settings_path);
        }
        Ok(AppSettings::default())
    }
}
