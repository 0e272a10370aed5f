/// User preferences
///
/// Stored as JSON in `$SPECTRO_GUI_HOME/preferences.json`, or
/// `$HOME/.spectro_gui/preferences.json` when the variable is not set.
/// Missing fields take their default value, so older files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable overriding the configuration directory
pub const HOME_ENV: &str = "SPECTRO_GUI_HOME";

const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Default directory of the project dialogs
    pub project_directory: PathBuf,
    pub last_project: Option<PathBuf>,
    /// Reopen `last_project` at startup
    pub autoload: bool,
    pub autosave: bool,
    pub autosave_interval_secs: u64,
    /// Processor catalog replacing the bundled one
    pub catalog_path: Option<PathBuf>,
    /// `env_logger` filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            project_directory: home_dir().unwrap_or_else(|| PathBuf::from(".")),
            last_project: None,
            autoload: true,
            autosave: true,
            autosave_interval_secs: 30,
            catalog_path: None,
            log_filter: "info".to_string(),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Directory holding the preferences file
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        PathBuf::from(dir)
    } else if let Some(home) = home_dir() {
        home.join(".spectro_gui")
    } else {
        PathBuf::from(".spectro_gui")
    }
}

pub fn preferences_path() -> PathBuf {
    config_dir().join(FILE_NAME)
}

impl Preferences {
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Preferences of the configuration directory; defaults when the file
    /// is missing or unreadable
    pub fn load() -> Self {
        let path = preferences_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Preferences {} ignored: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let path = preferences_path();
        self.save_to(&path)?;
        log::debug!("Preferences saved to {}", path.display());
        Ok(())
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    /// Remember an opened project and its directory
    pub fn record_last_project(&mut self, path: &Path) {
        self.last_project = Some(path.to_path_buf());
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.project_directory = dir.to_path_buf();
        }
    }

    /// Project to open at startup
    pub fn autoload_project(&self) -> Option<&Path> {
        self.last_project
            .as_deref()
            .filter(|p| self.autoload && p.exists())
    }
}
