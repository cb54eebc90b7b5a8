use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::model::{DisplayUnit, LocationQuery, UnitToggle};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 900;

/// Fixed coordinates used in place of device geolocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<HomeLocation> for LocationQuery {
    fn from(home: HomeLocation) -> Self {
        LocationQuery::coordinates(home.latitude, home.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "London"
/// unit = "fahrenheit"
///
/// [home]
/// latitude = 51.5
/// longitude = -0.12
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// City shown when geolocation is unavailable at startup.
    pub default_city: String,

    pub unit: DisplayUnit,

    pub unit_toggle: UnitToggle,

    pub refresh_interval_secs: u64,

    /// Override for the OpenWeather API root, e.g. a proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<HomeLocation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            unit: DisplayUnit::default(),
            unit_toggle: UnitToggle::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            api_base_url: None,
            home: None,
        }
    }
}

impl Config {
    /// API key from the environment, else from the file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
