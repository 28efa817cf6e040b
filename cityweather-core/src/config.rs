use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1";
pub const DEFAULT_TELEMETRY_URL: &str = "http://localhost:5000/log";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// geocoding_url = "https://geocoding-api.open-meteo.com/v1"
/// weather_url = "https://api.open-meteo.com/v1"
/// telemetry_url = "http://localhost:5000/log"
/// request_timeout_secs = 10
/// ```
///
/// Leaving `telemetry_url` out of the file switches telemetry off. With no
/// file at all the local sink is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the geocoding API; `/search` is appended.
    pub geocoding_url: String,

    /// Base URL of the forecast API; `/forecast` is appended.
    pub weather_url: String,

    /// Full URL of the selection log sink. `None` disables telemetry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_url: Option<String>,

    pub request_timeout_secs: u64,

    /// Where the view history is stored. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            telemetry_url: Some(DEFAULT_TELEMETRY_URL.to_string()),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl Config {
    /// The sink URL, if telemetry is switched on.
    pub fn telemetry_endpoint(&self) -> Option<&str> {
        self.telemetry_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents).with_context(|| {
            format!(
                "Failed to parse config file: {}\n\
                 Hint: run `cityweather configure` to rewrite it.",
                path.display()
            )
        })?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
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
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted history.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_open_meteo_and_local_sink() {
        let cfg = Config::default();

        assert_eq!(cfg.geocoding_url, "https://geocoding-api.open-meteo.com/v1");
        assert_eq!(cfg.weather_url, "https://api.open-meteo.com/v1");
        assert_eq!(cfg.telemetry_endpoint(), Some("http://localhost:5000/log"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config {
            telemetry_url: None,
            request_timeout_secs: 3,
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.telemetry_endpoint(), None);
        assert_eq!(loaded.data_dir().unwrap(), dir.path());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "weather_url = \"http://127.0.0.1:9000\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.weather_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.geocoding_url, DEFAULT_GEOCODING_URL);
        assert_eq!(cfg.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn file_without_telemetry_url_disables_telemetry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "weather_url = \"http://x\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.telemetry_url, None);
        assert_eq!(cfg.telemetry_endpoint(), None);
    }

    #[test]
    fn default_config_round_trips_with_telemetry_on() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.telemetry_endpoint(), Some(DEFAULT_TELEMETRY_URL));
    }

    #[test]
    fn unparsable_file_mentions_configure_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("cityweather configure"));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config { request_timeout_secs: 0, ..Config::default() };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
