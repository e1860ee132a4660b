use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::models::PlaylistItem;
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// The playlist: one entry per live channel, in display order.
    #[serde(default)]
    pub channels: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Upper bound between two schedule refetches, even when the live
    /// program ends later (or there is none).
    #[serde(default = "default_fallback_refresh_secs")]
    pub fallback_refresh_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Channel selected on startup; falls back to the first channel.
    #[serde(default)]
    pub initial_channel: Option<String>,
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
    /// Width of one channel card in the grid, in columns.
    #[serde(default = "default_grid_card_width")]
    pub grid_card_width: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fallback_refresh_secs: default_fallback_refresh_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            initial_channel: None,
            auto_update: default_auto_update(),
            grid_card_width: default_grid_card_width(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_fallback_refresh_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_auto_update() -> bool {
    true
}

fn default_grid_card_width() -> u16 {
    28
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

impl ScheduleConfig {
    pub fn fallback_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_refresh_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Config {
    /// Load from the platform config path, writing defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8990);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert_eq!(config.schedule.fallback_interval(), Duration::from_secs(300));
        assert!(config.ui.auto_update);
        assert!(config.ui.initial_channel.is_none());
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_parse_playlist() {
        let toml_str = r#"
            [schedule]
            fallback_refresh_secs = 60

            [ui]
            initial_channel = "news"

            [[channels]]
            id = "news"
            title = "News 24"
            catchup_hours = 24
            schedule = "https://example.com/epg/news.json"

            [[channels]]
            id = "movies"
            title = "Movies"
            schedule = "/srv/epg/movies.json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.schedule.fallback_refresh_secs, 60);
        assert_eq!(config.schedule.request_timeout_secs, 10);
        assert_eq!(config.ui.initial_channel.as_deref(), Some("news"));
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].catchup_hours, 24);
        assert_eq!(config.channels[1].catchup_hours, 0);
        assert!(config.http.enabled);
    }

    #[test]
    fn test_load_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.http.port, 8990);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.schedule.fallback_refresh_secs, 300);
    }

    #[test]
    fn test_zero_fallback_is_clamped() {
        let cfg = ScheduleConfig {
            fallback_refresh_secs: 0,
            request_timeout_secs: 0,
        };
        assert_eq!(cfg.fallback_interval(), Duration::from_secs(1));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
