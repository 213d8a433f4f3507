use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub scroller: ScrollerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Which transport talks to the player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Shell out to the control utility and parse its JSON reply.
    #[default]
    Cmd,
    /// Persistent socket with pushed state events.
    Socket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// Control utility used by the `cmd` source.
    #[serde(default = "default_command")]
    pub command: String,
    /// `host:port` of the player's event socket, used by the `socket` source.
    #[serde(default = "default_socket_addr")]
    pub socket_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// How often the footer's network details are re-read.
    #[serde(default = "default_network_interval_ms")]
    pub network_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollerConfig {
    #[serde(default = "default_scroll_interval_ms")]
    pub interval_ms: u64,
    /// Appended to the title so the wrap-around is visible.
    #[serde(default = "default_scroll_padding")]
    pub padding: String,
    /// Characters shifted per tick.
    #[serde(default = "default_scroll_increment")]
    pub increment: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_label")]
    pub label: String,
    /// chrono format string for the header clock.
    #[serde(default = "default_clock_format")]
    pub clock_format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            command: default_command(),
            socket_addr: default_socket_addr(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            network_interval_ms: default_network_interval_ms(),
        }
    }
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_scroll_interval_ms(),
            padding: default_scroll_padding(),
            increment: default_scroll_increment(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            clock_format: default_clock_format(),
        }
    }
}

fn default_command() -> String {
    "volumio".to_string()
}

fn default_socket_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_network_interval_ms() -> u64 {
    5000
}

fn default_scroll_interval_ms() -> u64 {
    500
}

fn default_scroll_padding() -> String {
    "   ".to_string()
}

fn default_scroll_increment() -> usize {
    1
}

fn default_label() -> String {
    "VOLUMIO".to_string()
}

fn default_clock_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

impl Config {
    /// Load from the default location, writing a default file on first run.
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

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.kind, SourceKind::Cmd);
        assert_eq!(config.source.command, "volumio");
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.polling.network_interval_ms, 5000);
        assert_eq!(config.scroller.interval_ms, 500);
        assert_eq!(config.scroller.increment, 1);
        assert_eq!(config.display.label, "VOLUMIO");
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.source.socket_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[source]\nkind = \"socket\"\nsocket_addr = \"volumio.local:3000\"\n\n[scroller]\nincrement = 2\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.source.kind, SourceKind::Socket);
        assert_eq!(config.source.socket_addr, "volumio.local:3000");
        assert_eq!(config.source.command, "volumio");
        assert_eq!(config.scroller.increment, 2);
        assert_eq!(config.scroller.padding, "   ");
        assert_eq!(config.polling.interval_ms, 1000);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source\nkind=").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
