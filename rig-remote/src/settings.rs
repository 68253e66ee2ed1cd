//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use rig_client::{ClientConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS};
use rig_protocol::DEFAULT_RIGCTLD_PORT;
use rig_proxy::{ProxyConfig, DEFAULT_LOCAL_PORT};
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Remote rigctld host
    pub host: String,
    /// Remote rigctld port
    pub rigctld_port: u16,
    /// Start the pass-through proxy
    pub proxy_enabled: bool,
    /// Local port the proxy tries first
    pub proxy_port: u16,
    /// Reconnect attempts after a lost connection
    pub max_reconnect_attempts: u32,
    /// Delay between reconnect attempts in milliseconds
    pub reconnect_delay_ms: u64,
    /// Radio state polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            rigctld_port: DEFAULT_RIGCTLD_PORT,
            proxy_enabled: true,
            proxy_port: DEFAULT_LOCAL_PORT,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay_ms: 2000,
            poll_interval_ms: 1000,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for rigremote
    /// Uses $XDG_CONFIG_HOME/rigremote on Linux/macOS, falls back to ~/.config/rigremote
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("rigremote"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("rigremote"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Client configuration for these settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            ..Default::default()
        }
    }

    /// Proxy configuration for these settings
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            remote_host: self.host.clone(),
            remote_port: self.rigctld_port,
            preferred_local_port: self.proxy_port,
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}
