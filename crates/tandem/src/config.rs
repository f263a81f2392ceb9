//! Configuration file support for tandem
//!
//! Config file location: `~/.config/tandem/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [ui]
//! align = true
//! gutter_width = 4
//!
//! [server]
//! base_url = "https://diff.example.net"
//!
//! [diff]
//! setting_general__git_diff_algo = "Histogram"
//! setting_general__tab_size = "4"
//! setting_updates__identify = true
//! ```
//!
//! The `[diff]` table holds the oracle settings catalog; unknown keys and
//! out-of-range values are replaced by their defaults with a warning.

use serde::Deserialize;
use std::path::PathBuf;
use tandem_core::DiffSettings;

/// Display preferences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Start in aligned mode (padded rows) rather than compact.
    pub align: bool,
    /// Digits reserved for line numbers in the gutters.
    pub gutter_width: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            align: true,
            gutter_width: 4,
        }
    }
}

/// Where to reach the diff oracle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the diff service; uploads go to `<base>/upload`.
    pub base_url: Option<String>,
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub server: ServerConfig,
    pub diff: DiffSettings,
}

impl Config {
    /// All possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("tandem").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("tandem").join("config.toml"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("tandem").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// The first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Load config from the XDG config path.
    /// Returns the defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| {
                toml::from_str(&content)
                    .map_err(|e| {
                        eprintln!("Warning: Failed to parse config: {}", e);
                        e
                    })
                    .ok()
            })
            .unwrap_or_default()
    }
}
