//! Optional user configuration from `~/.config/sdk85/config.toml`.
//! Command-line flags override anything set here.

use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitor image loaded when no path is given on the command line.
    pub monitor_hex: Option<PathBuf>,
    /// Make RIM clear the RST pending bits on read (datasheet behavior);
    /// off by default to match the board the monitor was written for.
    pub rim_clears_pending: bool,
    /// Verify Intel HEX record checksums while loading.
    pub verify_hex_checksums: bool,
}

impl Config {
    pub fn load() -> Self {
        let Some(dir) = dirs::config_dir() else {
            return Self::default();
        };
        let path = dir.join("sdk85").join("config.toml");
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
