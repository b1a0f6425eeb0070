//! Console configuration file.
//!
//! Loaded from `$XDG_CONFIG_HOME/opsview/config.toml`; every field has a
//! default so a missing or partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub displays: DisplaysConfig,
    #[serde(default)]
    pub symbols: SymbolsConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

/// Where display markup files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaysConfig {
    #[serde(default = "default_displays_dir")]
    pub dir: PathBuf,
}

/// Where symbol library files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolsConfig {
    #[serde(default = "default_symbols_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Redraw cadence. Dispatch runs per inbound delivery; digest runs on
    /// this fixed interval regardless of sample rate.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl ConsoleConfig {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("opsview")
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults when the file is
    /// absent or unreadable.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for DisplaysConfig {
    fn default() -> Self {
        Self { dir: default_displays_dir() }
    }
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self { dir: default_symbols_dir() }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self { interval_ms: default_interval_ms() }
    }
}

fn opsview_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opsview")
}

fn default_displays_dir() -> PathBuf {
    opsview_data_dir().join("displays")
}

fn default_symbols_dir() -> PathBuf {
    opsview_data_dir().join("symlib")
}

fn default_interval_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config.digest.interval_ms, 500);
        assert!(config.displays.dir.ends_with("displays"));
    }

    #[test]
    fn test_partial_file_overrides_one_field() {
        let config: ConsoleConfig =
            toml::from_str("[digest]\ninterval_ms = 100\n").unwrap();
        assert_eq!(config.digest.interval_ms, 100);
        assert!(config.symbols.dir.ends_with("symlib"));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = ConsoleConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.digest.interval_ms, 500);
    }
}
