//! Settings file and API origin resolution.
//!
//! Precedence, highest first: CLI flag, `SIPPY_API_URL` environment variable
//! (read by clap), the settings file, built-in default. The tuning knobs
//! (`confidence`, `pity`, `min_fail`) layer the same way, minus the env var.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API origin, e.g. `https://sippy.dptools.openshift.org`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_fail: Option<u32>,
}

impl Config {
    /// Directory holding the settings file. `SIPPY_CONFIG_DIR` overrides the
    /// platform config dir.
    #[must_use]
    pub fn global_dir() -> PathBuf {
        std::env::var("SIPPY_CONFIG_DIR").map_or_else(
            |_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("sippy")
            },
            PathBuf::from,
        )
    }

    #[must_use]
    pub fn settings_path() -> PathBuf {
        Self::global_dir().join("settings.json")
    }

    /// Load settings, treating a missing file as defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Resolve the API origin, trailing slash trimmed.
    #[must_use]
    pub fn api_base(&self, override_url: Option<&str>) -> String {
        override_url
            .map(ToString::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn settings_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let config = Config {
            api_url: Some("https://sippy.example.com".to_string()),
            confidence: Some(90),
            ..Config::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_settings_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn api_base_precedence() {
        let config = Config {
            api_url: Some("https://from-settings.example.com/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.api_base(Some("http://flag.example.com:8080/")),
            "http://flag.example.com:8080"
        );
        assert_eq!(config.api_base(None), "https://from-settings.example.com");
        assert_eq!(Config::default().api_base(None), DEFAULT_API_BASE);
    }
}
