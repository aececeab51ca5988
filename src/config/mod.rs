//! Configuration management for cinetrack

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::models::{DEFAULT_IMAGE_BASE, DEFAULT_POSTER_SIZE};
use crate::client::tmdb::{API_BASE_URL, DEFAULT_LANGUAGE, DEFAULT_RATE_LIMIT_PER_SECOND};
use crate::client::{ClientSettings, ImageConfig};
use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// TMDB API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Metadata API base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Response language sent to the API
    #[serde(default = "default_language")]
    pub language: String,

    /// Poster image base URL
    #[serde(default = "default_image_base")]
    pub image_base: String,

    /// Poster size segment, e.g. `w342`
    #[serde(default = "default_poster_size")]
    pub poster_size: String,

    /// Deadline for a single search request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long a removal can be undone
    #[serde(default = "default_undo_window_secs")]
    pub undo_window_secs: u64,

    /// Client-side request rate
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_second: u32,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.to_string()
}

fn default_poster_size() -> String {
    DEFAULT_POSTER_SIZE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_undo_window_secs() -> u64 {
    6
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT_PER_SECOND
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            format: None,
            language: default_language(),
            image_base: default_image_base(),
            poster_size: default_poster_size(),
            request_timeout_secs: default_request_timeout_secs(),
            undo_window_secs: default_undo_window_secs(),
            rate_limit_per_second: default_rate_limit(),
        }
    }
}

impl Preferences {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".cinetrack").join("config.yaml"))
    }

    /// Resolve an explicit path or fall back to the default
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from `path` or the default location
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration, treating a missing file as an empty config
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match Self::load_at(path) {
            Err(crate::error::Error::Config(ConfigError::NotFound)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to `path` or the default location
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// The API key, or `MissingApiKey` when unset or blank
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey.into())
    }

    /// Client settings derived from this configuration
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self
                .api_base
                .clone()
                .unwrap_or_else(|| API_BASE_URL.to_string()),
            language: self.preferences.language.clone(),
            images: ImageConfig {
                base: self.preferences.image_base.clone(),
                poster_size: self.preferences.poster_size.clone(),
            },
            rate_limit_per_second: self.preferences.rate_limit_per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(config.api_base.is_none());
        assert_eq!(config.preferences.language, "es-ES");
        assert_eq!(config.preferences.request_timeout_secs, 8);
        assert_eq!(config.preferences.undo_window_secs, 6);
        assert_eq!(config.preferences.rate_limit_per_second, 40);
    }

    #[test]
    fn test_partial_preferences_use_defaults() {
        let config: Config =
            serde_yaml::from_str("api_key: abc\npreferences:\n  language: en-US\n").unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.preferences.language, "en-US");
        assert_eq!(config.preferences.poster_size, "w342");
        assert_eq!(config.preferences.request_timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.api_key = Some("secret".to_string());
        config.preferences.undo_window_secs = 10;
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path.clone()).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.preferences.undo_window(), Duration::from_secs(10));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = Config::load_from(path).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::NotFound)
        ));

        let missing = dir.path().join("absent.yaml");
        let config = Config::load_or_default(missing.to_str()).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(config.require_api_key().is_err());

        config.api_key = Some("   ".to_string());
        assert!(config.require_api_key().is_err());

        config.api_key = Some("key".to_string());
        assert_eq!(config.require_api_key().unwrap(), "key");
    }

    #[test]
    fn test_client_settings_from_config() {
        let mut config = Config::default();
        config.api_base = Some("http://localhost:1234".to_string());
        config.preferences.poster_size = "w500".to_string();

        let settings = config.client_settings();
        assert_eq!(settings.base_url, "http://localhost:1234");
        assert_eq!(settings.images.poster_size, "w500");
        assert_eq!(settings.language, "es-ES");
    }
}
