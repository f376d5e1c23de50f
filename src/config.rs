use crate::audio::AudioFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Overrides the per-user cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Input device name; the host default when unset
    #[serde(default)]
    pub input_device: Option<String>,

    #[serde(default)]
    pub permissions_granted: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_file_name() -> String {
    "audiotest.wav".to_string()
}

fn default_sample_rate() -> u32 {
    AudioFormat::NARROWBAND_RATE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            file_name: default_file_name(),
            sample_rate: default_sample_rate(),
            input_device: None,
            permissions_granted: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/recplay/config.json)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, creating default config", path);
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("recplay").join("config.json"))
    }

    /// Application-private cache directory holding the recording
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("recplay")
        })
    }

    /// The single recording, overwritten on every new take
    pub fn audio_path(&self) -> PathBuf {
        self.cache_dir().join(&self.file_name)
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::mono(self.sample_rate)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(anyhow::anyhow!("file_name cannot be empty"));
        }

        let plain_name = Path::new(&self.file_name)
            .file_name()
            .is_some_and(|name| name == self.file_name.as_str());
        if !plain_name {
            return Err(anyhow::anyhow!(
                "file_name must be a plain file name, got {:?}",
                self.file_name
            ));
        }

        if !(8000..=48000).contains(&self.sample_rate) {
            return Err(anyhow::anyhow!(
                "sample_rate must be between 8000 and 48000, got {}",
                self.sample_rate
            ));
        }

        if self.input_device.as_deref() == Some("") {
            return Err(anyhow::anyhow!("input_device cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recplay").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.file_name, "audiotest.wav");
        assert_eq!(config.sample_rate, 8000);
        assert!(!config.permissions_granted);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "cache_dir": "/tmp/recplay-test", "permissions_granted": true }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.permissions_granted);
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.audio_path(),
            PathBuf::from("/tmp/recplay-test/audiotest.wav")
        );
    }

    #[test]
    fn test_grant_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::load_from(&path).unwrap();
        config.permissions_granted = true;
        config.save_to(&path).unwrap();

        assert!(Config::load_from(&path).unwrap().permissions_granted);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            file_name: "../escape.wav".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            file_name: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sample_rate: 4000,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            input_device: Some(String::new()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
