//! Configuration storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::media::validator::MediaLimits;
use crate::speech::SpeechSettings;

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-category attachment size ceilings.
    pub media: MediaLimits,
    /// Read-aloud preferences.
    pub voice: VoiceConfig,
}

/// Read-aloud preferences.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Master switch for audible feedback.
    pub enabled: bool,
    /// Read assistant responses aloud automatically.
    pub auto_read: bool,
    #[serde(flatten)]
    pub settings: SpeechSettings,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_read: true,
            settings: SpeechSettings::default(),
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "vita", "vita-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, writing defaults on first run
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.media.image_max_mib, 10);
        assert_eq!(config.media.audio_max_mib, 25);
        assert_eq!(config.media.video_max_mib, 100);
        assert!(config.voice.enabled);
        assert!((config.voice.settings.rate - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.media.video_max_mib, config.media.video_max_mib);
        assert_eq!(back.voice.auto_read, config.voice.auto_read);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let back: Config = toml::from_str("[media]\nimageMaxMib = 2\n").unwrap();
        assert_eq!(back.media.image_max_mib, 2);
        assert_eq!(back.media.audio_max_mib, 25);
        assert!(back.voice.enabled);
    }
}
