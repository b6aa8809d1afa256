use std::{io, ops::Not, path::PathBuf};

use eframe::egui;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alarm::Unit;

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't find a config directory")]
    NoConfigDir,
    #[error("couldn't read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("couldn't parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// path of the alarm sound, or name of a sound in [`Config::sounds_path`]
    pub sound: String,
    pub volume: f32,
    /// unit preselected when the app starts
    pub unit: Unit,
    pub time_format: String,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sound: "alarm.wav".to_string(),
            volume: 100.0,
            unit: Unit::Minutes,
            time_format: "%l:%M:%S %p".to_string(),
            theme: Theme::Dark,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read or isn't a valid config
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(&path) {
            Ok(config) => config,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&config).map_err(|source| ConfigError::Parse { path, source })
    }

    /// falls back to the default config if there is no usable config file
    #[must_use]
    pub fn load_or_default(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            log::warn!("{}, using default config", ConfigError::NoConfigDir);
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err}, using default config");
                Self::default()
            }
        }
    }

    /// # Errors
    /// if the config can't be serialized or written
    pub fn save(&self, path: PathBuf) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            if let Err(source) = std::fs::create_dir_all(parent) {
                return Err(ConfigError::Write { path, source });
            }
        }
        std::fs::write(&path, config).map_err(|source| ConfigError::Write { path, source })
    }

    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        let mut path = directories::ProjectDirs::from("", "", "countdown_alarm")?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Some(path)
    }

    #[must_use]
    pub fn sounds_path() -> Option<PathBuf> {
        let mut path = directories::ProjectDirs::from("", "", "countdown_alarm")?
            .data_dir()
            .to_path_buf();
        path.push("sounds");
        Some(path)
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_some_and(|path| path.exists())
    }
}
