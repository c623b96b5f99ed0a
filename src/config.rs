// Configuration module
// Persisted pet settings, the storage port they are written through, and asset paths

use crate::error::ConfigError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// What happens when a non-looping animation finishes on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Replay the same animation, looping
    Keep,
    /// Pick a new random animation
    #[default]
    Random,
}

/// Everything persisted between sessions. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pet_x: i32,
    pub pet_y: i32,
    /// Sound volume (0.0 - 1.0)
    pub volume: f32,
    pub sound_enabled: bool,
    /// Whether the pet may walk around
    pub auto_walk: bool,
    pub dialog_enabled: bool,
    /// Character directory under `<assets>/characters`
    pub character: String,
    pub animation_mode: AnimationMode,
    /// Display scale relative to the base pet size
    pub scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pet_x: 100,
            pet_y: 100,
            volume: 0.5,
            sound_enabled: true,
            auto_walk: true,
            dialog_enabled: true,
            character: "default".to_string(),
            animation_mode: AnimationMode::Random,
            scale: 1.0,
        }
    }
}

/// Where settings are persisted
pub trait ConfigStore {
    /// Read persisted settings; `Ok(None)` when nothing was saved yet
    fn load(&self) -> Result<Option<Settings>, ConfigError>;

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError>;
}

/// Settings stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Option<Settings>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let settings = serde_json::from_str(&text).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(settings))
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Live settings plus the store every change is written through
pub struct Config {
    settings: Settings,
    store: Box<dyn ConfigStore>,
}

impl Config {
    /// Load settings from `store`, falling back to defaults when absent or unreadable
    pub fn open(store: Box<dyn ConfigStore>) -> Self {
        let settings = match store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                info!("No saved settings, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("Discarding unreadable settings: {}", e);
                Settings::default()
            }
        };
        Self { settings, store }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply a change and persist it immediately
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        if let Err(e) = self.store.save(&self.settings) {
            warn!("Failed to save settings: {}", e);
        }
    }
}

/// Default location of the settings file
pub fn default_config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("rpet").join("config.json")
}

/// Resolves asset locations for one character
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub assets_dir: PathBuf,
    pub character: String,
}

impl AssetPaths {
    pub fn new(assets_dir: impl Into<PathBuf>, character: impl Into<String>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            character: character.into(),
        }
    }

    pub fn character_dir(&self) -> PathBuf {
        self.assets_dir.join("characters").join(&self.character)
    }

    pub fn animations_dir(&self) -> PathBuf {
        self.character_dir().join("animations")
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.assets_dir.join("sounds")
    }

    /// Dialog files in lookup order: per character, then shared
    pub fn dialog_files(&self) -> Vec<PathBuf> {
        vec![
            self.character_dir().join("dialogs.json"),
            self.assets_dir.join("dialogs.json"),
        ]
    }
}

/// In-memory store that records every save
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub initial: Option<Settings>,
    pub saved: std::rc::Rc<std::cell::RefCell<Vec<Settings>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn last_saved(&self) -> Option<Settings> {
        self.saved.borrow().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saved.borrow().len()
    }
}

#[cfg(test)]
impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Option<Settings>, ConfigError> {
        Ok(self.initial.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.saved.borrow_mut().push(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"pet_x": 640, "animation_mode": "keep"}"#).unwrap();
        assert_eq!(settings.pet_x, 640);
        assert_eq!(settings.pet_y, 100);
        assert_eq!(settings.animation_mode, AnimationMode::Keep);
        assert!(settings.sound_enabled);
        assert_eq!(settings.scale, 1.0);
    }

    #[test]
    fn test_mode_serialized_lowercase() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains(r#""animation_mode":"random""#));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("config.json"));
        assert!(store.load().unwrap().is_none());

        let settings = Settings {
            pet_x: -20,
            volume: 0.8,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));

        let config = Config::open(Box::new(store));
        assert_eq!(config.settings(), &Settings::default());
    }

    #[test]
    fn test_update_persists_immediately() {
        let store = MemoryStore::default();
        let mut config = Config::open(Box::new(store.clone()));
        assert_eq!(store.save_count(), 0);

        config.update(|s| s.dialog_enabled = false);
        config.update(|s| s.pet_x = 12);
        assert_eq!(store.save_count(), 2);
        let saved = store.last_saved().unwrap();
        assert!(!saved.dialog_enabled);
        assert_eq!(saved.pet_x, 12);
    }

    #[test]
    fn test_asset_paths() {
        let paths = AssetPaths::new("/opt/pet", "cat");
        assert_eq!(
            paths.animations_dir(),
            PathBuf::from("/opt/pet/characters/cat/animations")
        );
        assert_eq!(paths.sounds_dir(), PathBuf::from("/opt/pet/sounds"));
        assert_eq!(paths.dialog_files()[0], PathBuf::from("/opt/pet/characters/cat/dialogs.json"));
    }
}
