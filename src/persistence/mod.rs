//! Profile persistence
//!
//! The profile is a single JSON document behind a `Storage` backend. Loads
//! never fail: missing or malformed data falls back to defaults, and fields
//! present in the stored document are overlaid onto those defaults.

mod profile;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use profile::{PermanentLevels, PersistedProfile};
use profile::StoredProfile;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend holding the serialized profile
pub trait Storage {
    /// Stored document, or None when nothing has been saved yet
    fn read(&self) -> Result<Option<String>, PersistError>;
    fn write(&mut self, contents: &str) -> Result<(), PersistError>;
}

/// Profile stored as a file on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write then rename so a crash never leaves a truncated profile
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory backend for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pub contents: Option<String>,
}

impl MemoryStorage {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), PersistError> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}

/// Load the profile, merging whatever is stored onto defaults
pub fn load_profile(storage: &dyn Storage) -> PersistedProfile {
    let stored = match storage.read() {
        Ok(Some(json)) => json,
        Ok(None) => {
            log::info!("No saved profile, starting fresh");
            return PersistedProfile::default();
        }
        Err(e) => {
            log::warn!("Failed to read profile: {e}");
            return PersistedProfile::default();
        }
    };

    match serde_json::from_str::<StoredProfile>(&stored) {
        Ok(record) => {
            let profile = PersistedProfile::default().merge(record);
            log::info!("Loaded profile (gold {}, high score {})", profile.gold, profile.high_score);
            profile
        }
        Err(e) => {
            log::warn!("Ignoring malformed profile: {e}");
            PersistedProfile::default()
        }
    }
}

pub fn save_profile(
    storage: &mut dyn Storage,
    profile: &PersistedProfile,
) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(profile)?;
    storage.write(&json)?;
    log::debug!("Profile saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::SlotType;

    #[test]
    fn test_empty_storage_gives_defaults() {
        let storage = MemoryStorage::default();
        assert_eq!(load_profile(&storage), PersistedProfile::default());
    }

    #[test]
    fn test_malformed_gives_defaults() {
        let storage = MemoryStorage::with_contents("{not json");
        assert_eq!(load_profile(&storage), PersistedProfile::default());
    }

    #[test]
    fn test_partial_record_merges_onto_defaults() {
        let storage = MemoryStorage::with_contents(
            r#"{"gold": 1200, "permanentStats": {"baseHp": 3}, "equippedItems": {"glove": "glove_army"}}"#,
        );
        let profile = load_profile(&storage);
        assert_eq!(profile.gold, 1200);
        assert_eq!(profile.high_score, 0);
        assert_eq!(profile.permanent.base_hp, 3);
        assert_eq!(profile.permanent.base_damage, 0);
        assert_eq!(profile.equipped.get(&SlotType::Glove).map(String::as_str), Some("glove_army"));
        // Slots absent from the stored map keep their defaults
        assert_eq!(profile.equipped.get(&SlotType::Weapon).map(String::as_str), Some("kunai"));
    }

    #[test]
    fn test_unknown_slot_keeps_other_fields() {
        let storage = MemoryStorage::with_contents(
            r#"{"gold": 500, "highScore": 9000, "equippedItems": {"ring": "x", "boots": "boot_army"}}"#,
        );
        let profile = load_profile(&storage);
        assert_eq!(profile.gold, 500);
        assert_eq!(profile.high_score, 9000);
        assert_eq!(
            profile.equipped.get(&SlotType::Boots).map(String::as_str),
            Some("boot_army")
        );
        assert_eq!(profile.equipped.len(), PersistedProfile::default().equipped.len());
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::default();
        let mut profile = PersistedProfile::default();
        profile.gold = 42;
        profile.high_score = 9000;
        profile.permanent.magnet_range = 2;
        save_profile(&mut storage, &profile).unwrap();

        let json = storage.contents.clone().unwrap();
        assert!(json.contains("highScore"));
        assert!(json.contains("magnetRange"));
        assert_eq!(load_profile(&storage), profile);
    }

    #[test]
    fn test_file_storage_missing_file() {
        let dir = std::env::temp_dir().join(format!("bullet-heaven-test-{}", std::process::id()));
        let mut storage = FileStorage::new(dir.join("profile.json"));
        assert!(storage.read().unwrap().is_none());

        storage.write("{\"gold\": 5}").unwrap();
        assert_eq!(load_profile(&storage).gold, 5);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
