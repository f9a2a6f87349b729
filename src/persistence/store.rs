//! Save store backends

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{SaveData, SaveStore};
use crate::error::PersistenceError;

/// JSON file on disk. Writes go to a sibling temp file that is then renamed
/// over the save, so a crash mid-write never leaves a torn save behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self) -> Result<Option<SaveData>, PersistenceError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("Saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store holding the serialized save (tests and headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Option<String>,
    read_only: bool,
    /// Successful writes so far
    pub writes: u32,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: SaveData) -> Self {
        Self {
            contents: serde_json::to_string(&data).ok(),
            ..Self::default()
        }
    }

    /// Store whose contents cannot be parsed
    pub fn corrupt() -> Self {
        Self {
            contents: Some("{ \"total_coins\": ".to_string()),
            ..Self::default()
        }
    }

    /// Store that refuses every write
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Raw serialized contents
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveData>, PersistenceError> {
        match &self.contents {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError> {
        if self.read_only {
            return Err(PersistenceError::Unavailable("store is read-only".to_string()));
        }
        self.contents = Some(serde_json::to_string(data)?);
        self.writes += 1;
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub const DEFAULT_KEY: &'static str = "neon_dash_save";

    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistenceError::Unavailable("localStorage not available".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEY)
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn load(&self) -> Result<Option<SaveData>, PersistenceError> {
        let json = Self::storage()?
            .get_item(&self.key)
            .map_err(|_| PersistenceError::Unavailable("localStorage read failed".to_string()))?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(data)?;
        Self::storage()?
            .set_item(&self.key, &json)
            .map_err(|_| PersistenceError::Unavailable("localStorage write failed".to_string()))
    }
}
