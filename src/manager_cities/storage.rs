use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use crate::manager_cities::errors::CityError;

/// String key-value storage the saved-city list is persisted in
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CityError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CityError>;
    fn remove(&mut self, key: &str) -> Result<(), CityError>;
}

/// Store that lives only as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CityError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CityError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CityError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store kept as a single JSON object on disk.
///
/// Every read goes to the file and every change rewrites it, so writes made by another
/// handle on the same file are seen on the next access.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens the store, failing early if an existing file is not a JSON object of strings
    ///
    /// # Arguments
    ///
    /// * 'path' - full path to the JSON file, created on first write
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CityError> {
        let store = Self { path: path.as_ref().to_path_buf() };
        store.read_entries()?;

        Ok(store)
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, CityError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            Ok(HashMap::new())
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }

    /// Writes to a temporary file next to the store and renames it into place, so the store
    /// file is always either the old or the new document
    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), CityError> {
        let json = serde_json::to_string_pretty(entries)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CityError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CityError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), CityError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
