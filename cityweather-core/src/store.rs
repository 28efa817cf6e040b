//! Local key/value persistence for the view history.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::WeatherError;

/// Synchronous string store addressed by key.
pub trait KeyValueStore: Send + Sync + Debug {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn get(&self, key: &str) -> Result<Option<String>, WeatherError>;

    fn set(&self, key: &str, value: &str) -> Result<(), WeatherError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, WeatherError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(WeatherError::Persistence(format!(
                "Failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WeatherError> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            WeatherError::Persistence(format!(
                "Failed to create data directory {}: {err}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(key);
        fs::write(&path, value).map_err(|err| {
            WeatherError::Persistence(format!("Failed to write {}: {err}", path.display()))
        })
    }
}

/// In-process store, used by tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, WeatherError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WeatherError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
