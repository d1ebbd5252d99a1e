//! Persisted editor preferences and per-language code snapshots.

use std::{collections::HashMap, fs, path::PathBuf, sync::Mutex};

use crate::{config::Config, error::Result};

pub const LANGUAGE_KEY: &str = "editor-language";
pub const FONT_SIZE_KEY: &str = "editor-font-size";
pub const THEME_KEY: &str = "editor-theme";

pub fn snapshot_key(language: &str) -> String {
    format!("editor-code-{}", language)
}

/// Synchronous string key/value store.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Lets a test keep a handle on the store it hands to the orchestrator.
impl<S: PreferenceStore> PreferenceStore for std::sync::Arc<Mutex<S>> {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().unwrap_or_else(|e| e.into_inner()).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.lock().unwrap_or_else(|e| e.into_inner()).set(key, value)
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.prefs_path())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.file_path(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get(LANGUAGE_KEY).is_none());
        store.set(LANGUAGE_KEY, "python").unwrap();
        store.set(LANGUAGE_KEY, "rust").unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("rust"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("prefs")).unwrap();
        store.set(&snapshot_key("python"), "print(1)\n").unwrap();
        store.set(FONT_SIZE_KEY, "18").unwrap();

        let reopened = FileStore::new(dir.path().join("prefs")).unwrap();
        assert_eq!(reopened.get("editor-code-python").as_deref(), Some("print(1)\n"));
        assert_eq!(reopened.get(FONT_SIZE_KEY).as_deref(), Some("18"));
        assert!(reopened.get(THEME_KEY).is_none());
    }
}
