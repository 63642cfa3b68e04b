use directories::ProjectDirs;
use drill_core::{FileStore, KeyValueStore, MemoryStore};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "arithmetic_drills";
const ORG_NAME: &str = "practice";
const SETTINGS_FILE: &str = "settings.json";
const SOUNDS_DIR: &str = "sounds";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", ORG_NAME, APP_NAME)
}

pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn settings_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

pub fn sound_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(SOUNDS_DIR))
}

/// Hands out stores over the data directory, or memory-only stores when it
/// cannot be used.
pub struct StoreFactory {
    file_store: Option<FileStore>,
}

impl StoreFactory {
    pub fn new(data_dir: Option<PathBuf>, quota_bytes: usize) -> Self {
        let file_store = match data_dir {
            Some(dir) => match FileStore::open(&dir) {
                Ok(store) => {
                    info!("history stored in {}", dir.display());
                    Some(store.with_quota(quota_bytes))
                }
                Err(e) => {
                    warn!("{e}; history will only last until the app closes");
                    None
                }
            },
            None => {
                warn!("No data directory; history will only last until the app closes");
                None
            }
        };
        Self { file_store }
    }

    pub fn is_persistent(&self) -> bool {
        self.file_store.is_some()
    }

    pub fn open(&self) -> Box<dyn KeyValueStore> {
        match &self.file_store {
            Some(store) => Box::new(store.clone()),
            None => Box::new(MemoryStore::new()),
        }
    }
}

pub fn export_to_file(path: &Path, json: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {}", e))?;
    }
    fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))
}

pub fn import_from_file(path: &Path) -> Result<String, String> {
    if !path.exists() {
        return Err(format!("No file found at {}", path.display()));
    }
    fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_factory_persists_between_stores() {
        let dir = TempDir::new().unwrap();
        let factory = StoreFactory::new(Some(dir.path().to_path_buf()), 1024 * 1024);
        assert!(factory.is_persistent());

        let mut first = factory.open();
        first.set("k", "v").unwrap();
        let second = factory.open();
        assert_eq!(second.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_factory_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        // a regular file where the directory should be
        let factory = StoreFactory::new(Some(blocker.join("data")), 1024);
        assert!(!factory.is_persistent());
        let mut store = factory.open();
        store.set("k", "v").unwrap();
        assert!(factory.open().get("k").unwrap().is_none());
    }

    #[test]
    fn test_export_import_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("history.json");
        export_to_file(&path, "{}").unwrap();
        assert_eq!(import_from_file(&path).unwrap(), "{}");
        assert!(import_from_file(&dir.path().join("missing.json")).is_err());
    }
}
