use std::fs;
use std::path::{Path, PathBuf};

use drill_core::Operation;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    TimeCalculator,
}

impl Exercise {
    pub const ALL: [Exercise; 5] = [
        Exercise::Addition,
        Exercise::Subtraction,
        Exercise::Multiplication,
        Exercise::Division,
        Exercise::TimeCalculator,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Exercise::Addition => "Addition",
            Exercise::Subtraction => "Subtraction",
            Exercise::Multiplication => "Multiplication",
            Exercise::Division => "Division",
            Exercise::TimeCalculator => "Time Calculator",
        }
    }

    pub fn operation(&self, allow_decimals: bool) -> Option<Operation> {
        match self {
            Exercise::Addition => Some(Operation::Addition),
            Exercise::Subtraction => Some(Operation::Subtraction),
            Exercise::Multiplication => Some(Operation::Multiplication),
            Exercise::Division => Some(Operation::Division { allow_decimals }),
            Exercise::TimeCalculator => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_exercise")]
    pub default_exercise: Exercise,
    #[serde(default)]
    pub allow_decimals: bool,
    #[serde(default = "default_storage_quota_bytes")]
    pub storage_quota_bytes: usize,
    #[serde(default)]
    pub sound_dir: Option<PathBuf>,
    #[serde(default = "default_history_rows")]
    pub history_rows: usize,
}

fn default_exercise() -> Exercise {
    Exercise::Addition
}
fn default_storage_quota_bytes() -> usize {
    5 * 1024 * 1024
}
fn default_history_rows() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_exercise: default_exercise(),
            allow_decimals: false,
            storage_quota_bytes: default_storage_quota_bytes(),
            sound_dir: None,
            history_rows: default_history_rows(),
        }
    }
}

impl Settings {
    /// Missing or unreadable settings fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut settings = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("ignoring invalid settings in {}: {e}", path.display());
                Settings::default()
            }),
            Err(_) => Settings::default(),
        };
        settings.validate();
        settings
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))
    }

    pub fn validate(&mut self) {
        self.history_rows = self.history_rows.clamp(1, 100);
        self.storage_quota_bytes = self.storage_quota_bytes.max(1024);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"default_exercise": "time-calculator", "history_rows": 0}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.default_exercise, Exercise::TimeCalculator);
        assert_eq!(settings.history_rows, 1);
        assert!(!settings.allow_decimals);
        assert_eq!(settings.storage_quota_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            allow_decimals: true,
            default_exercise: Exercise::Division,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_exercise_operation() {
        assert_eq!(
            Exercise::Division.operation(true),
            Some(Operation::Division {
                allow_decimals: true
            })
        );
        assert_eq!(Exercise::TimeCalculator.operation(false), None);
    }
}
