//! The single UI preference kept between sessions: which list tab was last
//! active. Stored as JSON in the user's config directory.

use crate::error::{ClientError, Result};
use crate::views::ActiveList;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub active_list: ActiveList,
}

/// Default location: `<config dir>/vocab-reader/preferences.json`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-reader")
        .join(FILE_NAME)
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Missing or unreadable preferences fall back to defaults.
    pub fn load(&self) -> Preferences {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Preferences::default(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable preferences");
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::Preferences(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let content = serde_json::to_string_pretty(prefs)?;

        // Write then rename so a crash never leaves a half-written file.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .map_err(|e| ClientError::Preferences(format!("Failed to write preferences: {}", e)))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| ClientError::Preferences(format!("Failed to finalize preferences: {}", e)))?;
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(default_path())
    }
}
