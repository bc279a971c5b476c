//! Most-recently-used file list.
//!
//! Newest first, no duplicates, at most [`MAX_RECENT_FILES`] entries.
//! Persisted as a small TOML file next to the config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of remembered files.
pub const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFiles {
    #[serde(default)]
    files: Vec<PathBuf>,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `path` to the front, dropping older duplicates and overflow.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.files.retain(|p| p != &path);
        self.files.insert(0, path);
        self.files.truncate(MAX_RECENT_FILES);
    }

    pub fn remove(&mut self, path: &Path) {
        self.files.retain(|p| p != path);
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load the list from `path`. A missing file yields an empty list; a
    /// malformed one is reported and also yields an empty list.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match toml::from_str::<RecentFiles>(&contents) {
            Ok(mut recent) => {
                recent.files.truncate(MAX_RECENT_FILES);
                recent
            }
            Err(e) => {
                eprintln!(
                    "text-filter: warning: ignoring malformed recent-files list {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Write the list to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let contents = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, contents)
    }
}
