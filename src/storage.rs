//! Loading and saving documents.
//!
//! Documents are flat UTF-8 text. Bytes are read and written unchanged:
//! line terminators are not normalised and no BOM handling is applied, so
//! loading and then saving an unmodified file reproduces it exactly.
//!
//! The [`Storage`] trait is the seam the UI talks to; [`FileStorage`] is the
//! filesystem implementation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading or saving a document.
#[derive(Debug)]
pub enum StorageError {
    /// No file name was given.
    NoPath,
    /// The file exists but is not valid UTF-8.
    InvalidUtf8 { path: PathBuf },
    /// An I/O error occurred reading or writing the file.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NoPath => write!(f, "no file name given"),
            StorageError::InvalidUtf8 { path } => {
                write!(f, "{} is not valid UTF-8 text", path.display())
            }
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Where documents come from and go to.
pub trait Storage {
    /// Read the document at `path`.
    fn try_load(&self, path: &Path) -> Result<String, StorageError>;

    /// Write `text` to `path`, replacing any existing content.
    fn save(&self, path: &Path, text: &str) -> Result<(), StorageError>;

    /// Read the document at `path`, or an empty string if that fails or
    /// `path` is empty.
    fn load(&self, path: &Path) -> String {
        self.try_load(path).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// `Storage` backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileStorage {
    /// Report failures on stderr.
    pub verbose: bool,
}

impl FileStorage {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Storage for FileStorage {
    fn try_load(&self, path: &Path) -> Result<String, StorageError> {
        if path.as_os_str().is_empty() {
            return Err(StorageError::NoPath);
        }
        let bytes = fs::read(path).inspect_err(|e| {
            if self.verbose {
                eprintln!("text-filter: failed to read {}: {}", path.display(), e);
            }
        })?;
        String::from_utf8(bytes).map_err(|_| StorageError::InvalidUtf8 {
            path: path.to_path_buf(),
        })
    }

    fn save(&self, path: &Path, text: &str) -> Result<(), StorageError> {
        if path.as_os_str().is_empty() {
            return Err(StorageError::NoPath);
        }
        fs::write(path, text.as_bytes()).map_err(|e| {
            if self.verbose {
                eprintln!("text-filter: failed to write {}: {}", path.display(), e);
            }
            StorageError::from(e)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
