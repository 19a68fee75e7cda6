//! Token record persistence.
//!
//! The record is the only unit of session state and is always read, written
//! and cleared whole. [`FileTokenStore`] keeps it in a JSON file with 0o600
//! permissions; [`MemoryTokenStore`] backs tests and embedded use.

use std::path::{Path, PathBuf};

use crate::errors::AuthError;
use crate::types::TokenRecord;

/// Default session file name.
const SESSION_FILE_NAME: &str = "session.json";

/// Durable storage for the token record.
///
/// Implementations must treat the record as atomic: a reader sees either the
/// full record or none at all.
pub trait TokenStore: Send + Sync {
    /// Read the current record, if one exists and parses.
    fn load(&self) -> Option<TokenRecord>;

    /// Replace the record. Fields are never merged.
    fn save(&self, record: &TokenRecord) -> Result<(), AuthError>;

    /// Delete the record. Idempotent.
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed token store.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default session file path under the given data directory.
    pub fn session_file_path(data_dir: &Path) -> PathBuf {
        data_dir.join(SESSION_FILE_NAME)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read session file: {e}");
                return None;
            }
        };

        match serde_json::from_str::<TokenRecord>(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("failed to parse session file: {e}");
                None
            }
        }
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Io(e)),
        }
    }
}

/// In-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    record: parking_lot::RwLock<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        self.record.read().clone()
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        *self.record.write() = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.record.write() = None;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
