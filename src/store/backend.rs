//! Durable key/value backends for the persisted slots

use crate::{MediZenError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Durable storage addressed by slot key
pub trait SlotBackend: Send + Sync {
    /// Read the raw value stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores every slot as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SlotBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediZenError::StorageError(format!(
                "Failed to read slot {}: {}",
                key, e
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| write_error(key, e))?;

        // Write to a sibling file first so a failed write never truncates the slot
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value).map_err(|e| write_error(key, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| write_error(key, e))?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// ENOSPC and EDQUOT
fn is_out_of_space(e: &std::io::Error) -> bool {
    matches!(e.raw_os_error(), Some(28) | Some(122))
}

fn write_error(key: &str, e: std::io::Error) -> MediZenError {
    if is_out_of_space(&e) {
        MediZenError::StorageQuotaExceeded(format!("slot {}: {}", key, e))
    } else {
        MediZenError::StorageError(format!("Failed to write slot {}: {}", key, e))
    }
}

/// In-memory backend with an optional byte quota across all slots
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would grow the total stored size past `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Seed a raw value, bypassing the quota
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    /// Current raw value of a slot
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.read().values().map(|v| v.len()).sum()
    }
}

impl SlotBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                return Err(MediZenError::StorageQuotaExceeded(format!(
                    "slot {} needs {} bytes, {} of {} in use",
                    key,
                    value.len(),
                    others,
                    quota
                )));
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("data"));

        assert_eq!(backend.read("medi_logs").unwrap(), None);
        backend.write("medi_logs", "[]").unwrap();
        assert_eq!(backend.read("medi_logs").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data").join("medi_logs.json").exists());
    }

    #[test]
    fn test_file_backend_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());

        backend.write("medi_user_v2", "{\"a\":1}").unwrap();
        backend.write("medi_user_v2", "{\"a\":2}").unwrap();
        assert_eq!(
            backend.read("medi_user_v2").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
    }

    #[test]
    fn test_memory_quota_is_a_distinct_error() {
        let backend = MemoryBackend::with_quota(8);
        backend.write("a", "1234").unwrap();

        let err = backend.write("b", "123456").unwrap_err();
        assert!(matches!(err, MediZenError::StorageQuotaExceeded(_)));
        assert!(!err.needs_credential_replacement());

        // Rewriting an existing slot only counts its new size
        backend.write("a", "12345678").unwrap();
        assert_eq!(backend.total_bytes(), 8);
    }
}
