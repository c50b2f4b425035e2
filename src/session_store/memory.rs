//! In-process storage media

use super::{MediumError, StorageMedium};
use std::collections::HashMap;
use std::sync::Mutex;

/// Map-backed medium. Lives exactly as long as the process that owns it.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium pre-populated with `entries`, e.g. a reloaded tab
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        let entries = self.entries.lock().map_err(|_| MediumError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let mut entries = self.entries.lock().map_err(|_| MediumError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Medium for hosts where storage is disabled. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMedium;

impl StorageMedium for UnavailableMedium {
    fn get(&self, _key: &str) -> Result<Option<String>, MediumError> {
        Err(MediumError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), MediumError> {
        Err(MediumError::Unavailable)
    }
}
