//! Device identifiers with get-or-create persistence.
//!
//! A device id is generated once per installation and then reused, so fraud
//! records can count distinct devices per IP. Storage is injected through
//! [`DeviceIdStore`]; nothing here touches ambient global state.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A random, per-installation device identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Generate a fresh random device id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for DeviceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Errors raised by a [`DeviceIdStore`].
#[derive(thiserror::Error, Debug)]
pub enum DeviceStoreError {
    /// The backing storage could not be read or written.
    #[error("device id storage error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored value exists but is not a valid device id.
    #[error("stored device id is corrupt: {0}")]
    Corrupt(String),
}

/// Persistent storage for a single device id.
pub trait DeviceIdStore {
    /// Load the stored id, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or holds a corrupt value.
    fn load(&self) -> Result<Option<DeviceId>, DeviceStoreError>;

    /// Persist an id, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, id: DeviceId) -> Result<(), DeviceStoreError>;
}

/// Return the stored device id, generating and persisting one on first use.
///
/// # Errors
///
/// Propagates any [`DeviceStoreError`] from the store.
pub fn get_or_create_device_id<S: DeviceIdStore + ?Sized>(
    store: &S,
) -> Result<DeviceId, DeviceStoreError> {
    if let Some(existing) = store.load()? {
        return Ok(existing);
    }
    let id = DeviceId::generate();
    store.save(id)?;
    Ok(id)
}

/// In-process store, for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryDeviceIdStore {
    slot: Mutex<Option<DeviceId>>,
}

impl MemoryDeviceIdStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceIdStore for MemoryDeviceIdStore {
    fn load(&self) -> Result<Option<DeviceId>, DeviceStoreError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| DeviceStoreError::Corrupt("store lock poisoned".to_owned()))?;
        Ok(*slot)
    }

    fn save(&self, id: DeviceId) -> Result<(), DeviceStoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| DeviceStoreError::Corrupt("store lock poisoned".to_owned()))?;
        *slot = Some(id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_stable() {
        let store = MemoryDeviceIdStore::new();
        let first = get_or_create_device_id(&store).unwrap();
        let second = get_or_create_device_id(&store).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_existing_id_is_returned() {
        let store = MemoryDeviceIdStore::new();
        let id = DeviceId::new(Uuid::nil());
        store.save(id).unwrap();
        assert_eq!(get_or_create_device_id(&store).unwrap(), id);
    }

    #[test]
    fn test_parse_trims() {
        let id: DeviceId = " 00000000-0000-0000-0000-000000000000\n".parse().unwrap();
        assert_eq!(id, DeviceId::new(Uuid::nil()));
    }
}
