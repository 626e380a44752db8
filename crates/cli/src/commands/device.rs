//! Device identity commands.
//!
//! # Usage
//!
//! ```bash
//! # Print this machine's device id, creating it on first use
//! cs-cli device show --store ~/.config/chairside/device-id
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use chairside_core::{DeviceId, DeviceIdStore, DeviceStoreError, get_or_create_device_id};

/// Stores the device id as a single line of text in a file.
#[derive(Debug, Clone)]
pub struct FileDeviceIdStore {
    path: PathBuf,
}

impl FileDeviceIdStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DeviceIdStore for FileDeviceIdStore {
    fn load(&self) -> Result<Option<DeviceId>, DeviceStoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        contents.parse().map(Some).map_err(|e| {
            DeviceStoreError::Corrupt(format!("{}: {e}", self.path.display()))
        })
    }

    fn save(&self, id: DeviceId) -> Result<(), DeviceStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{id}\n"))?;
        Ok(())
    }
}

/// Return the device id held in `store`, creating it if missing.
///
/// # Errors
///
/// Returns `DeviceStoreError` if the file cannot be read or written, or holds
/// something other than a device id.
pub fn show(store: PathBuf) -> Result<DeviceId, DeviceStoreError> {
    let store = FileDeviceIdStore::new(store);
    let id = get_or_create_device_id(&store)?;
    tracing::debug!(path = %store.path.display(), %id, "Device id resolved");
    Ok(id)
}
