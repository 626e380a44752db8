//! Core types for Chairside.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod device;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use device::{
    DeviceId, DeviceIdStore, DeviceStoreError, MemoryDeviceIdStore, get_or_create_device_id,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
