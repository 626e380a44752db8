//! CLI command implementations.

pub mod device;
pub mod policy;
pub mod report;
