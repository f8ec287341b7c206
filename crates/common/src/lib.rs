//! Common utilities for rust-vusb
//!
//! This crate provides functionality shared between the virtual host
//! controller core and the devnode installer tool: remote device
//! descriptor types, error handling, and logging setup.

pub mod device;
pub mod error;
pub mod logging;

pub use device::{DeviceDescriptor, DeviceSpeed};
pub use error::{Error, Result};
pub use logging::setup_logging;
