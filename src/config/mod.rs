//! Configuration loading and validation.

pub mod device;

pub use device::{DeviceConfig, ReflectorConfig, DEFAULT_CONFIG_PATH};
