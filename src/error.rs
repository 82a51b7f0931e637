//! Error types for mdns-reflector.

use thiserror::Error;

/// Errors that can occur while setting up or running the reflector.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// Network I/O error.
    #[error("network error: {0}")]
    NetworkError(#[from] std::io::Error),

    /// Invalid MAC address.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    /// Interface not found.
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    /// Interface exists but has no link-layer address.
    #[error("interface {0} has no hardware address")]
    NoHardwareAddress(String),

    /// Capture channel could not be opened.
    #[error("cannot capture on {ifname}: {reason}")]
    CaptureError { ifname: String, reason: String },

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for mdns-reflector operations.
pub type Result<T> = std::result::Result<T, Error>;
