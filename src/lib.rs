//! mdns-reflector - reflects mDNS between VLANs on an 802.1Q trunk.
//!
//! This library classifies raw Ethernet frames carrying mDNS, decides which
//! VLANs each query or response may reach based on a device table, and
//! builds retagged copies for injection back onto the trunk.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mdns;
pub mod net;
pub mod pool;
pub mod reflector;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DeviceConfig, ReflectorConfig};
pub use error::{Error, Result};
pub use mdns::{
    DnsHeader, Frame, IpVersion, MessageKind, VlanTag, DEFAULT_VLAN, MDNS_PORT,
    MULTICAST_ADDRESS, MULTICAST_ADDRESS_V6, PACKAGE,
};
pub use net::{CaptureSink, CaptureSource, FrameSink, FrameSource, InterfaceInfo};
pub use pool::PoolResolver;
pub use reflector::MdnsReflector;
pub use stats::{ReflectorStatistics, StatisticsSnapshot};
