//! mDNS frame types, classification and rewriting.

pub mod consts;
pub mod frame;
pub mod header;

pub use consts::{
    IpVersion, DEFAULT_VLAN, MDNS_PORT, MULTICAST_ADDRESS, MULTICAST_ADDRESS_V6, MULTICAST_MAC,
    MULTICAST_MAC_V6, PACKAGE, PACKET_SIZE, QUEUE_CAPACITY,
};
pub use frame::{Frame, VlanTag};
pub use header::{DnsHeader, MessageKind};
