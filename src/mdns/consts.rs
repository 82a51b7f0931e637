//! Constants for mDNS reflection.

use std::net::{Ipv4Addr, Ipv6Addr};

use pnet::util::MacAddr;

/// Package name.
pub const PACKAGE: &str = "mdns-reflector";

/// mDNS IPv4 multicast address.
pub const MULTICAST_ADDRESS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// mDNS IPv6 multicast address.
pub const MULTICAST_ADDRESS_V6: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb);

/// mDNS port.
pub const MDNS_PORT: u16 = 5353;

/// Ethernet group address of 224.0.0.251.
pub const MULTICAST_MAC: MacAddr = MacAddr(0x01, 0x00, 0x5e, 0x00, 0x00, 0xfb);

/// Ethernet group address of ff02::fb.
pub const MULTICAST_MAC_V6: MacAddr = MacAddr(0x33, 0x33, 0x00, 0x00, 0x00, 0xfb);

/// VLAN assumed for frames captured without an 802.1Q tag.
pub const DEFAULT_VLAN: u16 = 1;

/// Highest usable 802.1Q VLAN identifier (4095 is reserved).
pub const MAX_VLAN: u16 = 4094;

/// Capacity of the queue between capture and forwarding.
pub const QUEUE_CAPACITY: usize = 100;

/// Capture buffer size, large enough for jumbo frames.
pub const PACKET_SIZE: usize = 65536;

/// Size of the fixed DNS message header.
pub const DNS_HEADER_LEN: usize = 12;

/// QR bit of the DNS flags word.
pub const DNS_FLAG_RESPONSE: u16 = 0x8000;

/// AA bit of the DNS flags word.
pub const DNS_FLAG_AUTHORITATIVE: u16 = 0x0400;

/// TC bit of the DNS flags word.
pub const DNS_FLAG_TRUNCATED: u16 = 0x0200;

/// Which IP version carried an mDNS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Canonical Ethernet destination for mDNS over this IP version.
    pub fn multicast_mac(self) -> MacAddr {
        match self {
            IpVersion::V4 => MULTICAST_MAC,
            IpVersion::V6 => MULTICAST_MAC_V6,
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}
