//! Raw Ethernet frame classification and retargeting.
//!
//! A captured frame is classified once into an immutable [`Frame`]. Every
//! reflected copy is a fresh buffer built by [`Frame::retarget`], so a frame
//! fanning out to several VLANs never shares mutable state between copies.

use std::net::IpAddr;

use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::udp::UdpPacket;
use pnet::packet::vlan::{ClassOfService, MutableVlanPacket, VlanPacket};
use pnet::packet::{MutablePacket, Packet};
use pnet::util::MacAddr;

use crate::mdns::consts::{
    IpVersion, DEFAULT_VLAN, MDNS_PORT, MULTICAST_ADDRESS, MULTICAST_ADDRESS_V6,
};
use crate::mdns::header::{DnsHeader, MessageKind};

/// Ethernet II header: destination, source, EtherType.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// 802.1Q tag: TCI plus the encapsulated EtherType.
pub const VLAN_TAG_LEN: usize = 4;

const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;
const UDP_HEADER_LEN: usize = 8;

/// An 802.1Q tag as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTag {
    /// VLAN identifier (12 bits).
    pub id: u16,
    /// Priority code point (3 bits).
    pub priority: u8,
    /// Drop eligible indicator.
    pub drop_eligible: bool,
}

impl VlanTag {
    /// Tag with default priority for the given VLAN.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            priority: 0,
            drop_eligible: false,
        }
    }
}

/// A captured frame that carries an mDNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    l3_offset: usize,
    src_mac: MacAddr,
    dst_mac: MacAddr,
    tag: Option<VlanTag>,
    ip_version: IpVersion,
    src_ip: IpAddr,
    dst_ip: IpAddr,
    dst_port: u16,
    header: DnsHeader,
}

impl Frame {
    /// Classify raw frame bytes.
    ///
    /// Returns `None` unless every layer is present and well formed:
    /// Ethernet, at most one 802.1Q tag, IPv4 or IPv6 addressed to the mDNS
    /// group, UDP to port 5353 and a complete DNS header.
    pub fn classify(data: &[u8]) -> Option<Self> {
        let eth = EthernetPacket::new(data)?;
        let src_mac = eth.get_source();
        let dst_mac = eth.get_destination();

        let (tag, ethertype, l3_offset) = match eth.get_ethertype() {
            EtherTypes::Vlan => {
                let vlan = VlanPacket::new(eth.payload())?;
                let tag = VlanTag {
                    id: vlan.get_vlan_identifier(),
                    priority: vlan.get_priority_code_point().0,
                    drop_eligible: vlan.get_drop_eligible_indicator() != 0,
                };
                (
                    Some(tag),
                    vlan.get_ethertype(),
                    ETHERNET_HEADER_LEN + VLAN_TAG_LEN,
                )
            }
            other => (None, other, ETHERNET_HEADER_LEN),
        };

        let l3 = data.get(l3_offset..)?;
        let (ip_version, src_ip, dst_ip, l3_len, l4_start) = match ethertype {
            EtherTypes::Ipv4 => {
                let ip = Ipv4Packet::new(l3)?;
                let header_len = usize::from(ip.get_header_length()) * 4;
                let total_len = usize::from(ip.get_total_length());
                if ip.get_version() != 4
                    || header_len < IPV4_MIN_HEADER_LEN
                    || total_len < header_len
                    || total_len > l3.len()
                {
                    return None;
                }
                // Only the first fragment carries the UDP header.
                if ip.get_fragment_offset() != 0
                    || ip.get_next_level_protocol() != IpNextHeaderProtocols::Udp
                {
                    return None;
                }
                (
                    IpVersion::V4,
                    IpAddr::V4(ip.get_source()),
                    IpAddr::V4(ip.get_destination()),
                    total_len,
                    header_len,
                )
            }
            EtherTypes::Ipv6 => {
                let ip = Ipv6Packet::new(l3)?;
                let total_len = IPV6_HEADER_LEN + usize::from(ip.get_payload_length());
                if ip.get_version() != 6
                    || total_len > l3.len()
                    || ip.get_next_header() != IpNextHeaderProtocols::Udp
                {
                    return None;
                }
                (
                    IpVersion::V6,
                    IpAddr::V6(ip.get_source()),
                    IpAddr::V6(ip.get_destination()),
                    total_len,
                    IPV6_HEADER_LEN,
                )
            }
            _ => return None,
        };

        if !is_mdns_group(dst_ip) {
            return None;
        }

        let l4 = &l3[l4_start..l3_len];
        let udp = UdpPacket::new(l4)?;
        if udp.get_destination() != MDNS_PORT {
            return None;
        }
        let udp_len = usize::from(udp.get_length());
        if udp_len < UDP_HEADER_LEN || udp_len > l4.len() {
            return None;
        }
        let header = DnsHeader::parse(&l4[UDP_HEADER_LEN..udp_len])?;

        Some(Self {
            data: data[..l3_offset + l3_len].to_vec(),
            l3_offset,
            src_mac,
            dst_mac,
            tag,
            ip_version,
            src_ip,
            dst_ip,
            dst_port: MDNS_PORT,
            header,
        })
    }

    /// Build a copy of this frame for another VLAN.
    ///
    /// The copy is tagged with `vlan` (keeping the original priority bits),
    /// sourced from `reflector_mac` and addressed to the canonical mDNS
    /// group MAC. The IP datagram is carried over unchanged; its lengths and
    /// checksums do not cover layer 2.
    pub fn retarget(&self, vlan: u16, reflector_mac: MacAddr) -> Vec<u8> {
        let tag = VlanTag {
            id: vlan,
            ..self.tag.unwrap_or_else(|| VlanTag::new(vlan))
        };
        let datagram = self.ip_datagram();
        let ethertype = match self.ip_version {
            IpVersion::V4 => EtherTypes::Ipv4,
            IpVersion::V6 => EtherTypes::Ipv6,
        };

        // Sized for both headers, so neither view can come back `None`.
        let mut out = vec![0u8; ETHERNET_HEADER_LEN + VLAN_TAG_LEN + datagram.len()];
        if let Some(mut eth) = MutableEthernetPacket::new(&mut out) {
            eth.set_destination(self.ip_version.multicast_mac());
            eth.set_source(reflector_mac);
            eth.set_ethertype(EtherTypes::Vlan);

            if let Some(mut dot1q) = MutableVlanPacket::new(eth.payload_mut()) {
                dot1q.set_priority_code_point(ClassOfService(tag.priority));
                dot1q.set_drop_eligible_indicator(u8::from(tag.drop_eligible));
                dot1q.set_vlan_identifier(tag.id);
                dot1q.set_ethertype(ethertype);
                dot1q.set_payload(datagram);
            }
        }
        out
    }

    /// Raw bytes as captured, trimmed to the IP datagram.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The IP datagram (IP header onward).
    pub fn ip_datagram(&self) -> &[u8] {
        &self.data[self.l3_offset..]
    }

    pub fn src_mac(&self) -> MacAddr {
        self.src_mac
    }

    pub fn dst_mac(&self) -> MacAddr {
        self.dst_mac
    }

    /// The 802.1Q tag, if the frame was tagged.
    pub fn tag(&self) -> Option<VlanTag> {
        self.tag
    }

    /// VLAN identifier, if the frame was tagged.
    pub fn vlan(&self) -> Option<u16> {
        self.tag.map(|tag| tag.id)
    }

    /// VLAN the frame belongs to; untagged frames belong to VLAN 1.
    pub fn vlan_or_default(&self) -> u16 {
        self.vlan().unwrap_or(DEFAULT_VLAN)
    }

    pub fn ip_version(&self) -> IpVersion {
        self.ip_version
    }

    pub fn src_ip(&self) -> IpAddr {
        self.src_ip
    }

    pub fn dst_ip(&self) -> IpAddr {
        self.dst_ip
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn header(&self) -> &DnsHeader {
        &self.header
    }

    pub fn kind(&self) -> MessageKind {
        self.header.kind()
    }

    /// One-line description for logs.
    pub fn format_summary(&self) -> String {
        let vlan = match self.vlan() {
            Some(id) => format!("vlan {}", id),
            None => "untagged".to_string(),
        };
        format!(
            "{} from {} ({}, {}) {}",
            self.ip_version,
            self.src_ip,
            self.src_mac,
            vlan,
            self.header.format_summary()
        )
    }
}

/// Whether `addr` is one of the mDNS group addresses.
pub fn is_mdns_group(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4 == MULTICAST_ADDRESS,
        IpAddr::V6(v6) => v6 == MULTICAST_ADDRESS_V6,
    }
}
