//! Frame construction helpers shared by unit tests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use pnet::packet::ethernet::{EtherTypes, MutableEthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::{self, MutableIpv4Packet};
use pnet::packet::ipv6::MutableIpv6Packet;
use pnet::packet::udp::{self, MutableUdpPacket};
use pnet::packet::vlan::{ClassOfService, MutableVlanPacket};
use pnet::packet::MutablePacket;
use pnet::util::MacAddr;

use crate::mdns::consts::{
    MDNS_PORT, MULTICAST_ADDRESS, MULTICAST_ADDRESS_V6, MULTICAST_MAC, MULTICAST_MAC_V6,
};

/// Builds raw mDNS frames the way a Bonjour host would emit them.
#[derive(Debug, Clone)]
pub(crate) struct FrameBuilder {
    src_mac: MacAddr,
    dst_mac: Option<MacAddr>,
    vlan: Option<u16>,
    priority: u8,
    ipv6: bool,
    dst_ip: Option<IpAddr>,
    dst_port: u16,
    ipv4_options: Vec<u8>,
    ipv6_next_header: IpNextHeaderProtocol,
    dns: Vec<u8>,
}

impl FrameBuilder {
    fn new(src_mac: MacAddr, flags: u16) -> Self {
        #[rustfmt::skip]
        let mut dns = vec![
            0x00, 0x00, // Transaction ID
            0x00, 0x00, // Flags
            0x00, 0x01, // Questions: 1
            0x00, 0x00, // Answers: 0
            0x00, 0x00, // Authority: 0
            0x00, 0x00, // Additional: 0
            // _airplay._tcp.local PTR IN
            0x08, b'_', b'a', b'i', b'r', b'p', b'l', b'a', b'y',
            0x04, b'_', b't', b'c', b'p',
            0x05, b'l', b'o', b'c', b'a', b'l',
            0x00,
            0x00, 0x0c,
            0x00, 0x01,
        ];
        dns[2..4].copy_from_slice(&flags.to_be_bytes());

        Self {
            src_mac,
            dst_mac: None,
            vlan: None,
            priority: 0,
            ipv6: false,
            dst_ip: None,
            dst_port: MDNS_PORT,
            ipv4_options: Vec::new(),
            ipv6_next_header: IpNextHeaderProtocols::Udp,
            dns,
        }
    }

    pub(crate) fn query(src_mac: MacAddr) -> Self {
        Self::new(src_mac, 0x0000)
    }

    pub(crate) fn response(src_mac: MacAddr) -> Self {
        Self::new(src_mac, 0x8400)
    }

    pub(crate) fn vlan(mut self, id: u16) -> Self {
        self.vlan = Some(id);
        self
    }

    pub(crate) fn priority(mut self, pcp: u8) -> Self {
        self.priority = pcp;
        self
    }

    pub(crate) fn ipv6(mut self) -> Self {
        self.ipv6 = true;
        self
    }

    pub(crate) fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.dst_mac = Some(mac);
        self
    }

    /// Override the destination address; also selects the IP version.
    pub(crate) fn dst_ip(mut self, addr: IpAddr) -> Self {
        self.ipv6 = addr.is_ipv6();
        self.dst_ip = Some(addr);
        self
    }

    pub(crate) fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    /// Raw IPv4 options; must be a multiple of four bytes.
    pub(crate) fn ipv4_options(mut self, options: Vec<u8>) -> Self {
        self.ipv4_options = options;
        self
    }

    /// Next header of the IPv6 fixed header. The payload stays UDP.
    pub(crate) fn ipv6_next_header(mut self, protocol: IpNextHeaderProtocol) -> Self {
        self.ipv6_next_header = protocol;
        self
    }

    pub(crate) fn dns_payload(mut self, dns: Vec<u8>) -> Self {
        self.dns = dns;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let (datagram, ethertype, group_mac) = if self.ipv6 {
            (self.build_ipv6(), EtherTypes::Ipv6, MULTICAST_MAC_V6)
        } else {
            (self.build_ipv4(), EtherTypes::Ipv4, MULTICAST_MAC)
        };

        let l2_len = if self.vlan.is_some() { 18 } else { 14 };
        let mut buf = vec![0u8; l2_len + datagram.len()];
        let mut eth = MutableEthernetPacket::new(&mut buf).unwrap();
        eth.set_destination(self.dst_mac.unwrap_or(group_mac));
        eth.set_source(self.src_mac);

        match self.vlan {
            Some(id) => {
                eth.set_ethertype(EtherTypes::Vlan);
                let mut tag = MutableVlanPacket::new(eth.payload_mut()).unwrap();
                tag.set_priority_code_point(ClassOfService(self.priority));
                tag.set_drop_eligible_indicator(0);
                tag.set_vlan_identifier(id);
                tag.set_ethertype(ethertype);
                tag.payload_mut().copy_from_slice(&datagram);
            }
            None => {
                eth.set_ethertype(ethertype);
                eth.payload_mut().copy_from_slice(&datagram);
            }
        }

        buf
    }

    fn udp_len(&self) -> usize {
        8 + self.dns.len()
    }

    fn fill_udp(&self, buf: &mut [u8]) {
        let mut udp = MutableUdpPacket::new(buf).unwrap();
        udp.set_source(MDNS_PORT);
        udp.set_destination(self.dst_port);
        udp.set_length(self.udp_len() as u16);
        udp.set_payload(&self.dns);
    }

    fn build_ipv4(&self) -> Vec<u8> {
        let src = Ipv4Addr::new(192, 168, 42, 17);
        let dst = match self.dst_ip {
            Some(IpAddr::V4(addr)) => addr,
            _ => MULTICAST_ADDRESS,
        };

        let header_len = 20 + self.ipv4_options.len();
        let mut buf = vec![0u8; header_len + self.udp_len()];
        buf[20..header_len].copy_from_slice(&self.ipv4_options);
        let mut ip = MutableIpv4Packet::new(&mut buf).unwrap();
        ip.set_version(4);
        ip.set_header_length((header_len / 4) as u8);
        ip.set_total_length((header_len + self.udp_len()) as u16);
        ip.set_ttl(255);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        ip.set_source(src);
        ip.set_destination(dst);
        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);

        self.fill_udp(ip.payload_mut());
        let mut udp = MutableUdpPacket::new(ip.payload_mut()).unwrap();
        let checksum = udp::ipv4_checksum(&udp.to_immutable(), &src, &dst);
        udp.set_checksum(checksum);

        buf
    }

    fn build_ipv6(&self) -> Vec<u8> {
        let src = Ipv6Addr::new(0xfe80, 0, 0, 0, 0x0214, 0x22ff, 0xfe01, 0x2345);
        let dst = match self.dst_ip {
            Some(IpAddr::V6(addr)) => addr,
            _ => MULTICAST_ADDRESS_V6,
        };

        let mut buf = vec![0u8; 40 + self.udp_len()];
        let mut ip = MutableIpv6Packet::new(&mut buf).unwrap();
        ip.set_version(6);
        ip.set_payload_length(self.udp_len() as u16);
        ip.set_next_header(self.ipv6_next_header);
        ip.set_hop_limit(255);
        ip.set_source(src);
        ip.set_destination(dst);

        self.fill_udp(ip.payload_mut());
        let mut udp = MutableUdpPacket::new(ip.payload_mut()).unwrap();
        let checksum = udp::ipv6_checksum(&udp.to_immutable(), &src, &dst);
        udp.set_checksum(checksum);

        buf
    }
}

