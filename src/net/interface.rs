//! Network interface information and discovery.

use nix::ifaddrs::getifaddrs;
use pnet::util::MacAddr;

use crate::error::{Error, Result};

/// Hardware identity of the trunk interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "enp3s0").
    pub ifname: String,
    /// Link-layer address; frames sourced from it are our own.
    pub mac: MacAddr,
}

impl InterfaceInfo {
    pub fn new(ifname: String, mac: MacAddr) -> Self {
        Self { ifname, mac }
    }

    /// Look up interface information by name.
    pub fn from_name(ifname: &str) -> Result<Self> {
        let addrs = getifaddrs().map_err(|e| Error::NetworkError(std::io::Error::other(e)))?;

        let mut found = false;
        for ifaddr in addrs {
            if ifaddr.interface_name != ifname {
                continue;
            }
            found = true;

            // One entry per address family; only the link-layer one has a MAC.
            let Some(addr) = ifaddr.address else {
                continue;
            };
            let Some(link) = addr.as_link_addr() else {
                continue;
            };
            let Some([a, b, c, d, e, f]) = link.addr() else {
                continue;
            };

            return Ok(Self::new(ifname.to_string(), MacAddr::new(a, b, c, d, e, f)));
        }

        if found {
            Err(Error::NoHardwareAddress(ifname.to_string()))
        } else {
            Err(Error::InterfaceNotFound(ifname.to_string()))
        }
    }
}

impl std::fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dev {} ether {}", self.ifname, self.mac)
    }
}
