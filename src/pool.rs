//! Forwarding destinations derived from the device table.
//!
//! Queries travel from a shared pool towards every VLAN hosting a device
//! that shares into it. Responses travel from a device towards its shared
//! pools. Both maps are built once and only read afterwards.

use std::collections::HashMap;

use pnet::util::MacAddr;
use tracing::debug;

use crate::config::ReflectorConfig;
use crate::error::Result;
use crate::mdns::consts::DEFAULT_VLAN;

/// Immutable lookup from VLAN or device to destination VLANs.
#[derive(Debug, Clone, Default)]
pub struct PoolResolver {
    /// VLAN a query was asked in -> VLANs the query is reflected into.
    pools: HashMap<u16, Vec<u16>>,
    /// Device MAC -> VLANs its responses are reflected into.
    devices: HashMap<MacAddr, Vec<u16>>,
}

impl PoolResolver {
    /// Build the resolver from a validated configuration.
    pub fn from_config(config: &ReflectorConfig) -> Result<Self> {
        let mut resolver = Self::default();

        for device in &config.devices {
            let mac = device.mac_addr()?;

            let shared = resolver.devices.entry(mac).or_default();
            for &pool in &device.shared_pools {
                push_unique(shared, pool);
            }

            for &pool in &device.shared_pools {
                push_unique(resolver.pools.entry(pool).or_default(), device.origin_pool);
            }

            debug!(
                device = %device.label(),
                mac = %mac,
                origin = device.origin_pool,
                shared = ?device.shared_pools,
                "Registered device"
            );
        }

        Ok(resolver)
    }

    /// VLANs a query seen on `vlan` is reflected into.
    ///
    /// Untagged frames (`None`) are treated as VLAN 1. Unknown VLANs yield an
    /// empty slice.
    pub fn query_destinations(&self, vlan: Option<u16>) -> &[u16] {
        self.pools
            .get(&vlan.unwrap_or(DEFAULT_VLAN))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// VLANs a response from `device` is reflected into.
    ///
    /// Unknown devices yield an empty slice.
    pub fn response_destinations(&self, device: MacAddr) -> &[u16] {
        self.devices
            .get(&device)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of VLANs that have at least one query destination.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Number of configured devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

fn push_unique(list: &mut Vec<u16>, vlan: u16) {
    if !list.contains(&vlan) {
        list.push(vlan);
    }
}
