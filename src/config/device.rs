//! Reflector configuration: trunk interface and device table.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::mdns::consts::MAX_VLAN;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mdns-reflector.yaml";

/// A Bonjour device whose announcements may leave its own VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Hardware address, e.g. "00:14:22:01:23:45".
    pub mac: String,

    /// Free-form label used in logs.
    #[serde(default)]
    pub description: Option<String>,

    /// VLAN the device is attached to.
    pub origin_pool: u16,

    /// VLANs the device's responses are reflected into. Queries asked in
    /// these VLANs are reflected into `origin_pool`.
    #[serde(default)]
    pub shared_pools: Vec<u16>,
}

impl DeviceConfig {
    /// Parse the configured MAC address.
    pub fn mac_addr(&self) -> Result<MacAddr> {
        MacAddr::from_str(self.mac.trim()).map_err(|_| Error::InvalidMac(self.mac.clone()))
    }

    /// Name for log output: the description when present, else the MAC.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.mac)
    }
}

/// Complete reflector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectorConfig {
    /// Trunk interface to capture on and inject into.
    pub net_interface: String,

    /// Devices allowed to announce outside their VLAN, in priority order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl ReflectorConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            interface = %config.net_interface,
            devices = config.devices.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: ReflectorConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for structural errors.
    pub fn validate(&self) -> Result<()> {
        if self.net_interface.trim().is_empty() {
            return Err(Error::ConfigError("net_interface is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            let mac = device.mac_addr()?;
            if !seen.insert(mac) {
                return Err(Error::ConfigError(format!(
                    "device {} is listed more than once",
                    mac
                )));
            }

            let pools = std::iter::once(&device.origin_pool).chain(&device.shared_pools);
            for &vlan in pools {
                if !(1..=MAX_VLAN).contains(&vlan) {
                    return Err(Error::ConfigError(format!(
                        "device {}: VLAN {} is outside 1..={}",
                        device.label(),
                        vlan,
                        MAX_VLAN
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
net_interface: eth0
devices:
  - mac: "00:14:22:01:23:45"
    description: "Living room Apple TV"
    origin_pool: 45
    shared_pools: [42, 46]
  - mac: "3C:22:FB:10:20:30"
    origin_pool: 46
    shared_pools: [42]
"#;

    fn device(mac: &str, origin_pool: u16, shared_pools: Vec<u16>) -> DeviceConfig {
        DeviceConfig {
            mac: mac.to_string(),
            description: None,
            origin_pool,
            shared_pools,
        }
    }

    #[test]
    fn test_yaml_deserialization() {
        let config = ReflectorConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.net_interface, "eth0");
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].label(), "Living room Apple TV");
        assert_eq!(config.devices[0].shared_pools, vec![42, 46]);
        assert_eq!(config.devices[1].label(), "3C:22:FB:10:20:30");
        assert_eq!(
            config.devices[1].mac_addr().unwrap(),
            MacAddr(0x3c, 0x22, 0xfb, 0x10, 0x20, 0x30)
        );
    }

    #[test]
    fn test_yaml_file_loading() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ReflectorConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.devices[0].origin_pool, 45);
    }

    #[test]
    fn test_missing_file() {
        let result = ReflectorConfig::from_yaml_file(Path::new("/nonexistent/reflector.yaml"));
        assert!(matches!(result, Err(Error::NetworkError(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "net_interface: eth0\nbogus: 1\n";
        assert!(matches!(
            ReflectorConfig::from_yaml_str(yaml),
            Err(Error::YamlError(_))
        ));
    }

    #[test]
    fn test_empty_interface_rejected() {
        let config = ReflectorConfig {
            net_interface: " ".to_string(),
            devices: Vec::new(),
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_invalid_mac_rejected() {
        let config = ReflectorConfig {
            net_interface: "eth0".to_string(),
            devices: vec![device("00:14:22:01:23", 45, vec![42])],
        };
        assert!(matches!(config.validate(), Err(Error::InvalidMac(_))));
    }

    #[test]
    fn test_duplicate_mac_rejected() {
        // Same address, different spelling.
        let config = ReflectorConfig {
            net_interface: "eth0".to_string(),
            devices: vec![
                device("3c:22:fb:10:20:30", 45, vec![42]),
                device("3C:22:FB:10:20:30", 46, vec![42]),
            ],
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_vlan_range_checked() {
        for vlan in [0, 4095] {
            let config = ReflectorConfig {
                net_interface: "eth0".to_string(),
                devices: vec![device("00:14:22:01:23:45", 45, vec![vlan])],
            };
            assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        }

        let config = ReflectorConfig {
            net_interface: "eth0".to_string(),
            devices: vec![device("00:14:22:01:23:45", 4094, vec![1])],
        };
        assert!(config.validate().is_ok());
    }
}
