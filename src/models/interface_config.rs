// Network Center - Interface Configuration Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Desired-state record for one physical interface.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Addressing mode for an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpMode {
    Static,
    Dhcp,
}

/// Desired configuration for one interface, keyed by interface name.
///
/// At most one record exists per physical interface name. Live statistics
/// are never stored here; they come from the status reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Name of the owned physical interface.
    pub interface: String,
    pub ip_mode: IpMode,

    // Static addressing fields, ignored in DHCP mode.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub dns_primary: Option<String>,
    #[serde(default)]
    pub dns_secondary: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub vlan_id: Option<u16>,

    // Internet-sharing fields.
    #[serde(default)]
    pub ics_enabled: bool,
    #[serde(default)]
    pub ics_source_interface: Option<String>,
    #[serde(default)]
    pub dhcp_range_start: Option<String>,
    #[serde(default)]
    pub dhcp_range_end: Option<String>,

    #[serde(default = "default_enabled")]
    pub admin_enabled: bool,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_enabled() -> bool {
    true
}

impl InterfaceConfig {
    /// New static configuration with addressing fields unset.
    pub fn new_static(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            ip_mode: IpMode::Static,
            address: None,
            netmask: None,
            gateway: None,
            dns_primary: None,
            dns_secondary: None,
            mtu: None,
            vlan_id: None,
            ics_enabled: false,
            ics_source_interface: None,
            dhcp_range_start: None,
            dhcp_range_end: None,
            admin_enabled: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// New DHCP configuration.
    pub fn new_dhcp(interface: &str) -> Self {
        Self { ip_mode: IpMode::Dhcp, ..Self::new_static(interface) }
    }

    /// Field-level validation errors, empty when the record is acceptable.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.interface.trim().is_empty() {
            errors.push("interface name must not be empty".to_string());
        }

        if self.ip_mode == IpMode::Static {
            match &self.address {
                None => errors.push("static mode requires an address".to_string()),
                Some(addr) => {
                    if addr.parse::<Ipv4Addr>().is_err() {
                        errors.push(format!("invalid address: {addr}"));
                    }
                }
            }
            match &self.netmask {
                None => errors.push("static mode requires a netmask".to_string()),
                Some(mask) => {
                    if netmask_to_prefix(mask).is_none() {
                        errors.push(format!("invalid netmask: {mask}"));
                    }
                }
            }
        }

        for (label, value) in [
            ("gateway", &self.gateway),
            ("primary DNS server", &self.dns_primary),
            ("secondary DNS server", &self.dns_secondary),
        ] {
            if let Some(v) = value {
                if v.parse::<Ipv4Addr>().is_err() {
                    errors.push(format!("invalid {label}: {v}"));
                }
            }
        }

        if let Some(mtu) = self.mtu {
            if !(576..=9216).contains(&mtu) {
                errors.push(format!("MTU {mtu} outside 576-9216"));
            }
        }

        if let Some(vlan) = self.vlan_id {
            if !(1..=4094).contains(&vlan) {
                errors.push(format!("VLAN id {vlan} outside 1-4094"));
            }
        }

        if self.ics_enabled {
            if self.ics_source_interface.as_deref().unwrap_or("").is_empty() {
                errors.push("internet sharing requires a source interface".to_string());
            }
            for (label, value) in [
                ("DHCP range start", &self.dhcp_range_start),
                ("DHCP range end", &self.dhcp_range_end),
            ] {
                match value {
                    None => errors.push(format!("internet sharing requires a {label}")),
                    Some(v) if v.parse::<Ipv4Addr>().is_err() => {
                        errors.push(format!("invalid {label}: {v}"))
                    }
                    Some(_) => {}
                }
            }
        }

        errors
    }
}

/// Convert a dotted-quad netmask into a CIDR prefix length.
///
/// Returns `None` for non-contiguous masks.
pub fn netmask_to_prefix(mask: &str) -> Option<u8> {
    let addr: Ipv4Addr = mask.parse().ok()?;
    let bits = u32::from(addr);
    let ones = bits.count_ones();
    if bits.leading_ones() == ones {
        Some(ones as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netmask_conversion() {
        assert_eq!(netmask_to_prefix("255.255.255.0"), Some(24));
        assert_eq!(netmask_to_prefix("255.255.0.0"), Some(16));
        assert_eq!(netmask_to_prefix("255.255.255.255"), Some(32));
        assert_eq!(netmask_to_prefix("0.0.0.0"), Some(0));
        // Non-contiguous masks are rejected.
        assert_eq!(netmask_to_prefix("255.0.255.0"), None);
        assert_eq!(netmask_to_prefix("garbage"), None);
    }

    #[test]
    fn static_mode_requires_address_and_mask() {
        let cfg = InterfaceConfig::new_static("eth0");
        let errors = cfg.validation_errors();
        assert!(errors.iter().any(|e| e.contains("address")));
        assert!(errors.iter().any(|e| e.contains("netmask")));
    }

    #[test]
    fn valid_static_config_passes() {
        let mut cfg = InterfaceConfig::new_static("eth0");
        cfg.address = Some("192.168.1.10".into());
        cfg.netmask = Some("255.255.255.0".into());
        cfg.gateway = Some("192.168.1.1".into());
        cfg.mtu = Some(1500);
        assert!(cfg.validation_errors().is_empty());
    }

    #[test]
    fn dhcp_mode_needs_no_address() {
        let cfg = InterfaceConfig::new_dhcp("eth0");
        assert!(cfg.validation_errors().is_empty());
    }

    #[test]
    fn ics_requires_source_and_range() {
        let mut cfg = InterfaceConfig::new_dhcp("eth0");
        cfg.ics_enabled = true;
        let errors = cfg.validation_errors();
        assert!(errors.iter().any(|e| e.contains("source interface")));
        assert!(errors.iter().any(|e| e.contains("DHCP range start")));
        assert!(errors.iter().any(|e| e.contains("DHCP range end")));
    }
}
