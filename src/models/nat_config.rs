// Network Center - NAT Configuration Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Desired-state record for internet sharing.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// One saved NAT / internet-sharing configuration.
///
/// Records are append-only: every save creates a new record and the current
/// configuration is the most recently created one, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatConfig {
    pub enabled: bool,
    pub wan_interface: String,
    pub lan_interface: String,
    pub dhcp_range_start: String,
    pub dhcp_range_end: String,
    pub gateway_ip: String,
    pub masquerade_enabled: bool,
    pub created_at: String,
}

impl NatConfig {
    pub fn new(
        wan_interface: &str,
        lan_interface: &str,
        dhcp_range_start: &str,
        dhcp_range_end: &str,
        gateway_ip: &str,
    ) -> Self {
        Self {
            enabled: true,
            wan_interface: wan_interface.to_string(),
            lan_interface: lan_interface.to_string(),
            dhcp_range_start: dhcp_range_start.to_string(),
            dhcp_range_end: dhcp_range_end.to_string(),
            gateway_ip: gateway_ip.to_string(),
            masquerade_enabled: true,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// A copy of this record marked disabled, stamped now.
    pub fn disabled_copy(&self) -> Self {
        Self {
            enabled: false,
            masquerade_enabled: false,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ..self.clone()
        }
    }

    /// DHCP range rendered as `start-end`.
    pub fn dhcp_range(&self) -> String {
        format!("{}-{}", self.dhcp_range_start, self.dhcp_range_end)
    }

    /// Field-level validation errors for the lease range.
    pub fn range_errors(dhcp_range_start: &str, dhcp_range_end: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let start = dhcp_range_start.parse::<Ipv4Addr>();
        let end = dhcp_range_end.parse::<Ipv4Addr>();

        if start.is_err() {
            errors.push(format!("invalid DHCP range start: {dhcp_range_start}"));
        }
        if end.is_err() {
            errors.push(format!("invalid DHCP range end: {dhcp_range_end}"));
        }
        if let (Ok(s), Ok(e)) = (start, end) {
            if u32::from(s) > u32::from(e) {
                errors.push(format!(
                    "DHCP range start {dhcp_range_start} is above range end {dhcp_range_end}"
                ));
            }
        }

        errors
    }
}
