// Network Center - Status Reporter
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Live state queries, independent of persisted configuration.
//!
//! Counters come from sysfs, the forwarding flag from procfs, and
//! masquerade presence from a packet-filter check command. Comparing these
//! against desired-state records is how drift is detected.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::host::Host;
use crate::models::NatConfig;

const SYSFS_NET: &str = "/sys/class/net";
const PROC_IP_FORWARD: &str = "/proc/sys/net/ipv4/ip_forward";

/// Live traffic counters for one interface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterfaceStats {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// Reconciled NAT state: persisted record crossed with live signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NatStatus {
    /// No configuration has ever been saved.
    NotConfigured,
    /// The most recent record is disabled.
    Disabled,
    /// An enabled record exists but the host does not reflect it.
    ConfiguredButInactive,
    /// Forwarding and masquerade are observably present.
    Active,
}

impl NatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Disabled => "disabled",
            Self::ConfiguredButInactive => "configured_but_inactive",
            Self::Active => "active",
        }
    }
}

/// Queries live interface counters and NAT/forwarding flags.
pub struct StatusReporter {
    host: Arc<dyn Host>,
}

impl StatusReporter {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Read live counters for one interface.
    pub async fn interface_stats(&self, interface: &str) -> Result<InterfaceStats> {
        // rx_bytes doubles as the existence probe.
        let rx_bytes = match self.read_counter(interface, "rx_bytes").await {
            Some(v) => v,
            None => return Err(EngineError::not_found("interface", interface)),
        };

        Ok(InterfaceStats {
            interface: interface.to_string(),
            rx_bytes,
            tx_bytes: self.read_counter(interface, "tx_bytes").await.unwrap_or(0),
            rx_packets: self.read_counter(interface, "rx_packets").await.unwrap_or(0),
            tx_packets: self.read_counter(interface, "tx_packets").await.unwrap_or(0),
            rx_errors: self.read_counter(interface, "rx_errors").await.unwrap_or(0),
            tx_errors: self.read_counter(interface, "tx_errors").await.unwrap_or(0),
        })
    }

    async fn read_counter(&self, interface: &str, counter: &str) -> Option<u64> {
        let path = PathBuf::from(SYSFS_NET).join(interface).join("statistics").join(counter);
        self.host.read_file(&path).await.ok()?.trim().parse().ok()
    }

    /// Whether host-wide IPv4 forwarding is on.
    pub async fn ip_forwarding_enabled(&self) -> bool {
        self.host
            .read_file(PathBuf::from(PROC_IP_FORWARD).as_path())
            .await
            .map(|s| s.trim() == "1")
            .unwrap_or(false)
    }

    /// Whether an egress masquerade rule exists for the WAN interface.
    pub async fn masquerade_present(&self, wan_interface: &str) -> bool {
        let args = ["-t", "nat", "-C", "POSTROUTING", "-o", wan_interface, "-j", "MASQUERADE"];
        match self.host.run("iptables", &args).await {
            Ok(output) => output.success(),
            Err(_) => false,
        }
    }

    /// Classify NAT state from the persisted record and live signals.
    pub async fn nat_status(&self, current: Option<&NatConfig>) -> NatStatus {
        let config = match current {
            None => return NatStatus::NotConfigured,
            Some(config) => config,
        };

        if !config.enabled {
            return NatStatus::Disabled;
        }

        let forwarding = self.ip_forwarding_enabled().await;
        let masquerade = self.masquerade_present(&config.wan_interface).await;

        if forwarding && masquerade {
            NatStatus::Active
        } else {
            NatStatus::ConfiguredButInactive
        }
    }
}
