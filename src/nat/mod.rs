// Network Center - NAT Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! NAT / internet-sharing orchestration.
//!
//! Shares one interface's upstream connectivity with devices behind
//! another, via masquerade, IP forwarding, and a scoped DHCP responder.

mod orchestrator;

pub use orchestrator::{NatEnableReport, NatOrchestrator};

/// Fixed gateway address assigned to the LAN interface.
pub const GATEWAY_IP: &str = "192.168.100.1";

/// Netmask of the shared network.
pub const GATEWAY_NETMASK: &str = "255.255.255.0";

/// Default DHCP lease time handed to the DHCP responder.
pub const DEFAULT_LEASE_TIME: &str = "12h";

/// Default location of the scoped DHCP responder configuration.
pub const DEFAULT_DNSMASQ_CONF: &str = "/etc/dnsmasq.d/network-center.conf";
