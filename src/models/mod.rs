// Network Center - Models
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Data models for network-state entities.

mod firewall_rule;
mod interface;
mod interface_config;
mod nat_config;
mod result;

pub use firewall_rule::{
    validate_cidr, validate_port_spec, Direction, FirewallRule, Protocol, RuleAction, RuleSchedule,
};
pub use interface::{InterfaceType, LinkState, PhysicalInterface};
pub use interface_config::{netmask_to_prefix, InterfaceConfig, IpMode};
pub use nat_config::NatConfig;
pub use result::ServiceResult;
