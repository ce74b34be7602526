// Network Center - Interface Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Physical interface model.

use serde::{Deserialize, Serialize};

/// Classified type of a physical interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    Ethernet,
    Wireless,
    Other,
}

impl InterfaceType {
    /// Human-readable label for display names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::Wireless => "Wireless",
            Self::Other => "Network",
        }
    }
}

/// Carrier state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

impl LinkState {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

/// A physical network link as observed right now.
///
/// Ephemeral ground truth: recomputed on every query, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalInterface {
    /// Stable OS identifier (e.g. `eth0`, `wlp3s0`).
    pub name: String,
    /// Derived display name (e.g. "Ethernet (eth0)").
    pub display_name: String,
    pub interface_type: InterfaceType,
    pub link_state: LinkState,
    pub mac_address: String,
}

impl PhysicalInterface {
    pub fn new(name: &str, interface_type: InterfaceType) -> Self {
        Self {
            name: name.to_string(),
            display_name: format!("{} ({})", interface_type.label(), name),
            interface_type,
            link_state: LinkState::Down,
            mac_address: String::new(),
        }
    }

    pub fn is_wireless(&self) -> bool {
        self.interface_type == InterfaceType::Wireless
    }

    pub fn is_ethernet(&self) -> bool {
        self.interface_type == InterfaceType::Ethernet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_carries_type_label() {
        let iface = PhysicalInterface::new("eth0", InterfaceType::Ethernet);
        assert_eq!(iface.display_name, "Ethernet (eth0)");
        assert!(iface.is_ethernet());
        assert!(!iface.is_wireless());
    }
}
