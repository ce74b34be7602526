// Network Center - Interface Inventory
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Physical interface enumeration.
//!
//! Reads link state from the kernel's sysfs interface without shell
//! commands, the same way statistics are collected:
//!
//! - `/sys/class/net/` - one entry per link
//! - `/sys/class/net/{name}/address` - MAC address
//! - `/sys/class/net/{name}/operstate` - up/down state
//!
//! Loopback and virtual links are excluded by a prefix denylist. On
//! enumeration failure a fixed fallback pair is returned so dependent flows
//! stay usable; the snapshot is marked degraded and must not be treated as
//! ground truth.

mod classify;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::host::Host;
use crate::models::{InterfaceType, LinkState, PhysicalInterface};

pub use classify::{InterfaceClassifier, PrefixClassifier};

/// Links whose names start with any of these are never physical.
pub const DENYLIST_PREFIXES: &[&str] =
    &["lo", "docker", "veth", "br-", "virbr", "vnet", "tun", "tap", "wg", "dummy", "sit"];

const SYSFS_NET: &str = "/sys/class/net";

/// One inventory query result.
#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    pub interfaces: Vec<PhysicalInterface>,
    /// True when enumeration failed and the fallback pair was substituted.
    pub degraded: bool,
}

impl InventorySnapshot {
    /// Find an interface by name.
    pub fn find(&self, name: &str) -> Option<&PhysicalInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Names of interfaces matching a type.
    pub fn names_of_type(&self, interface_type: InterfaceType) -> Vec<String> {
        self.interfaces
            .iter()
            .filter(|i| i.interface_type == interface_type)
            .map(|i| i.name.clone())
            .collect()
    }
}

/// Enumerates physical network links.
pub struct InterfaceInventory {
    host: Arc<dyn Host>,
    classifier: Arc<dyn InterfaceClassifier>,
}

impl InterfaceInventory {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host, classifier: Arc::new(PrefixClassifier) }
    }

    pub fn with_classifier(host: Arc<dyn Host>, classifier: Arc<dyn InterfaceClassifier>) -> Self {
        Self { host, classifier }
    }

    /// Enumerate physical interfaces.
    ///
    /// Recomputed on every call; results are never cached or persisted.
    pub async fn list_physical_interfaces(&self) -> InventorySnapshot {
        let names = match self.host.list_dir(Path::new(SYSFS_NET)).await {
            Ok(names) => names,
            Err(e) => {
                warn!("Interface enumeration failed, using fallback pair: {}", e);
                return Self::fallback_snapshot();
            }
        };

        let mut interfaces = Vec::new();
        for name in names {
            if DENYLIST_PREFIXES.iter().any(|p| name.starts_with(p)) {
                continue;
            }

            let mut iface =
                PhysicalInterface::new(&name, self.classifier.classify(&name));
            iface.mac_address = self.read_attribute(&name, "address").await.unwrap_or_default();
            iface.link_state = match self.read_attribute(&name, "operstate").await.as_deref() {
                Some("up") => LinkState::Up,
                _ => LinkState::Down,
            };
            interfaces.push(iface);
        }

        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        InventorySnapshot { interfaces, degraded: false }
    }

    async fn read_attribute(&self, name: &str, attribute: &str) -> Option<String> {
        let path = PathBuf::from(SYSFS_NET).join(name).join(attribute);
        self.host.read_file(&path).await.ok().map(|s| s.trim().to_string())
    }

    /// Fixed degraded-mode pair: one ethernet, one wireless.
    fn fallback_snapshot() -> InventorySnapshot {
        InventorySnapshot {
            interfaces: vec![
                PhysicalInterface::new("eth0", InterfaceType::Ethernet),
                PhysicalInterface::new("wlan0", InterfaceType::Wireless),
            ],
            degraded: true,
        }
    }
}
