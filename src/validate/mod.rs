// Network Center - Validation Engine
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Pure, read-only checks of a proposed WAN/LAN pair.
//!
//! Re-fetches the interface inventory on every call; nothing here mutates
//! the host. The result can go stale if inventory changes between
//! validation and mutation: the engine serializes mutations per resource,
//! but does not lock inventory.

use std::sync::Arc;

use serde::Serialize;

use crate::inventory::InterfaceInventory;
use crate::models::InterfaceType;

/// Outcome of a WAN/LAN pair validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self { valid: true, errors: Vec::new(), warnings: Vec::new() }
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
        self.valid = false;
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Validates interface pairings against the live inventory.
pub struct Validator {
    inventory: Arc<InterfaceInventory>,
}

impl Validator {
    pub fn new(inventory: Arc<InterfaceInventory>) -> Self {
        Self { inventory }
    }

    /// Check a WAN/LAN pair for internet sharing.
    ///
    /// The WAN side must be wireless-class and the LAN side ethernet-class;
    /// candidate lists come from the current inventory, not a hardcoded
    /// set. A link that is down is a warning, not an error, since
    /// configuring before a cable or association is legitimate.
    pub async fn validate_pair(&self, wan: &str, lan: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        let snapshot = self.inventory.list_physical_interfaces().await;

        if snapshot.degraded {
            report.warning(
                "interface inventory is degraded; names could not be confirmed against hardware"
                    .to_string(),
            );
        }

        if wan == lan {
            report.error(format!("WAN and LAN interface must differ (both are '{wan}')"));
        }

        let wireless = snapshot.names_of_type(InterfaceType::Wireless);
        let ethernet = snapshot.names_of_type(InterfaceType::Ethernet);

        match snapshot.find(wan) {
            None => report.error(format!(
                "WAN interface '{wan}' not found; wireless candidates: [{}]",
                wireless.join(", ")
            )),
            Some(iface) => {
                if !iface.is_wireless() {
                    report.error(format!(
                        "WAN interface '{wan}' is not wireless; wireless candidates: [{}]",
                        wireless.join(", ")
                    ));
                }
                if !iface.link_state.is_up() {
                    report.warning(format!("WAN interface '{wan}' link is down"));
                }
            }
        }

        match snapshot.find(lan) {
            None => report.error(format!(
                "LAN interface '{lan}' not found; ethernet candidates: [{}]",
                ethernet.join(", ")
            )),
            Some(iface) => {
                if !iface.is_ethernet() {
                    report.error(format!(
                        "LAN interface '{lan}' is not ethernet; ethernet candidates: [{}]",
                        ethernet.join(", ")
                    ));
                }
                if !iface.link_state.is_up() {
                    report.warning(format!("LAN interface '{lan}' link is down"));
                }
            }
        }

        report
    }
}
