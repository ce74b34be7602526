// Network Center - Configuration
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Engine settings management using a local JSON file.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::nat::{DEFAULT_DNSMASQ_CONF, DEFAULT_LEASE_TIME};

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path of the desired-state store document.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Path of the audit log.
    #[serde(default = "default_audit_path")]
    pub audit_path: PathBuf,
    /// Per-invocation host command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub command_timeout_secs: u64,
    /// Where the scoped DHCP responder configuration is written.
    #[serde(default = "default_dnsmasq_conf")]
    pub dnsmasq_conf_path: PathBuf,
    /// Resolver configuration overwritten by static DNS settings.
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf_path: PathBuf,
    /// DHCP lease time handed to the responder.
    #[serde(default = "default_lease_time")]
    pub dhcp_lease_time: String,
}

fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("network-center")
}

fn default_state_path() -> PathBuf {
    config_dir().join("state.json")
}

fn default_audit_path() -> PathBuf {
    config_dir().join("audit.log")
}

fn default_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_dnsmasq_conf() -> PathBuf {
    PathBuf::from(DEFAULT_DNSMASQ_CONF)
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from("/etc/resolv.conf")
}

fn default_lease_time() -> String {
    DEFAULT_LEASE_TIME.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            audit_path: default_audit_path(),
            command_timeout_secs: default_timeout(),
            dnsmasq_conf_path: default_dnsmasq_conf(),
            resolv_conf_path: default_resolv_conf(),
            dhcp_lease_time: default_lease_time(),
        }
    }
}

impl EngineConfig {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        let path = config_dir().join("engine.json");
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse engine settings: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read engine settings: {}", e);
                Self::default()
            }
        }
    }
}
