// Network Center - Desired-State Store
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Persistent storage for desired-state records.
//!
//! Interface configurations and firewall rules are keyed documents;
//! NAT configurations are an append-only history where the current record
//! is the most recently created one. History is never pruned.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{FirewallRule, InterfaceConfig, NatConfig};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    interfaces: HashMap<String, InterfaceConfig>,
    #[serde(default)]
    nat_history: Vec<NatConfig>,
    #[serde(default)]
    firewall_rules: HashMap<String, FirewallRule>,
}

/// JSON-backed store of desired-state documents.
#[derive(Debug)]
pub struct StateStore {
    data: Mutex<StoreData>,
    path: PathBuf,
}

impl StateStore {
    /// Store at the default location under the user config directory.
    pub fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("network-center")
            .join("state.json");
        Self::with_path(path)
    }

    /// Store at an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        let data = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Failed to parse state store, starting empty: {}", e);
                    StoreData::default()
                }
            },
            Err(_) => StoreData::default(),
        };

        Self { data: Mutex::new(data), path }
    }

    fn save(&self, data: &StoreData) {
        use std::io::Write;
        #[cfg(unix)]
        use std::os::unix::fs::PermissionsExt;

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let content = match serde_json::to_string_pretty(data) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to serialize state store: {}", e);
                return;
            }
        };

        match fs::File::create(&self.path) {
            Ok(mut file) => {
                #[cfg(unix)]
                {
                    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
                        warn!("Failed to set state store permissions: {}", e);
                    }
                }
                if let Err(e) = file.write_all(content.as_bytes()) {
                    warn!("Failed to save state store: {}", e);
                }
            }
            Err(e) => {
                warn!("Failed to create state store file: {}", e);
            }
        }
    }

    // ── Interface configurations ────────────────────────────────────────

    pub fn interface_config(&self, name: &str) -> Option<InterfaceConfig> {
        self.data.lock().unwrap().interfaces.get(name).cloned()
    }

    pub fn all_interface_configs(&self) -> Vec<InterfaceConfig> {
        let mut configs: Vec<_> =
            self.data.lock().unwrap().interfaces.values().cloned().collect();
        configs.sort_by(|a, b| a.interface.cmp(&b.interface));
        configs
    }

    /// Insert or overwrite the one record for this interface name.
    pub fn upsert_interface_config(&self, config: InterfaceConfig) {
        let mut data = self.data.lock().unwrap();
        data.interfaces.insert(config.interface.clone(), config);
        self.save(&data);
    }

    pub fn remove_interface_config(&self, name: &str) -> Option<InterfaceConfig> {
        let mut data = self.data.lock().unwrap();
        let removed = data.interfaces.remove(name);
        if removed.is_some() {
            self.save(&data);
        }
        removed
    }

    // ── NAT configurations (append-only) ────────────────────────────────

    /// Append a new record; it becomes the current configuration.
    pub fn append_nat_config(&self, config: NatConfig) {
        let mut data = self.data.lock().unwrap();
        data.nat_history.push(config);
        self.save(&data);
    }

    /// Most recently created record, never mutated in place.
    pub fn current_nat_config(&self) -> Option<NatConfig> {
        self.data.lock().unwrap().nat_history.last().cloned()
    }

    pub fn nat_history_len(&self) -> usize {
        self.data.lock().unwrap().nat_history.len()
    }

    // ── Firewall rules ──────────────────────────────────────────────────

    pub fn firewall_rule(&self, name: &str) -> Option<FirewallRule> {
        self.data.lock().unwrap().firewall_rules.get(name).cloned()
    }

    pub fn all_firewall_rules(&self) -> Vec<FirewallRule> {
        let mut rules: Vec<_> =
            self.data.lock().unwrap().firewall_rules.values().cloned().collect();
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.rule_name.cmp(&b.rule_name)));
        rules
    }

    pub fn upsert_firewall_rule(&self, rule: FirewallRule) {
        let mut data = self.data.lock().unwrap();
        data.firewall_rules.insert(rule.rule_name.clone(), rule);
        self.save(&data);
    }

    pub fn remove_firewall_rule(&self, name: &str) -> Option<FirewallRule> {
        let mut data = self.data.lock().unwrap();
        let removed = data.firewall_rules.remove(name);
        if removed.is_some() {
            self.save(&data);
        }
        removed
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Protocol, RuleAction};

    fn temp_store(tag: &str) -> StateStore {
        let path = std::env::temp_dir()
            .join("network-center-tests")
            .join(format!("{}-{}.json", tag, std::process::id()));
        let _ = fs::remove_file(&path);
        StateStore::with_path(path)
    }

    #[test]
    fn one_config_per_interface_name() {
        let store = temp_store("iface");

        let mut cfg = InterfaceConfig::new_dhcp("eth0");
        store.upsert_interface_config(cfg.clone());

        cfg.ip_mode = crate::models::IpMode::Static;
        cfg.address = Some("10.0.0.2".into());
        store.upsert_interface_config(cfg);

        assert_eq!(store.all_interface_configs().len(), 1);
        let loaded = store.interface_config("eth0").unwrap();
        assert_eq!(loaded.address.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn nat_history_is_append_only_and_last_wins() {
        let store = temp_store("nat");
        assert!(store.current_nat_config().is_none());

        let first =
            NatConfig::new("wlan0", "eth0", "192.168.100.100", "192.168.100.200", "192.168.100.1");
        store.append_nat_config(first.clone());
        store.append_nat_config(first.disabled_copy());

        assert_eq!(store.nat_history_len(), 2);
        let current = store.current_nat_config().unwrap();
        assert!(!current.enabled);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let path = std::env::temp_dir()
            .join("network-center-tests")
            .join(format!("roundtrip-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        {
            let store = StateStore::with_path(path.clone());
            let rule = FirewallRule::new("ssh", Protocol::Tcp, RuleAction::Allow, Direction::In);
            store.upsert_firewall_rule(rule);
        }

        let reloaded = StateStore::with_path(path);
        assert!(reloaded.firewall_rule("ssh").is_some());
        assert_eq!(reloaded.all_firewall_rules().len(), 1);
    }

    #[test]
    fn rules_sort_by_priority() {
        let store = temp_store("rules");

        let mut low = FirewallRule::new("low", Protocol::Tcp, RuleAction::Allow, Direction::In);
        low.priority = 900;
        let mut high = FirewallRule::new("high", Protocol::Tcp, RuleAction::Allow, Direction::In);
        high.priority = 10;

        store.upsert_firewall_rule(low);
        store.upsert_firewall_rule(high);

        let names: Vec<String> =
            store.all_firewall_rules().into_iter().map(|r| r.rule_name).collect();
        assert_eq!(names, vec!["high", "low"]);

        assert!(store.remove_firewall_rule("high").is_some());
        assert!(store.remove_firewall_rule("high").is_none());
    }
}
