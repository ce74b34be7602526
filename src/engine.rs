// Network Center - Engine
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Orchestration facade over the desired-state store and the host.
//!
//! Control flow for every mutation: validate synchronously, persist the
//! record, then converge live state on a background task. `success` in a
//! returned envelope therefore means "accepted and validated"; the status
//! and statistics queries are the source of truth for what the host
//! actually reflects.
//!
//! Mutations to the same resource key (an interface name, the NAT key, a
//! rule name) are strictly ordered through keyed async locks. Reads are
//! lock-free and safe under arbitrary concurrency.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::apply::IpApplier;
use crate::audit::AuditLog;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::firewall::RuleSynchronizer;
use crate::host::{Host, LocalHost};
use crate::inventory::{InterfaceInventory, InventorySnapshot};
use crate::models::{FirewallRule, InterfaceConfig, NatConfig, ServiceResult};
use crate::nat::{NatOrchestrator, GATEWAY_IP};
use crate::status::{InterfaceStats, NatStatus, StatusReporter};
use crate::store::StateStore;
use crate::validate::{ValidationReport, Validator};

/// Lock key serializing NAT mutations; there is one NAT configuration.
const NAT_KEY: &str = "nat";

/// Keyed async locks, one per mutated resource.
#[derive(Default)]
struct ResourceLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ResourceLocks {
    fn for_key(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.inner.lock().unwrap().entry(key.to_string()).or_default().clone()
    }
}

/// The network-state orchestration engine.
pub struct NetworkEngine {
    host: Arc<dyn Host>,
    store: Arc<StateStore>,
    audit: Arc<AuditLog>,
    inventory: Arc<InterfaceInventory>,
    applier: Arc<IpApplier>,
    nat: Arc<NatOrchestrator>,
    firewall: Arc<RuleSynchronizer>,
    validator: Validator,
    reporter: StatusReporter,
    locks: Arc<ResourceLocks>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkEngine {
    /// Engine actuating the local machine.
    pub fn new(config: &EngineConfig) -> Self {
        let host: Arc<dyn Host> =
            Arc::new(LocalHost::with_timeout(Duration::from_secs(config.command_timeout_secs)));
        Self::with_host(config, host)
    }

    /// Engine with an explicit host boundary.
    pub fn with_host(config: &EngineConfig, host: Arc<dyn Host>) -> Self {
        let store = Arc::new(StateStore::with_path(config.state_path.clone()));
        let audit = Arc::new(AuditLog::with_path(config.audit_path.clone()));
        let inventory = Arc::new(InterfaceInventory::new(host.clone()));
        let applier =
            Arc::new(IpApplier::with_resolv_conf(host.clone(), config.resolv_conf_path.clone()));
        let nat = Arc::new(NatOrchestrator::with_paths(
            host.clone(),
            applier.clone(),
            config.dnsmasq_conf_path.clone(),
            &config.dhcp_lease_time,
        ));
        let firewall = Arc::new(RuleSynchronizer::new(host.clone()));
        let validator = Validator::new(inventory.clone());
        let reporter = StatusReporter::new(host.clone());

        Self {
            host,
            store,
            audit,
            inventory,
            applier,
            nat,
            firewall,
            validator,
            reporter,
            locks: Arc::new(ResourceLocks::default()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Await every background apply spawned so far.
    ///
    /// Used for graceful shutdown; ordinary callers never wait on applies.
    pub async fn wait_for_background_tasks(&self) {
        let handles: Vec<JoinHandle<()>> = self.tasks.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn spawn(&self, task: impl Future<Output = ()> + Send + 'static) {
        let handle = tokio::spawn(task);
        self.tasks.lock().unwrap().push(handle);
    }

    // ── Inventory and status ────────────────────────────────────────────

    /// Enumerate physical interfaces as observed right now.
    pub async fn list_interfaces(&self) -> ServiceResult<InventorySnapshot> {
        let snapshot = self.inventory.list_physical_interfaces().await;
        let mut result = ServiceResult::ok(snapshot, "interface inventory");
        if result.data.as_ref().is_some_and(|s| s.degraded) {
            result.warnings.push(
                "interface enumeration failed; fallback interfaces substituted".to_string(),
            );
        }
        result
    }

    /// Live traffic counters for one interface.
    pub async fn interface_stats(&self, name: &str) -> ServiceResult<InterfaceStats> {
        match self.reporter.interface_stats(name).await {
            Ok(stats) => ServiceResult::ok(stats, "interface statistics"),
            Err(e) => ServiceResult::from_error("failed to read interface statistics", &e),
        }
    }

    /// Reconciled NAT state from the persisted record and live signals.
    pub async fn internet_sharing_status(&self) -> ServiceResult<NatStatus> {
        let current = self.store.current_nat_config();
        let status = self.reporter.nat_status(current.as_ref()).await;
        ServiceResult::ok(status, "internet sharing status")
    }

    /// Validate a WAN/LAN pair without mutating anything.
    pub async fn validate_sharing_pair(&self, wan: &str, lan: &str) -> ValidationReport {
        self.validator.validate_pair(wan, lan).await
    }

    // ── Interface configuration ─────────────────────────────────────────

    pub fn interface_configs(&self) -> Vec<InterfaceConfig> {
        self.store.all_interface_configs()
    }

    /// Create or update the configuration for one interface.
    pub async fn upsert_interface_config(
        &self,
        mut config: InterfaceConfig,
    ) -> ServiceResult<InterfaceConfig> {
        let errors = config.validation_errors();
        if !errors.is_empty() {
            let err = EngineError::validation(errors);
            return ServiceResult::from_error("interface configuration rejected", &err);
        }

        let mut warnings = Vec::new();
        let snapshot = self.inventory.list_physical_interfaces().await;
        if snapshot.find(&config.interface).is_none() {
            if snapshot.degraded {
                warnings.push(format!(
                    "interface '{}' could not be confirmed against hardware",
                    config.interface
                ));
            } else {
                let err = EngineError::not_found("interface", &config.interface);
                return ServiceResult::from_error("interface configuration rejected", &err);
            }
        }

        let now = now_stamp();
        config.created_at = self
            .store
            .interface_config(&config.interface)
            .map(|existing| existing.created_at)
            .filter(|stamp| !stamp.is_empty())
            .unwrap_or_else(|| now.clone());
        config.updated_at = now;

        self.store.upsert_interface_config(config.clone());
        self.audit.record(
            "interface.upsert",
            &format!("{} ({:?} mode)", config.interface, config.ip_mode),
        );

        let lock = self.locks.for_key(&config.interface);
        let applier = self.applier.clone();
        let audit = self.audit.clone();
        let task_config = config.clone();
        self.spawn(async move {
            let _guard = lock.lock().await;
            let report = applier.apply(&task_config).await;
            if report.success {
                info!("Applied configuration to {}", report.interface);
                audit.record("interface.apply", &format!("{} converged", report.interface));
            } else {
                let step = report
                    .failed_step()
                    .map(|s| s.label.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                error!("Apply to {} failed at step '{}'", report.interface, step);
                audit.record(
                    "interface.apply",
                    &format!("{} failed at step '{}'", report.interface, step),
                );
            }
        });

        ServiceResult::ok(config, "configuration accepted; apply scheduled")
            .with_warnings(warnings)
    }

    /// Remove an interface configuration; best-effort brings the link down.
    pub async fn delete_interface_config(&self, name: &str) -> ServiceResult<InterfaceConfig> {
        let removed = match self.store.remove_interface_config(name) {
            Some(config) => config,
            None => {
                let err = EngineError::not_found("interface configuration", name);
                return ServiceResult::from_error("delete rejected", &err);
            }
        };

        self.audit.record("interface.delete", name);

        let lock = self.locks.for_key(name);
        let host = self.host.clone();
        let interface = name.to_string();
        self.spawn(async move {
            let _guard = lock.lock().await;
            match host.run("ip", &["link", "set", &interface, "down"]).await {
                Ok(output) if output.success() => {
                    info!("Brought {} down after config removal", interface)
                }
                Ok(output) => {
                    warn!("Bringing {} down exited with status {}", interface, output.code)
                }
                Err(e) => warn!("Bringing {} down failed: {}", interface, e),
            }
        });

        ServiceResult::ok(removed, "configuration removed; link down scheduled")
    }

    // ── Internet sharing ────────────────────────────────────────────────

    /// Validate, persist, and schedule an internet-sharing enable.
    pub async fn enable_internet_sharing(
        &self,
        wan: &str,
        lan: &str,
        dhcp_start: &str,
        dhcp_end: &str,
    ) -> ServiceResult<NatConfig> {
        let range_errors = NatConfig::range_errors(dhcp_start, dhcp_end);
        if !range_errors.is_empty() {
            let err = EngineError::validation(range_errors);
            return ServiceResult::from_error("internet sharing rejected", &err);
        }

        let validation = self.validator.validate_pair(wan, lan).await;
        if !validation.valid {
            return ServiceResult::failure("internet sharing rejected", validation.errors)
                .with_warnings(validation.warnings);
        }

        let config = NatConfig::new(wan, lan, dhcp_start, dhcp_end, GATEWAY_IP);
        self.store.append_nat_config(config.clone());
        self.audit.record(
            "nat.enable",
            &format!("{} -> {} ({})", wan, lan, config.dhcp_range()),
        );

        let lock = self.locks.for_key(NAT_KEY);
        let nat = self.nat.clone();
        let audit = self.audit.clone();
        let task_config = config.clone();
        self.spawn(async move {
            let _guard = lock.lock().await;
            let report = nat
                .enable(
                    &task_config.wan_interface,
                    &task_config.lan_interface,
                    &task_config.dhcp_range_start,
                    &task_config.dhcp_range_end,
                )
                .await;
            if report.success {
                audit.record("nat.apply", &format!("{} -> {} active", report.wan, report.lan));
            } else {
                audit.record(
                    "nat.apply",
                    &format!("{} -> {} failed: {}", report.wan, report.lan, report.errors.join("; ")),
                );
            }
        });

        ServiceResult::ok(config, "internet sharing accepted; enable scheduled")
            .with_warnings(validation.warnings)
    }

    /// Persist a disabled record and schedule the teardown.
    pub async fn disable_internet_sharing(&self) -> ServiceResult<NatConfig> {
        let current = match self.store.current_nat_config() {
            Some(config) => config,
            None => {
                let err = EngineError::not_found("NAT configuration", "current");
                return ServiceResult::from_error("disable rejected", &err);
            }
        };

        let disabled = current.disabled_copy();
        self.store.append_nat_config(disabled.clone());
        self.audit.record(
            "nat.disable",
            &format!("{} -> {}", disabled.wan_interface, disabled.lan_interface),
        );

        let lock = self.locks.for_key(NAT_KEY);
        let nat = self.nat.clone();
        let audit = self.audit.clone();
        let task_config = disabled.clone();
        self.spawn(async move {
            let _guard = lock.lock().await;
            let ok = nat.disable(&task_config.wan_interface, &task_config.lan_interface).await;
            let outcome = if ok { "torn down" } else { "teardown incomplete" };
            audit.record(
                "nat.apply",
                &format!("{} -> {} {}", task_config.wan_interface, task_config.lan_interface, outcome),
            );
        });

        ServiceResult::ok(disabled, "internet sharing disable scheduled")
    }

    // ── Firewall rules ──────────────────────────────────────────────────

    pub fn firewall_rules(&self) -> Vec<FirewallRule> {
        self.store.all_firewall_rules()
    }

    /// Create or update a rule and schedule host synchronization.
    pub async fn put_firewall_rule(&self, rule: FirewallRule) -> ServiceResult<FirewallRule> {
        let errors = rule.validation_errors();
        if !errors.is_empty() {
            let err = EngineError::validation(errors);
            return ServiceResult::from_error("firewall rule rejected", &err);
        }

        self.store.upsert_firewall_rule(rule.clone());
        self.audit.record("firewall.put", &rule.rule_name);
        self.schedule_rule_sync(rule.clone());

        ServiceResult::ok(rule, "rule accepted; synchronization scheduled")
    }

    /// Remove a rule record and schedule removal from the host.
    pub async fn delete_firewall_rule(&self, name: &str) -> ServiceResult<FirewallRule> {
        let removed = match self.store.remove_firewall_rule(name) {
            Some(rule) => rule,
            None => {
                let err = EngineError::not_found("firewall rule", name);
                return ServiceResult::from_error("delete rejected", &err);
            }
        };

        self.audit.record("firewall.delete", name);

        let lock = self.locks.for_key(name);
        let firewall = self.firewall.clone();
        let audit = self.audit.clone();
        let rule_name = name.to_string();
        self.spawn(async move {
            let _guard = lock.lock().await;
            let ok = firewall.remove(&rule_name).await;
            let outcome = if ok { "removed from host" } else { "host removal failed" };
            audit.record("firewall.sync", &format!("{rule_name} {outcome}"));
        });

        ServiceResult::ok(removed, "rule removed; host removal scheduled")
    }

    /// Replace a rule: remove the old record, persist and sync the new one.
    ///
    /// Host-side this is remove-then-install, not atomic: interrupted in
    /// between, the rule is absent until the next sync.
    pub async fn replace_firewall_rule(
        &self,
        old_name: &str,
        rule: FirewallRule,
    ) -> ServiceResult<FirewallRule> {
        let errors = rule.validation_errors();
        if !errors.is_empty() {
            let err = EngineError::validation(errors);
            return ServiceResult::from_error("firewall rule rejected", &err);
        }

        if self.store.firewall_rule(old_name).is_none() {
            let err = EngineError::not_found("firewall rule", old_name);
            return ServiceResult::from_error("replace rejected", &err);
        }

        if old_name != rule.rule_name {
            self.store.remove_firewall_rule(old_name);
        }
        self.store.upsert_firewall_rule(rule.clone());
        self.audit.record("firewall.replace", &format!("{} -> {}", old_name, rule.rule_name));

        // Lock both names in sorted order so concurrent replaces on the
        // same pair cannot deadlock.
        let mut keys = vec![old_name.to_string(), rule.rule_name.clone()];
        keys.sort();
        keys.dedup();
        let locks: Vec<_> = keys.iter().map(|k| self.locks.for_key(k)).collect();

        let firewall = self.firewall.clone();
        let audit = self.audit.clone();
        let old = old_name.to_string();
        let task_rule = rule.clone();
        self.spawn(async move {
            let mut guards = Vec::with_capacity(locks.len());
            for lock in &locks {
                guards.push(lock.lock().await);
            }
            let ok = firewall.replace(&old, &task_rule).await;
            let outcome = if ok { "replaced on host" } else { "host replace failed" };
            audit.record("firewall.sync", &format!("{} -> {} {}", old, task_rule.rule_name, outcome));
        });

        ServiceResult::ok(rule, "rule accepted; replacement scheduled")
    }

    /// Refresh a rule's observational hit counters from the host.
    pub async fn refresh_firewall_rule_hits(&self, name: &str) -> ServiceResult<FirewallRule> {
        let mut rule = match self.store.firewall_rule(name) {
            Some(rule) => rule,
            None => {
                let err = EngineError::not_found("firewall rule", name);
                return ServiceResult::from_error("refresh rejected", &err);
            }
        };

        match self.firewall.hit_count(name).await {
            Some(count) => {
                if count > rule.hit_count {
                    rule.last_hit = Some(now_stamp());
                }
                rule.hit_count = count;
                self.store.upsert_firewall_rule(rule.clone());
                ServiceResult::ok(rule, "hit counters refreshed")
            }
            None => ServiceResult::ok(rule, "hit counters unavailable")
                .with_warnings(vec!["no host counters found for rule".to_string()]),
        }
    }

    fn schedule_rule_sync(&self, rule: FirewallRule) {
        let lock = self.locks.for_key(&rule.rule_name);
        let firewall = self.firewall.clone();
        let audit = self.audit.clone();
        self.spawn(async move {
            let _guard = lock.lock().await;
            let ok = firewall.sync(&rule).await;
            let outcome = if ok { "synchronized" } else { "synchronization failed" };
            audit.record("firewall.sync", &format!("{} {}", rule.rule_name, outcome));
        });
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
