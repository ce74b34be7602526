// Network Center - IP Configuration Applier
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Converges one interface to its desired addressing state.
//!
//! Each step is an independent host invocation. Critical step failures
//! abort the remaining sequence; best-effort failures (deleting a default
//! route that does not exist, setting MTU) are logged and ignored. There is
//! no rollback: a failed apply can leave the interface partially
//! configured, which the status reporter will surface as drift.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};

use crate::host::{render_command, Host};
use crate::models::{netmask_to_prefix, InterfaceConfig, IpMode};

const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Outcome of one step in an apply sequence.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub label: String,
    pub critical: bool,
    pub ok: bool,
    /// Error detail when the step failed.
    pub detail: Option<String>,
}

/// Per-step outcomes of one apply run.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub interface: String,
    pub steps: Vec<StepReport>,
    /// False once a critical step has failed.
    pub success: bool,
}

impl ApplyReport {
    fn new(interface: &str) -> Self {
        Self { interface: interface.to_string(), steps: Vec::new(), success: true }
    }

    fn push_ok(&mut self, label: &str, critical: bool) {
        self.steps.push(StepReport {
            label: label.to_string(),
            critical,
            ok: true,
            detail: None,
        });
    }

    fn push_failed(&mut self, label: &str, critical: bool, detail: String) {
        self.steps.push(StepReport {
            label: label.to_string(),
            critical,
            ok: false,
            detail: Some(detail),
        });
        if critical {
            self.success = false;
        }
    }

    /// The critical step that aborted the sequence, if any.
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.critical && !s.ok)
    }
}

/// Applies desired addressing state to one interface.
pub struct IpApplier {
    host: Arc<dyn Host>,
    resolv_conf: PathBuf,
}

impl IpApplier {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host, resolv_conf: PathBuf::from(DEFAULT_RESOLV_CONF) }
    }

    pub fn with_resolv_conf(host: Arc<dyn Host>, resolv_conf: PathBuf) -> Self {
        Self { host, resolv_conf }
    }

    /// Run the ordered step sequence for this configuration.
    pub async fn apply(&self, config: &InterfaceConfig) -> ApplyReport {
        let interface = config.interface.as_str();
        let mut report = ApplyReport::new(interface);

        if !config.admin_enabled {
            self.run_step(&mut report, "link down", true, "ip", &["link", "set", interface, "down"])
                .await;
            return report;
        }

        match config.ip_mode {
            IpMode::Static => self.apply_static(config, &mut report).await,
            IpMode::Dhcp => self.apply_dhcp(config, &mut report).await,
        }

        report
    }

    async fn apply_static(&self, config: &InterfaceConfig, report: &mut ApplyReport) {
        let interface = config.interface.as_str();

        let address = config.address.as_deref().unwrap_or_default();
        let prefix = match config.netmask.as_deref().and_then(netmask_to_prefix) {
            Some(prefix) => prefix,
            None => {
                report.push_failed(
                    "convert netmask",
                    true,
                    format!("unusable netmask: {:?}", config.netmask),
                );
                return;
            }
        };
        let cidr = format!("{address}/{prefix}");

        if !self
            .run_step(report, "flush addresses", true, "ip", &["addr", "flush", "dev", interface])
            .await
        {
            return;
        }
        if !self
            .run_step(report, "add address", true, "ip", &["addr", "add", &cidr, "dev", interface])
            .await
        {
            return;
        }
        if !self.run_step(report, "link up", true, "ip", &["link", "set", interface, "up"]).await {
            return;
        }

        if let Some(gateway) = config.gateway.as_deref() {
            // The old default route may not exist.
            self.run_step(report, "delete default route", false, "ip", &["route", "del", "default"])
                .await;
            if !self
                .run_step(
                    report,
                    "replace default route",
                    true,
                    "ip",
                    &["route", "replace", "default", "via", gateway, "dev", interface],
                )
                .await
            {
                return;
            }
        }

        if let Some(mtu) = config.mtu {
            let mtu = mtu.to_string();
            self.run_step(report, "set mtu", false, "ip", &["link", "set", interface, "mtu", &mtu])
                .await;
        }

        let dns: Vec<&str> = [config.dns_primary.as_deref(), config.dns_secondary.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !dns.is_empty() {
            self.write_resolver(report, &dns).await;
        }
    }

    async fn apply_dhcp(&self, config: &InterfaceConfig, report: &mut ApplyReport) {
        let interface = config.interface.as_str();

        // pkill exits non-zero when no client was running.
        let pattern = format!("dhclient.*{interface}");
        self.run_step(report, "stop dhcp client", false, "pkill", &["-f", &pattern]).await;

        if !self
            .run_step(report, "flush addresses", true, "ip", &["addr", "flush", "dev", interface])
            .await
        {
            return;
        }
        if !self.run_step(report, "link up", true, "ip", &["link", "set", interface, "up"]).await {
            return;
        }
        self.run_step(report, "start dhcp client", true, "dhclient", &["-nw", interface]).await;
    }

    /// Overwrite the resolver configuration wholesale.
    async fn write_resolver(&self, report: &mut ApplyReport, servers: &[&str]) {
        let mut contents = String::new();
        for server in servers {
            contents.push_str(&format!("nameserver {server}\n"));
        }

        match self.host.write_file(&self.resolv_conf, &contents).await {
            Ok(()) => report.push_ok("write resolver config", false),
            Err(e) => {
                warn!("Ignoring resolver config write failure: {}", e);
                report.push_failed("write resolver config", false, e.to_string());
            }
        }
    }

    /// Run one step; returns whether the sequence should continue.
    async fn run_step(
        &self,
        report: &mut ApplyReport,
        label: &str,
        critical: bool,
        program: &str,
        args: &[&str],
    ) -> bool {
        let command = render_command(program, args);
        let result = self
            .host
            .run(program, args)
            .await
            .and_then(|output| output.require_success(&command));

        match result {
            Ok(_) => {
                report.push_ok(label, critical);
                true
            }
            Err(e) if critical => {
                error!("Apply step '{}' failed on {}: {}", label, report.interface, e);
                report.push_failed(label, critical, e.to_string());
                false
            }
            Err(e) => {
                warn!("Ignoring failure of step '{}' on {}: {}", label, report.interface, e);
                report.push_failed(label, critical, e.to_string());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::host::OpError;

    fn static_config() -> InterfaceConfig {
        let mut cfg = InterfaceConfig::new_static("eth0");
        cfg.address = Some("192.168.1.10".into());
        cfg.netmask = Some("255.255.255.0".into());
        cfg.gateway = Some("192.168.1.1".into());
        cfg.dns_primary = Some("1.1.1.1".into());
        cfg.dns_secondary = Some("8.8.8.8".into());
        cfg.mtu = Some(1500);
        cfg
    }

    #[tokio::test]
    async fn static_sequence_is_ordered() {
        let host = Arc::new(FakeHost::new());
        let applier = IpApplier::new(host.clone());

        let report = applier.apply(&static_config()).await;
        assert!(report.success);

        let commands = host.recorded();
        assert_eq!(
            commands,
            vec![
                "ip addr flush dev eth0",
                "ip addr add 192.168.1.10/24 dev eth0",
                "ip link set eth0 up",
                "ip route del default",
                "ip route replace default via 192.168.1.1 dev eth0",
                "ip link set eth0 mtu 1500",
            ]
        );
        assert_eq!(
            host.file("/etc/resolv.conf").unwrap(),
            "nameserver 1.1.1.1\nnameserver 8.8.8.8\n"
        );
    }

    #[tokio::test]
    async fn reapplying_unchanged_config_is_idempotent() {
        let host = Arc::new(FakeHost::new());
        let applier = IpApplier::new(host.clone());

        applier.apply(&static_config()).await;
        let first = host.recorded();
        host.clear_recorded();

        let report = applier.apply(&static_config()).await;
        assert!(report.success);
        assert_eq!(host.recorded(), first);
    }

    #[tokio::test]
    async fn missing_gateway_skips_route_steps() {
        let host = Arc::new(FakeHost::new());
        let applier = IpApplier::new(host.clone());

        let mut cfg = static_config();
        cfg.gateway = None;
        applier.apply(&cfg).await;

        assert!(!host.ran("route"));
    }

    #[tokio::test]
    async fn failed_route_delete_is_swallowed() {
        let host = Arc::new(FakeHost::new());
        host.exit_code("route del default", 2);
        let applier = IpApplier::new(host.clone());

        let report = applier.apply(&static_config()).await;
        assert!(report.success);
        assert!(host.ran("ip route replace default"));

        let step = report.steps.iter().find(|s| s.label == "delete default route").unwrap();
        assert!(!step.ok);
        assert!(!step.critical);
    }

    #[tokio::test]
    async fn failed_link_up_aborts_sequence() {
        let host = Arc::new(FakeHost::new());
        host.exit_code("link set eth0 up", 1);
        let applier = IpApplier::new(host.clone());

        let report = applier.apply(&static_config()).await;
        assert!(!report.success);
        assert_eq!(report.failed_step().unwrap().label, "link up");
        // Nothing after the aborted step ran.
        assert!(!host.ran("route"));
        assert!(host.file("/etc/resolv.conf").is_none());
    }

    #[tokio::test]
    async fn dhcp_sequence_restarts_client() {
        let host = Arc::new(FakeHost::new());
        // No client was running; pkill reports no match.
        host.exit_code("pkill", 1);
        let applier = IpApplier::new(host.clone());

        let report = applier.apply(&InterfaceConfig::new_dhcp("eth1")).await;
        assert!(report.success);
        assert_eq!(
            host.recorded(),
            vec![
                "pkill -f dhclient.*eth1",
                "ip addr flush dev eth1",
                "ip link set eth1 up",
                "dhclient -nw eth1",
            ]
        );
    }

    #[tokio::test]
    async fn missing_ip_binary_fails_critically() {
        let host = Arc::new(FakeHost::new());
        host.fail_matching("ip addr flush", OpError::MissingBinary { program: "ip".into() });
        let applier = IpApplier::new(host.clone());

        let report = applier.apply(&static_config()).await;
        assert!(!report.success);
        assert_eq!(report.steps.len(), 1);
    }

    #[tokio::test]
    async fn disabled_config_brings_link_down() {
        let host = Arc::new(FakeHost::new());
        let applier = IpApplier::new(host.clone());

        let mut cfg = static_config();
        cfg.admin_enabled = false;
        let report = applier.apply(&cfg).await;

        assert!(report.success);
        assert_eq!(host.recorded(), vec!["ip link set eth0 down"]);
    }
}
