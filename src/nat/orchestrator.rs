// Network Center - NAT Orchestrator
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Enable/disable sequences for internet sharing.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::{DEFAULT_DNSMASQ_CONF, DEFAULT_LEASE_TIME, GATEWAY_IP, GATEWAY_NETMASK};
use crate::apply::IpApplier;
use crate::error::EngineError;
use crate::host::{render_command, Host, OpError};
use crate::models::InterfaceConfig;

/// Result of one enable attempt.
///
/// `success = false` means a step failed; previously-applied steps are kept
/// rather than reverted. `disable` is the recovery path.
#[derive(Debug, Clone, Serialize)]
pub struct NatEnableReport {
    pub success: bool,
    pub wan: String,
    pub lan: String,
    pub gateway_ip: String,
    pub dhcp_range: String,
    pub errors: Vec<String>,
}

/// Drives the host's forwarding, masquerade, and DHCP-service primitives.
pub struct NatOrchestrator {
    host: Arc<dyn Host>,
    applier: Arc<IpApplier>,
    dnsmasq_conf: PathBuf,
    lease_time: String,
}

impl NatOrchestrator {
    pub fn new(host: Arc<dyn Host>, applier: Arc<IpApplier>) -> Self {
        Self {
            host,
            applier,
            dnsmasq_conf: PathBuf::from(DEFAULT_DNSMASQ_CONF),
            lease_time: DEFAULT_LEASE_TIME.to_string(),
        }
    }

    pub fn with_paths(
        host: Arc<dyn Host>,
        applier: Arc<IpApplier>,
        dnsmasq_conf: PathBuf,
        lease_time: &str,
    ) -> Self {
        Self { host, applier, dnsmasq_conf, lease_time: lease_time.to_string() }
    }

    /// Enable internet sharing from `wan` to `lan`.
    ///
    /// Validation must have passed before this is called. The sequence
    /// stops at the first failure; nothing already applied is reverted.
    pub async fn enable(
        &self,
        wan: &str,
        lan: &str,
        dhcp_start: &str,
        dhcp_end: &str,
    ) -> NatEnableReport {
        let mut report = NatEnableReport {
            success: true,
            wan: wan.to_string(),
            lan: lan.to_string(),
            gateway_ip: GATEWAY_IP.to_string(),
            dhcp_range: format!("{dhcp_start}-{dhcp_end}"),
            errors: Vec::new(),
        };

        if let Err(e) = self.enable_sequence(wan, lan, dhcp_start, dhcp_end).await {
            error!("Internet sharing enable failed ({} -> {}): {}", wan, lan, e);
            report.success = false;
            report.errors = e.messages();
        } else {
            info!("Internet sharing enabled: {} -> {} ({})", wan, lan, report.dhcp_range);
        }

        report
    }

    async fn enable_sequence(
        &self,
        wan: &str,
        lan: &str,
        dhcp_start: &str,
        dhcp_end: &str,
    ) -> Result<(), EngineError> {
        // Gateway address on the LAN side, through the ordinary applier.
        let mut gateway = InterfaceConfig::new_static(lan);
        gateway.address = Some(GATEWAY_IP.to_string());
        gateway.netmask = Some(GATEWAY_NETMASK.to_string());

        let apply = self.applier.apply(&gateway).await;
        if !apply.success {
            let detail = apply
                .failed_step()
                .and_then(|s| s.detail.clone())
                .unwrap_or_else(|| "unknown failure".to_string());
            return Err(EngineError::Apply { step: "assign gateway address".to_string(), detail });
        }

        self.run_required("sysctl", &["-w", "net.ipv4.ip_forward=1"]).await?;

        // Flush any stale copy before reinstalling each rule.
        self.run_best_effort(
            "iptables",
            &["-t", "nat", "-D", "POSTROUTING", "-o", wan, "-j", "MASQUERADE"],
        )
        .await;
        self.run_required(
            "iptables",
            &["-t", "nat", "-A", "POSTROUTING", "-o", wan, "-j", "MASQUERADE"],
        )
        .await?;

        let inbound =
            ["FORWARD", "-i", wan, "-o", lan, "-m", "state", "--state", "RELATED,ESTABLISHED", "-j", "ACCEPT"];
        self.run_best_effort("iptables", &with_op(&inbound, "-D")).await;
        self.run_required("iptables", &with_op(&inbound, "-A")).await?;

        let outbound = ["FORWARD", "-i", lan, "-o", wan, "-j", "ACCEPT"];
        self.run_best_effort("iptables", &with_op(&outbound, "-D")).await;
        self.run_required("iptables", &with_op(&outbound, "-A")).await?;

        self.write_dhcp_config(lan, dhcp_start, dhcp_end).await.map_err(EngineError::from)?;
        self.run_required("systemctl", &["restart", "dnsmasq"]).await?;
        self.run_best_effort("systemctl", &["enable", "dnsmasq"]).await;

        Ok(())
    }

    /// Tear internet sharing down.
    ///
    /// Steps are independent and idempotent by intent: rules that are
    /// already gone and a DHCP service that is already stopped are fine.
    pub async fn disable(&self, wan: &str, lan: &str) -> bool {
        self.run_best_effort(
            "iptables",
            &["-t", "nat", "-D", "POSTROUTING", "-o", wan, "-j", "MASQUERADE"],
        )
        .await;
        self.run_best_effort(
            "iptables",
            &["-D", "FORWARD", "-i", wan, "-o", lan, "-m", "state", "--state", "RELATED,ESTABLISHED", "-j", "ACCEPT"],
        )
        .await;
        self.run_best_effort("iptables", &["-D", "FORWARD", "-i", lan, "-o", wan, "-j", "ACCEPT"])
            .await;
        self.run_best_effort("systemctl", &["stop", "dnsmasq"]).await;

        match self.run_required("sysctl", &["-w", "net.ipv4.ip_forward=0"]).await {
            Ok(()) => {
                info!("Internet sharing disabled: {} -> {}", wan, lan);
                true
            }
            Err(e) => {
                error!("Failed to turn IP forwarding off: {}", e);
                false
            }
        }
    }

    async fn write_dhcp_config(
        &self,
        lan: &str,
        dhcp_start: &str,
        dhcp_end: &str,
    ) -> Result<(), OpError> {
        let contents = format!(
            "# Managed by network-center; do not edit.\n\
             interface={lan}\n\
             bind-interfaces\n\
             dhcp-range={dhcp_start},{dhcp_end},{lease}\n\
             dhcp-option=option:router,{GATEWAY_IP}\n\
             dhcp-option=option:dns-server,{GATEWAY_IP}\n",
            lease = self.lease_time,
        );
        self.host.write_file(&self.dnsmasq_conf, &contents).await
    }

    async fn run_required(&self, program: &str, args: &[&str]) -> Result<(), EngineError> {
        let command = render_command(program, args);
        self.host
            .run(program, args)
            .await
            .and_then(|output| output.require_success(&command))
            .map(|_| ())
            .map_err(EngineError::from)
    }

    async fn run_best_effort(&self, program: &str, args: &[&str]) {
        let command = render_command(program, args);
        match self.host.run(program, args).await {
            Ok(output) if output.success() => {}
            Ok(output) => debug!("Ignoring '{}' exit status {}", command, output.code),
            Err(e) => debug!("Ignoring '{}' failure: {}", command, e),
        }
    }
}

fn with_op<'a>(rule: &[&'a str], op: &'a str) -> Vec<&'a str> {
    let mut args = Vec::with_capacity(rule.len() + 1);
    args.push(op);
    args.extend_from_slice(rule);
    args
}
