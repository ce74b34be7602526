// Network Center - Firewall Rule Synchronizer
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Maps declarative rules onto host packet-filter primitives.
//!
//! Host rules are keyed by a comment tag carrying the rule name, so a rule
//! can be found and removed regardless of its match arguments. `replace` is
//! remove-then-sync and is not atomic: a crash in between leaves the rule
//! absent. Callers re-query the host to confirm it reflects a change.

use std::sync::Arc;

use tracing::{info, warn};

use super::{chains, rule_tag};
use crate::host::{render_command, Host};
use crate::models::{Direction, FirewallRule, Protocol};

/// Synchronizes declarative rules with the host firewall.
pub struct RuleSynchronizer {
    host: Arc<dyn Host>,
}

impl RuleSynchronizer {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Converge the host to this rule record.
    ///
    /// A disabled rule converges to absence. An enabled rule is removed and
    /// reinstalled so edits do not accumulate stale copies.
    pub async fn sync(&self, rule: &FirewallRule) -> bool {
        if !self.remove(&rule.rule_name).await {
            return false;
        }
        if !rule.enabled {
            info!("Rule '{}' is disabled; host copy removed", rule.rule_name);
            return true;
        }

        for chain in rule_chains(rule.direction) {
            let args = build_rule_args(rule, chain);
            let arg_refs: Vec<&str> = args.iter().map(|a| a.as_str()).collect();
            let command = render_command("iptables", &arg_refs);

            let result = self
                .host
                .run("iptables", &arg_refs)
                .await
                .and_then(|output| output.require_success(&command));

            if let Err(e) = result {
                warn!("Failed to install rule '{}': {}", rule.rule_name, e);
                return false;
            }
        }

        info!("Rule '{}' synchronized", rule.rule_name);
        true
    }

    /// Remove every host rule carrying this rule name.
    pub async fn remove(&self, rule_name: &str) -> bool {
        let tag = rule_tag(rule_name);
        let mut ok = true;

        for chain in chains::ALL {
            let listing = match self.host.run("iptables", &["-S", chain]).await {
                Ok(output) if output.success() => output.stdout,
                Ok(output) => {
                    warn!("Listing chain {} failed with status {}", chain, output.code);
                    ok = false;
                    continue;
                }
                Err(e) => {
                    warn!("Listing chain {} failed: {}", chain, e);
                    ok = false;
                    continue;
                }
            };

            for line in listing.lines() {
                let tokens: Vec<String> =
                    line.split_whitespace().map(|t| t.trim_matches('"').to_string()).collect();
                if tokens.first().map(String::as_str) != Some("-A")
                    || !tokens.iter().any(|t| t == &tag)
                {
                    continue;
                }

                let mut delete = tokens.clone();
                delete[0] = "-D".to_string();
                let arg_refs: Vec<&str> = delete.iter().map(|a| a.as_str()).collect();
                let command = render_command("iptables", &arg_refs);

                let result = self
                    .host
                    .run("iptables", &arg_refs)
                    .await
                    .and_then(|output| output.require_success(&command));

                if let Err(e) = result {
                    warn!("Failed to delete rule '{}' from {}: {}", rule_name, chain, e);
                    ok = false;
                }
            }
        }

        ok
    }

    /// Remove the old rule, then install the new one. Not atomic.
    pub async fn replace(&self, old_name: &str, rule: &FirewallRule) -> bool {
        if !self.remove(old_name).await {
            return false;
        }
        self.sync(rule).await
    }

    /// Read the live packet count for a rule from the host counters.
    pub async fn hit_count(&self, rule_name: &str) -> Option<u64> {
        let tag = rule_tag(rule_name);
        let mut total = 0u64;
        let mut seen = false;

        for chain in chains::ALL {
            let output = self.host.run("iptables", &["-L", chain, "-v", "-x", "-n"]).await.ok()?;
            if !output.success() {
                continue;
            }
            for line in output.stdout.lines() {
                if !line.contains(&tag) {
                    continue;
                }
                if let Some(pkts) = line.split_whitespace().next().and_then(|t| t.parse::<u64>().ok()) {
                    total += pkts;
                    seen = true;
                }
            }
        }

        seen.then_some(total)
    }
}

fn rule_chains(direction: Direction) -> &'static [&'static str] {
    match direction {
        Direction::In => &[chains::INPUT],
        Direction::Out => &[chains::OUTPUT],
        Direction::Both => chains::ALL,
    }
}

/// Render one rule into packet-filter arguments for a chain.
fn build_rule_args(rule: &FirewallRule, chain: &str) -> Vec<String> {
    let mut args = vec!["-A".to_string(), chain.to_string()];

    if rule.protocol != Protocol::Any {
        args.push("-p".to_string());
        args.push(rule.protocol.as_str().to_string());
    }

    if !rule.source_ips.is_empty() {
        args.push("-s".to_string());
        args.push(rule.source_ips.join(","));
    }
    if !rule.destination_ips.is_empty() {
        args.push("-d".to_string());
        args.push(rule.destination_ips.join(","));
    }

    if rule.protocol.supports_ports()
        && (!rule.source_ports.is_empty() || !rule.destination_ports.is_empty())
    {
        args.push("-m".to_string());
        args.push("multiport".to_string());
        if !rule.source_ports.is_empty() {
            args.push("--sports".to_string());
            args.push(join_ports(&rule.source_ports));
        }
        if !rule.destination_ports.is_empty() {
            args.push("--dports".to_string());
            args.push(join_ports(&rule.destination_ports));
        }
    }

    if let Some((start, end)) = rule.schedule.as_ref().and_then(|s| s.window()) {
        args.push("-m".to_string());
        args.push("time".to_string());
        args.push("--timestart".to_string());
        args.push(start.to_string());
        args.push("--timestop".to_string());
        args.push(end.to_string());
        let days = &rule.schedule.as_ref().unwrap().days;
        if !days.is_empty() {
            args.push("--weekdays".to_string());
            args.push(days.join(","));
        }
    }

    args.push("-m".to_string());
    args.push("comment".to_string());
    args.push("--comment".to_string());
    args.push(rule_tag(&rule.rule_name));

    args.push("-j".to_string());
    args.push(rule.action.target().to_string());

    args
}

/// Port ranges use `start:end` on the host side.
fn join_ports(ports: &[String]) -> String {
    ports.iter().map(|p| p.replace('-', ":")).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::models::{RuleAction, RuleSchedule};

    fn web_rule() -> FirewallRule {
        let mut rule = FirewallRule::new("web", Protocol::Tcp, RuleAction::Allow, Direction::In);
        rule.source_ips = vec!["10.0.0.0/8".into(), "192.168.0.0/16".into()];
        rule.destination_ports = vec!["80".into(), "443".into(), "8000-8100".into()];
        rule
    }

    #[test]
    fn rule_args_join_lists() {
        let args = build_rule_args(&web_rule(), "INPUT");
        assert_eq!(
            args.join(" "),
            "-A INPUT -p tcp -s 10.0.0.0/8,192.168.0.0/16 -m multiport \
             --dports 80,443,8000:8100 -m comment --comment ncrule:web -j ACCEPT"
        );
    }

    #[test]
    fn schedule_needs_both_ends() {
        let mut rule = web_rule();
        rule.schedule = Some(RuleSchedule {
            start_time: Some("08:00".into()),
            end_time: None,
            days: vec!["Mon".into()],
        });
        assert!(!build_rule_args(&rule, "INPUT").join(" ").contains("time"));

        rule.schedule = Some(RuleSchedule {
            start_time: Some("08:00".into()),
            end_time: Some("17:00".into()),
            days: vec!["Mon".into(), "Fri".into()],
        });
        let rendered = build_rule_args(&rule, "INPUT").join(" ");
        assert!(rendered
            .contains("-m time --timestart 08:00 --timestop 17:00 --weekdays Mon,Fri"));
    }

    #[test]
    fn any_protocol_omits_proto_and_ports() {
        let mut rule = FirewallRule::new("all", Protocol::Any, RuleAction::Drop, Direction::Out);
        rule.source_ips = vec!["203.0.113.0/24".into()];
        let rendered = build_rule_args(&rule, "OUTPUT").join(" ");
        assert_eq!(rendered, "-A OUTPUT -s 203.0.113.0/24 -m comment --comment ncrule:all -j DROP");
    }

    #[tokio::test]
    async fn sync_installs_into_both_chains_for_both_direction() {
        let host = Arc::new(FakeHost::new());
        let sync = RuleSynchronizer::new(host.clone());

        let mut rule = FirewallRule::new("r1", Protocol::Tcp, RuleAction::Reject, Direction::Both);
        rule.destination_ports = vec!["22".into()];
        assert!(sync.sync(&rule).await);

        assert!(host.ran("-A INPUT -p tcp -m multiport --dports 22"));
        assert!(host.ran("-A OUTPUT -p tcp -m multiport --dports 22"));
    }

    #[tokio::test]
    async fn remove_deletes_tagged_rules_only() {
        let host = Arc::new(FakeHost::new());
        host.stdout_for(
            "-S INPUT",
            "-P INPUT ACCEPT\n\
             -A INPUT -p tcp -m multiport --dports 22 -m comment --comment \"ncrule:ssh\" -j ACCEPT\n\
             -A INPUT -p tcp -m comment --comment \"other\" -j DROP\n",
        );
        let sync = RuleSynchronizer::new(host.clone());

        assert!(sync.remove("ssh").await);
        assert!(host.ran(
            "-D INPUT -p tcp -m multiport --dports 22 -m comment --comment ncrule:ssh -j ACCEPT"
        ));
        assert!(!host.ran("-D INPUT -p tcp -m comment --comment other"));
    }

    #[tokio::test]
    async fn removing_absent_rule_succeeds() {
        let host = Arc::new(FakeHost::new());
        let sync = RuleSynchronizer::new(host.clone());
        assert!(sync.remove("ghost").await);
        // Only the listings ran.
        assert_eq!(host.recorded(), vec!["iptables -S INPUT", "iptables -S OUTPUT"]);
    }

    #[tokio::test]
    async fn disabled_rule_converges_to_absence() {
        let host = Arc::new(FakeHost::new());
        let sync = RuleSynchronizer::new(host.clone());

        let mut rule = web_rule();
        rule.enabled = false;
        assert!(sync.sync(&rule).await);
        assert!(!host.ran("-A INPUT"));
    }

    #[tokio::test]
    async fn replace_removes_old_before_installing_new() {
        let host = Arc::new(FakeHost::new());
        host.stdout_for(
            "-S INPUT",
            "-A INPUT -p tcp -m comment --comment \"ncrule:r1\" -j ACCEPT\n",
        );
        let sync = RuleSynchronizer::new(host.clone());

        let rule = FirewallRule::new("r1", Protocol::Udp, RuleAction::Allow, Direction::In);
        assert!(sync.replace("r1", &rule).await);

        let commands = host.recorded();
        let delete = commands.iter().position(|c| c.contains("-D INPUT")).unwrap();
        let add = commands.iter().position(|c| c.contains("-A INPUT -p udp")).unwrap();
        assert!(delete < add);
    }

    #[tokio::test]
    async fn hit_count_sums_chain_counters() {
        let host = Arc::new(FakeHost::new());
        host.stdout_for(
            "-L INPUT",
            "Chain INPUT (policy ACCEPT 0 packets, 0 bytes)\n\
             pkts bytes target prot opt in out source destination\n\
             42 3486 ACCEPT tcp -- * * 0.0.0.0/0 0.0.0.0/0 multiport dports 80 /* ncrule:web */\n",
        );
        host.stdout_for(
            "-L OUTPUT",
            "Chain OUTPUT (policy ACCEPT 0 packets, 0 bytes)\n\
             pkts bytes target prot opt in out source destination\n\
             8 512 ACCEPT tcp -- * * 0.0.0.0/0 0.0.0.0/0 multiport dports 80 /* ncrule:web */\n",
        );
        let sync = RuleSynchronizer::new(host);

        assert_eq!(sync.hit_count("web").await, Some(50));
        assert_eq!(sync.hit_count("absent").await, None);
    }
}
