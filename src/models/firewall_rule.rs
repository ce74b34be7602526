// Network Center - Firewall Rule Model
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Declarative firewall rule model.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Protocol a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Any,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::Any => "any",
        }
    }

    /// Whether port matches are meaningful for this protocol.
    pub fn supports_ports(&self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

/// What the host does with a matching packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleAction {
    Allow,
    Deny,
    Drop,
    Reject,
}

impl RuleAction {
    /// The packet-filter target this action maps to.
    pub fn target(&self) -> &'static str {
        match self {
            Self::Allow => "ACCEPT",
            // DENY is a silent discard, same as DROP.
            Self::Deny | Self::Drop => "DROP",
            Self::Reject => "REJECT",
        }
    }
}

/// Traffic direction a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
    Both,
}

/// Optional time window for a rule.
///
/// Emitted to the host only when both start and end are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSchedule {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub days: Vec<String>,
}

impl RuleSchedule {
    /// Start/end pair when both are set.
    pub fn window(&self) -> Option<(&str, &str)> {
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }
}

/// A declarative firewall rule, keyed by `rule_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub rule_name: String,
    #[serde(default)]
    pub source_ips: Vec<String>,
    #[serde(default)]
    pub destination_ips: Vec<String>,
    #[serde(default)]
    pub source_ports: Vec<String>,
    #[serde(default)]
    pub destination_ports: Vec<String>,
    pub protocol: Protocol,
    pub action: RuleAction,
    pub direction: Direction,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: u16,
    #[serde(default)]
    pub schedule: Option<RuleSchedule>,

    // Observational fields, refreshed from the host.
    #[serde(default)]
    pub hit_count: u64,
    #[serde(default)]
    pub last_hit: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> u16 {
    500
}

impl FirewallRule {
    pub fn new(rule_name: &str, protocol: Protocol, action: RuleAction, direction: Direction) -> Self {
        Self {
            rule_name: rule_name.to_string(),
            source_ips: Vec::new(),
            destination_ips: Vec::new(),
            source_ports: Vec::new(),
            destination_ports: Vec::new(),
            protocol,
            action,
            direction,
            enabled: true,
            priority: default_priority(),
            schedule: None,
            hit_count: 0,
            last_hit: None,
        }
    }

    /// Field-level validation errors, empty when the rule is acceptable.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.rule_name.trim().is_empty() {
            errors.push("rule name must not be empty".to_string());
        } else if self.rule_name.chars().any(|c| c.is_whitespace() || c == '"') {
            errors.push("rule name must not contain whitespace or quotes".to_string());
        }

        for cidr in self.source_ips.iter().chain(self.destination_ips.iter()) {
            if let Err(e) = validate_cidr(cidr) {
                errors.push(e);
            }
        }

        let has_ports = !self.source_ports.is_empty() || !self.destination_ports.is_empty();
        if has_ports && !self.protocol.supports_ports() {
            errors.push(format!(
                "port matches require TCP or UDP, not {}",
                self.protocol.as_str().to_uppercase()
            ));
        }
        for port in self.source_ports.iter().chain(self.destination_ports.iter()) {
            if let Err(e) = validate_port_spec(port) {
                errors.push(e);
            }
        }

        if !(1..=1000).contains(&self.priority) {
            errors.push(format!("priority {} outside 1-1000", self.priority));
        }

        errors
    }
}

/// Validate one port spec: a single port or an ascending `start-end` range,
/// each within 1-65535.
pub fn validate_port_spec(spec: &str) -> Result<(), String> {
    let parse = |s: &str| -> Result<u16, String> {
        let port: u32 =
            s.trim().parse().map_err(|_| format!("invalid port: {spec}"))?;
        if (1..=65535).contains(&port) {
            Ok(port as u16)
        } else {
            Err(format!("port {port} outside 1-65535"))
        }
    };

    match spec.split_once('-') {
        None => parse(spec).map(|_| ()),
        Some((start, end)) => {
            let start = parse(start)?;
            let end = parse(end)?;
            if start > end {
                return Err(format!("reversed port range: {spec}"));
            }
            Ok(())
        }
    }
}

/// Validate an address or CIDR block.
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let (addr, prefix) = match cidr.split_once('/') {
        None => (cidr, None),
        Some((addr, prefix)) => (addr, Some(prefix)),
    };

    if addr.parse::<Ipv4Addr>().is_err() {
        return Err(format!("invalid address: {cidr}"));
    }

    if let Some(prefix) = prefix {
        match prefix.parse::<u8>() {
            Ok(p) if p <= 32 => {}
            _ => return Err(format!("invalid prefix length: {cidr}")),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_specs() {
        assert!(validate_port_spec("80").is_ok());
        assert!(validate_port_spec("80-443").is_ok());
        assert!(validate_port_spec("443-80").is_err());
        assert!(validate_port_spec("70000").is_err());
        assert!(validate_port_spec("0").is_err());
        assert!(validate_port_spec("abc").is_err());
    }

    #[test]
    fn cidr_validation() {
        assert!(validate_cidr("10.0.0.0/8").is_ok());
        assert!(validate_cidr("192.168.1.5").is_ok());
        assert!(validate_cidr("10.0.0.0/33").is_err());
        assert!(validate_cidr("not-an-ip/8").is_err());
    }

    #[test]
    fn icmp_rule_with_ports_is_rejected() {
        let mut rule = FirewallRule::new("r1", Protocol::Icmp, RuleAction::Allow, Direction::In);
        rule.destination_ports.push("80".into());
        let errors = rule.validation_errors();
        assert!(errors.iter().any(|e| e.contains("TCP or UDP")));
    }

    #[test]
    fn rule_name_constraints() {
        let rule = FirewallRule::new("has space", Protocol::Tcp, RuleAction::Allow, Direction::In);
        assert!(!rule.validation_errors().is_empty());

        let rule = FirewallRule::new("ok-name_1", Protocol::Tcp, RuleAction::Allow, Direction::In);
        assert!(rule.validation_errors().is_empty());
    }

    #[test]
    fn priority_bounds() {
        let mut rule = FirewallRule::new("r1", Protocol::Tcp, RuleAction::Allow, Direction::In);
        rule.priority = 0;
        assert!(!rule.validation_errors().is_empty());
        rule.priority = 1001;
        assert!(!rule.validation_errors().is_empty());
        rule.priority = 1000;
        assert!(rule.validation_errors().is_empty());
    }

    #[test]
    fn schedule_window_requires_both_ends() {
        let schedule = RuleSchedule {
            start_time: Some("08:00".into()),
            end_time: None,
            days: vec!["Mon".into()],
        };
        assert!(schedule.window().is_none());

        let schedule = RuleSchedule {
            start_time: Some("08:00".into()),
            end_time: Some("17:00".into()),
            days: Vec::new(),
        };
        assert_eq!(schedule.window(), Some(("08:00", "17:00")));
    }

    #[test]
    fn deny_and_drop_share_a_target() {
        assert_eq!(RuleAction::Deny.target(), "DROP");
        assert_eq!(RuleAction::Drop.target(), "DROP");
        assert_eq!(RuleAction::Allow.target(), "ACCEPT");
        assert_eq!(RuleAction::Reject.target(), "REJECT");
    }
}
