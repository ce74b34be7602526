// Network Center - Firewall Module
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Declarative firewall rule synchronization.

mod sync;

pub use sync::RuleSynchronizer;

/// Comment prefix keying host rules to declarative rule names.
pub const RULE_TAG_PREFIX: &str = "ncrule:";

/// Chains a rule direction maps onto.
pub mod chains {
    pub const INPUT: &str = "INPUT";
    pub const OUTPUT: &str = "OUTPUT";
    pub const ALL: &[&str] = &[INPUT, OUTPUT];
}

/// The comment tag for a rule name.
pub fn rule_tag(rule_name: &str) -> String {
    format!("{RULE_TAG_PREFIX}{rule_name}")
}
