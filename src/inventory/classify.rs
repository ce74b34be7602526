// Network Center - Interface Classification
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Name-prefix interface classification.
//!
//! Platform naming schemes differ, so classification is pluggable: swap the
//! classifier without touching orchestration logic.

use crate::models::InterfaceType;

/// Classifies an interface name into a type.
pub trait InterfaceClassifier: Send + Sync {
    fn classify(&self, name: &str) -> InterfaceType;
}

/// Default classifier using Linux kernel / systemd-udev naming prefixes.
pub struct PrefixClassifier;

const ETHERNET_PREFIXES: &[&str] = &["eth", "enp", "eno", "ens", "em"];
const WIRELESS_PREFIXES: &[&str] = &["wlan", "wlp", "wlx", "ath"];

impl InterfaceClassifier for PrefixClassifier {
    fn classify(&self, name: &str) -> InterfaceType {
        if ETHERNET_PREFIXES.iter().any(|p| name.starts_with(p)) {
            InterfaceType::Ethernet
        } else if WIRELESS_PREFIXES.iter().any(|p| name.starts_with(p)) {
            InterfaceType::Wireless
        } else {
            InterfaceType::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_names() {
        let c = PrefixClassifier;
        assert_eq!(c.classify("eth0"), InterfaceType::Ethernet);
        assert_eq!(c.classify("enp3s0"), InterfaceType::Ethernet);
        assert_eq!(c.classify("eno1"), InterfaceType::Ethernet);
        assert_eq!(c.classify("wlan0"), InterfaceType::Wireless);
        assert_eq!(c.classify("wlp2s0"), InterfaceType::Wireless);
        assert_eq!(c.classify("wlx00c0ca"), InterfaceType::Wireless);
        assert_eq!(c.classify("ppp0"), InterfaceType::Other);
    }
}
