// Network Center - Engine Crate
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Network Center: a headless network-state orchestration engine.
//!
//! Reconciles declarative network, NAT/internet-sharing, and firewall
//! configuration with the live state of a Linux host's network stack. The
//! engine validates desired-state documents against the current interface
//! inventory, persists them, and converges live state on background tasks
//! through the host's own link-management, packet-filter, routing, and
//! DHCP-service primitives.
//!
//! The HTTP/API layer, authentication, and reporting live outside this
//! crate; they submit documents to [`engine::NetworkEngine`] and consume
//! its [`models::ServiceResult`] envelopes and status queries.

pub mod apply;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod firewall;
pub mod host;
pub mod inventory;
pub mod models;
pub mod nat;
pub mod status;
pub mod store;
pub mod validate;

pub use config::EngineConfig;
pub use engine::NetworkEngine;
pub use error::{EngineError, Result};

/// Initialize process-wide logging for engine hosts.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
