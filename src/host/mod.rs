// Network Center - Host Actuation Boundary
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Typed boundary to the host's network stack.
//!
//! Every OS interaction the engine performs (shell commands for link,
//! routing, packet-filter, and DHCP-service management, plus the handful
//! of procfs/sysfs reads and config-file writes) goes through the
//! [`Host`] trait. This keeps critical-vs-best-effort failure a typed
//! decision of each call site and lets tests script the host instead of
//! mutating it.

mod local;

#[cfg(test)]
pub mod fake;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalHost;

/// Default timeout for a single host command invocation.
///
/// A timeout is a failure, never "still in progress".
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 8;

/// Outcome of a finished host command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, or -1 if terminated by signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Convert a non-zero exit into a typed error.
    pub fn require_success(self, command: &str) -> Result<CommandOutput, OpError> {
        if self.success() {
            Ok(self)
        } else {
            Err(OpError::NonZeroExit {
                command: command.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Failure of a single host operation.
#[derive(Debug, Clone, Error)]
pub enum OpError {
    #[error("binary not found: {program}")]
    MissingBinary { program: String },

    #[error("command timed out: {command}")]
    Timeout { command: String },

    #[error("failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("'{command}' exited with status {code}: {stderr}")]
    NonZeroExit { command: String, code: i32, stderr: String },

    #[error("i/o error at {path}: {reason}")]
    Io { path: String, reason: String },
}

impl OpError {
    /// The command or path this error is about.
    pub fn command(&self) -> &str {
        match self {
            Self::MissingBinary { program } => program,
            Self::Timeout { command }
            | Self::Spawn { command, .. }
            | Self::NonZeroExit { command, .. } => command,
            Self::Io { path, .. } => path,
        }
    }
}

/// Host actuation boundary.
///
/// `run` reports spawn-level problems (missing binary, timeout) as errors
/// and returns non-zero exits as ordinary [`CommandOutput`] values, so
/// check-style invocations (`iptables -C ...`) can treat the exit code as a
/// signal rather than a failure.
#[async_trait]
pub trait Host: Send + Sync {
    /// Run a command to completion.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, OpError>;

    /// Read a file to a string.
    async fn read_file(&self, path: &Path) -> Result<String, OpError>;

    /// Overwrite a file wholesale.
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), OpError>;

    /// List the entry names of a directory.
    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, OpError>;
}

/// Render a command line for logs and error messages.
pub fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
