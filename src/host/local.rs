// Network Center - Local Host
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! [`Host`] implementation backed by the local machine.

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time;

use super::{render_command, CommandOutput, Host, OpError, DEFAULT_COMMAND_TIMEOUT_SECS};

/// Runs commands and file operations against the local system.
pub struct LocalHost {
    timeout: Duration,
}

impl LocalHost {
    pub fn new() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS) }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, OpError> {
        let command = render_command(program, args);

        let output = match time::timeout(self.timeout, Command::new(program).args(args).output())
            .await
        {
            Err(_) => return Err(OpError::Timeout { command }),
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(OpError::MissingBinary { program: program.to_string() })
            }
            Ok(Err(e)) => return Err(OpError::Spawn { command, reason: e.to_string() }),
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<String, OpError> {
        tokio::fs::read_to_string(path).await.map_err(|e| OpError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), OpError> {
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        tokio::fs::write(path, contents).await.map_err(|e| OpError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, OpError> {
        let mut reader = tokio::fs::read_dir(path).await.map_err(|e| OpError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| OpError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_typed() {
        let host = LocalHost::new();
        let err = host.run("definitely-not-a-real-binary-xyz", &[]).await.unwrap_err();
        assert!(matches!(err, OpError::MissingBinary { .. }));
    }

    #[tokio::test]
    async fn read_missing_file_is_io_error() {
        let host = LocalHost::new();
        let err = host.read_file(Path::new("/nonexistent/path/xyz")).await.unwrap_err();
        assert!(matches!(err, OpError::Io { .. }));
    }
}
