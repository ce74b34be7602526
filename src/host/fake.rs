// Network Center - Fake Host
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Scriptable [`Host`] for tests.
//!
//! Records every command, serves canned files/directories, and lets a test
//! script failures or exit codes by command substring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{render_command, CommandOutput, Host, OpError};

#[derive(Default)]
pub struct FakeHost {
    commands: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, OpError)>>,
    exit_codes: Mutex<Vec<(String, i32)>>,
    stdouts: Mutex<Vec<(String, String)>>,
    files: Mutex<HashMap<PathBuf, String>>,
    dirs: Mutex<HashMap<PathBuf, Vec<String>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a spawn-level failure for commands containing `pattern`.
    pub fn fail_matching(&self, pattern: &str, err: OpError) {
        self.failures.lock().unwrap().push((pattern.to_string(), err));
    }

    /// Script a non-zero exit for commands containing `pattern`.
    pub fn exit_code(&self, pattern: &str, code: i32) {
        self.exit_codes.lock().unwrap().push((pattern.to_string(), code));
    }

    /// Script stdout for commands containing `pattern`.
    pub fn stdout_for(&self, pattern: &str, stdout: &str) {
        self.stdouts.lock().unwrap().push((pattern.to_string(), stdout.to_string()));
    }

    pub fn put_file(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files.lock().unwrap().insert(path.into(), contents.to_string());
    }

    pub fn put_dir(&self, path: impl Into<PathBuf>, entries: &[&str]) {
        self.dirs
            .lock()
            .unwrap()
            .insert(path.into(), entries.iter().map(|s| s.to_string()).collect());
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// All commands run so far, rendered as command lines.
    pub fn recorded(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn clear_recorded(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Whether any recorded command contains `pattern`.
    pub fn ran(&self, pattern: &str) -> bool {
        self.commands.lock().unwrap().iter().any(|c| c.contains(pattern))
    }

    /// Build a sysfs-style interface layout in the fake filesystem.
    pub fn add_interface(&self, name: &str, mac: &str, operstate: &str) {
        let base = PathBuf::from("/sys/class/net").join(name);
        self.put_file(base.join("address"), &format!("{mac}\n"));
        self.put_file(base.join("operstate"), &format!("{operstate}\n"));

        let mut dirs = self.dirs.lock().unwrap();
        dirs.entry(PathBuf::from("/sys/class/net")).or_default().push(name.to_string());
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, OpError> {
        let command = render_command(program, args);
        self.commands.lock().unwrap().push(command.clone());

        if let Some((_, err)) =
            self.failures.lock().unwrap().iter().find(|(p, _)| command.contains(p.as_str()))
        {
            return Err(err.clone());
        }

        let code = self
            .exit_codes
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| command.contains(p.as_str()))
            .map(|(_, c)| *c)
            .unwrap_or(0);

        let stdout = self
            .stdouts
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| command.contains(p.as_str()))
            .map(|(_, s)| s.clone())
            .unwrap_or_default();

        Ok(CommandOutput { code, stdout, stderr: String::new() })
    }

    async fn read_file(&self, path: &Path) -> Result<String, OpError> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| OpError::Io {
            path: path.display().to_string(),
            reason: "no such file".to_string(),
        })
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), OpError> {
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>, OpError> {
        self.dirs.lock().unwrap().get(path).cloned().ok_or_else(|| OpError::Io {
            path: path.display().to_string(),
            reason: "no such directory".to_string(),
        })
    }
}
