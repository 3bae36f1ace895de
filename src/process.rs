//! External command invocation
//!
//! Every collaborator (hdiutil, rclone, the editor, sudo) is reached through
//! [`Runner`], so the domain logic can be exercised against scripted output.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::Error;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added to the child environment only
    pub env: Vec<(String, String)>,
    /// Capture stdout/stderr instead of inheriting the terminal
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            capture: true,
        }
    }

    /// Let the child write straight to the terminal
    pub fn interactive(mut self) -> Self {
        self.capture = false;
        self
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// Program plus arguments, for messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`]
    pub fn check(self, invocation: &Invocation) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(Error::CommandFailed {
            command: invocation.display(),
            status: self.status_text(),
            stderr: self.stderr.clone(),
        }
        .into())
    }
}

pub trait Runner {
    /// Run to completion. A spawn failure is an error; a non-zero exit is not.
    fn run(&self, invocation: &Invocation) -> Result<Output>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        let env_keys: Vec<&str> = invocation.env.iter().map(|(k, _)| k.as_str()).collect();
        debug!(command = %invocation.display(), env = ?env_keys, "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.envs(invocation.env.iter().map(|(k, v)| (k, v)));

        if invocation.capture {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .with_context(|| format!("Failed to run: {}", invocation.program))?;
            Ok(Output {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd
                .status()
                .with_context(|| format!("Failed to run: {}", invocation.program))?;
            Ok(Output {
                success: status.success(),
                code: status.code(),
                ..Output::default()
            })
        }
    }
}

/// Fail with an install hint unless `name` is on PATH
pub fn require_command(name: &str, hint: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| {
        Error::MissingDependency {
            command: name.to_string(),
            hint: hint.to_string(),
        }
        .into()
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("hdiutil", ["detach", "-force", "/dev/disk4"]);
        assert_eq!(inv.display(), "hdiutil detach -force /dev/disk4");
        assert!(inv.capture);
        assert!(!inv.clone().interactive().capture);
    }

    #[test]
    fn test_check_maps_failure() {
        let inv = Invocation::new("rclone", ["purge", "r:b/x"]);
        let out = Output {
            success: false,
            code: Some(3),
            stdout: String::new(),
            stderr: "directory not found".into(),
        };
        let err = out.check(&inv).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("rclone purge r:b/x"));
        assert!(msg.contains("exit status 3"));
        assert!(msg.contains("directory not found"));
    }

    #[test]
    fn test_require_command_missing() {
        let err = require_command("projdock-definitely-not-installed", "Install it.")
            .unwrap_err();
        assert!(err.to_string().contains("Install it."));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_env_overlay_is_child_only() {
        let inv = Invocation::new("sh", ["-c", "printf %s \"$PROJDOCK_TEST_OVERLAY\""])
            .with_env(vec![("PROJDOCK_TEST_OVERLAY".into(), "secret".into())]);
        let out = SystemRunner.run(&inv).unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "secret");
        assert!(std::env::var_os("PROJDOCK_TEST_OVERLAY").is_none());
    }
}
