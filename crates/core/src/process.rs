//! Process execution utilities
//!
//! Provides a unified interface for running external commands with:
//! - Output capture
//! - Exit status inspection
//! - PATH lookups

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::process::{Command, Output, Stdio};

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Run a command and capture output
///
/// Both the program and its arguments are `OsStr`-generic so configured
/// launchers and path arguments pass through without lossy conversion.
pub fn run_command(
    program: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<CommandResult> {
    let program = program.as_ref();
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            Error::process(format!(
                "Failed to execute {}: {}",
                program.to_string_lossy(),
                e
            ))
        })?;

    Ok(CommandResult::from_output(output))
}

/// Check if a command exists in PATH
pub fn command_exists(program: impl AsRef<OsStr>) -> bool {
    which::which(program).is_ok()
}

/// Get the path to a command
pub fn which_command(program: impl AsRef<OsStr>) -> Option<std::path::PathBuf> {
    which::which(program).ok()
}
