//! Runner module - Process execution layer
//!
//! Every adapter spawns its programs through the `Runner` trait, so stdin
//! injection, output capture and timeout handling live in exactly one place.
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about languages or toolchains

pub mod process;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command specification for execution
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        Self {
            program,
            args: iter.cloned().collect(),
            ..Default::default()
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.iter().cloned());
        v
    }
}

/// Limits for one execution
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Wall-clock time limit in milliseconds
    pub time_ms: u64,
}

impl RunLimits {
    pub fn new(time_ms: u64) -> Self {
        Self { time_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self { time_ms: 5_000 }
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
    /// Killed after exceeding the wall-clock limit
    TimedOut,
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time from spawn to exit (or kill)
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Exit code from status (-1 if not applicable)
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Exited(code) => code,
            _ => -1,
        }
    }
}

/// Runner trait for executing programs.
///
/// `Err` means the process could not be run at all (spawn failure, broken
/// plumbing). Anything the program itself does is reported in `RunOutcome`.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, cmd: &CommandSpec, stdin: &[u8], limits: &RunLimits)
        -> Result<RunOutcome>;
}

pub use process::ProcessRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_vec() {
        let cmd = CommandSpec::from_vec(&["g++".to_string(), "-o".to_string(), "a".to_string()]);
        assert_eq!(cmd.program, "g++");
        assert_eq!(cmd.args, vec!["-o", "a"]);
        assert_eq!(cmd.to_vec(), vec!["g++", "-o", "a"]);
    }

    #[test]
    fn test_command_spec_from_empty_vec() {
        let cmd = CommandSpec::from_vec(&[]);
        assert!(cmd.program.is_empty());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_run_status() {
        assert!(RunStatus::Exited(0).is_success());
        assert!(!RunStatus::Exited(1).is_success());
        assert!(!RunStatus::TimedOut.is_success());
    }
}
