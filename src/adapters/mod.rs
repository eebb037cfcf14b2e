//! Language adapters - per-language compile and run strategies
//!
//! An adapter turns a `Submission` into a `PreparedProgram` once, then runs
//! that program once per test case. Three families cover every language:
//! - `interpreted`: stage the source, run it through an interpreter
//! - `native`: compile to an executable in a private directory
//! - `java`: stage under the public class name, compile to bytecode
//!
//! The prepared program owns its temporary directory, so the directory is
//! removed on every exit path when the program is dropped.

pub mod interpreted;
pub mod java;
pub mod native;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::debug;

use crate::compiler::clean_diagnostics;
use crate::core::{Language, LanguageFamily};
use crate::languages::Toolchains;
use crate::runner::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};
use crate::submission::Submission;

pub use interpreted::InterpretedAdapter;
pub use java::JavaAdapter;
pub use native::NativeAdapter;

/// Prefix of every per-submission temporary directory
const WORKSPACE_PREFIX: &str = "codedojo_";

/// Tagged result of running one test case
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Submission did not build; no process was spawned for this test
    CompileError { diagnostic: String },
    /// The program could not be started at all
    InfrastructureError { diagnostic: String },
    /// Non-zero exit, killed by a signal, or killed on timeout
    RuntimeError {
        diagnostic: String,
        exit_status: Option<i32>,
        timed_out: bool,
        stdout: String,
        elapsed: Duration,
    },
    Success { stdout: String, elapsed: Duration },
}

impl ExecutionOutcome {
    pub fn from_run(outcome: RunOutcome, limits: &RunLimits) -> Self {
        let stderr = clean_diagnostics(&outcome.stderr);
        let stderr = stderr.trim();

        match outcome.status {
            RunStatus::Exited(0) => ExecutionOutcome::Success {
                stdout: outcome.stdout,
                elapsed: outcome.elapsed,
            },
            RunStatus::Exited(code) => ExecutionOutcome::RuntimeError {
                diagnostic: if stderr.is_empty() {
                    format!("exit code {}", code)
                } else {
                    stderr.to_string()
                },
                exit_status: Some(code),
                timed_out: false,
                stdout: outcome.stdout,
                elapsed: outcome.elapsed,
            },
            RunStatus::Signaled(sig) => ExecutionOutcome::RuntimeError {
                diagnostic: if stderr.is_empty() {
                    format!("killed by signal {}", sig)
                } else {
                    format!("killed by signal {}\n{}", sig, stderr)
                },
                exit_status: None,
                timed_out: false,
                stdout: outcome.stdout,
                elapsed: outcome.elapsed,
            },
            RunStatus::TimedOut => ExecutionOutcome::RuntimeError {
                diagnostic: format!("timeout after {} ms", limits.time_ms),
                exit_status: None,
                timed_out: true,
                stdout: outcome.stdout,
                elapsed: outcome.elapsed,
            },
        }
    }

    /// Time spent executing; zero when nothing ran
    pub fn elapsed(&self) -> Duration {
        match self {
            ExecutionOutcome::RuntimeError { elapsed, .. }
            | ExecutionOutcome::Success { elapsed, .. } => *elapsed,
            _ => Duration::ZERO,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::CompileError { diagnostic }
            | ExecutionOutcome::InfrastructureError { diagnostic }
            | ExecutionOutcome::RuntimeError { diagnostic, .. } => Some(diagnostic),
            ExecutionOutcome::Success { .. } => None,
        }
    }

    /// Captured standard output, if the program ran
    pub fn stdout(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::RuntimeError { stdout, .. }
            | ExecutionOutcome::Success { stdout, .. } => Some(stdout),
            _ => None,
        }
    }
}

/// Why a submission could not be prepared
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrepareFailure {
    #[error("compilation failed: {0}")]
    Compile(String),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl PrepareFailure {
    pub fn diagnostic(&self) -> &str {
        match self {
            PrepareFailure::Compile(msg) | PrepareFailure::Infrastructure(msg) => msg,
        }
    }

    /// The outcome every test case of the submission receives
    pub fn to_outcome(&self) -> ExecutionOutcome {
        match self {
            PrepareFailure::Compile(msg) => ExecutionOutcome::CompileError {
                diagnostic: msg.clone(),
            },
            PrepareFailure::Infrastructure(msg) => ExecutionOutcome::InfrastructureError {
                diagnostic: msg.clone(),
            },
        }
    }
}

/// A submission ready to run: its private directory plus the run command
#[derive(Debug)]
pub struct PreparedProgram {
    workspace: TempDir,
    command: CommandSpec,
}

impl PreparedProgram {
    pub fn new(workspace: TempDir, command: CommandSpec) -> Self {
        Self { workspace, command }
    }

    pub fn dir(&self) -> &Path {
        self.workspace.path()
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Remove the workspace, reporting failures that `Drop` would swallow
    pub fn cleanup(self) -> std::io::Result<()> {
        self.workspace.close()
    }
}

/// Contract every language adapter fulfils
#[async_trait]
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    /// Stage and, if needed, compile. Called once per submission.
    async fn prepare(&self, submission: &Submission) -> Result<PreparedProgram, PrepareFailure>;

    /// Run the prepared program on one input. Called once per test case.
    async fn execute(&self, program: &PreparedProgram, input: &[u8]) -> ExecutionOutcome;
}

/// Settings shared by all adapters of one deployment
#[derive(Clone)]
pub struct AdapterContext {
    pub runner: Arc<dyn Runner>,
    pub run_limits: RunLimits,
    pub compile_limits: RunLimits,
    /// Parent directory for workspaces (system temp dir if `None`)
    pub temp_root: Option<PathBuf>,
}

impl AdapterContext {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self {
            runner,
            run_limits: RunLimits::default(),
            compile_limits: RunLimits::new(30_000),
            temp_root: None,
        }
    }

    pub fn with_run_limits(mut self, limits: RunLimits) -> Self {
        self.run_limits = limits;
        self
    }

    pub fn with_compile_limits(mut self, limits: RunLimits) -> Self {
        self.compile_limits = limits;
        self
    }

    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Create a private workspace and write `source` into it as `file_name`
    pub(crate) async fn stage(
        &self,
        file_name: &str,
        source: &str,
    ) -> Result<(TempDir, PathBuf), PrepareFailure> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let workspace = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| PrepareFailure::Infrastructure(format!("Failed to create workspace: {}", e)))?;

        let source_path = workspace.path().join(file_name);
        tokio::fs::write(&source_path, source).await.map_err(|e| {
            PrepareFailure::Infrastructure(format!("Failed to stage {}: {}", file_name, e))
        })?;

        debug!("Staged {} in {:?}", file_name, workspace.path());
        Ok((workspace, source_path))
    }

    /// Run a prepared program under the run limits
    pub(crate) async fn execute(&self, program: &PreparedProgram, input: &[u8]) -> ExecutionOutcome {
        match self.runner.run(program.command(), input, &self.run_limits).await {
            Ok(outcome) => ExecutionOutcome::from_run(outcome, &self.run_limits),
            Err(e) => ExecutionOutcome::InfrastructureError {
                diagnostic: format!("{:#}", e),
            },
        }
    }
}

/// Adapters keyed by language, selected once per submission
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Language, Arc<dyn LanguageAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One adapter per configured toolchain
    pub fn from_toolchains(toolchains: &Toolchains, ctx: &AdapterContext) -> Self {
        let mut registry = Self::new();
        for language in toolchains.languages() {
            let Some(toolchain) = toolchains.get(language).cloned() else {
                continue;
            };
            let adapter: Arc<dyn LanguageAdapter> = match language.family() {
                Some(LanguageFamily::Interpreted) => {
                    Arc::new(InterpretedAdapter::new(language, toolchain, ctx.clone()))
                }
                Some(LanguageFamily::Native) => {
                    Arc::new(NativeAdapter::new(language, toolchain, ctx.clone()))
                }
                Some(LanguageFamily::Bytecode) => Arc::new(JavaAdapter::new(toolchain, ctx.clone())),
                None => continue,
            };
            registry.register(adapter);
        }
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn LanguageAdapter>) {
        self.adapters.insert(adapter.language(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn LanguageAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageAdapter>> {
        self.adapters.get(&language).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessRunner;

    #[test]
    fn test_from_run_classification() {
        let limits = RunLimits::new(1500);
        let run = |status, stderr: &str| RunOutcome {
            status,
            stdout: "partial".into(),
            stderr: stderr.into(),
            elapsed: Duration::from_millis(7),
        };

        let success = ExecutionOutcome::from_run(run(RunStatus::Exited(0), "noise"), &limits);
        assert_eq!(
            success,
            ExecutionOutcome::Success {
                stdout: "partial".into(),
                elapsed: Duration::from_millis(7)
            }
        );

        let failed = ExecutionOutcome::from_run(run(RunStatus::Exited(2), ""), &limits);
        assert_eq!(failed.diagnostic(), Some("exit code 2"));

        let traced = ExecutionOutcome::from_run(run(RunStatus::Exited(1), "Traceback\n"), &limits);
        assert_eq!(traced.diagnostic(), Some("Traceback"));

        let timeout = ExecutionOutcome::from_run(run(RunStatus::TimedOut, ""), &limits);
        match timeout {
            ExecutionOutcome::RuntimeError {
                timed_out,
                diagnostic,
                ..
            } => {
                assert!(timed_out);
                assert_eq!(diagnostic, "timeout after 1500 ms");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_prepare_failure_outcome_has_no_elapsed_time() {
        let outcome = PrepareFailure::Compile("main.cpp:1: error".into()).to_outcome();
        assert_eq!(outcome.elapsed(), Duration::ZERO);
        assert_eq!(outcome.diagnostic(), Some("main.cpp:1: error"));
        assert!(outcome.stdout().is_none());
    }

    #[test]
    fn test_registry_from_builtin_toolchains() {
        let toolchains = Toolchains::builtin().unwrap();
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new()));
        let registry = AdapterRegistry::from_toolchains(&toolchains, &ctx);

        for lang in Language::SUPPORTED {
            let adapter = registry.get(lang).expect("adapter registered");
            assert_eq!(adapter.language(), lang);
        }
        assert!(registry.get(Language::Unknown).is_none());
    }
}
