//! Natively compiled languages (C, C++, Rust, Go)
//!
//! The source is compiled once into `program` inside the submission's
//! private directory; every test case runs that executable.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{AdapterContext, ExecutionOutcome, LanguageAdapter, PrepareFailure, PreparedProgram};
use crate::compiler::compile;
use crate::core::Language;
use crate::languages::{Placeholders, ToolchainConfig};
use crate::submission::Submission;

const EXECUTABLE_NAME: &str = "program";

pub struct NativeAdapter {
    language: Language,
    toolchain: ToolchainConfig,
    ctx: AdapterContext,
}

impl NativeAdapter {
    pub fn new(language: Language, toolchain: ToolchainConfig, ctx: AdapterContext) -> Self {
        Self {
            language,
            toolchain,
            ctx,
        }
    }
}

#[async_trait]
impl LanguageAdapter for NativeAdapter {
    fn language(&self) -> Language {
        self.language
    }

    async fn prepare(&self, submission: &Submission) -> Result<PreparedProgram, PrepareFailure> {
        let file_name = submission.staged_file_name();
        let (workspace, source_path) = self.ctx.stage(&file_name, submission.source()).await?;
        let exe_path = workspace.path().join(EXECUTABLE_NAME);

        let vars = Placeholders {
            source: source_path.to_string_lossy().into_owned(),
            exe: exe_path.to_string_lossy().into_owned(),
            dir: workspace.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        let compile_cmd = self.toolchain.compile_spec(&vars).ok_or_else(|| {
            PrepareFailure::Infrastructure(format!("No compile command for {}", self.language))
        })?;

        let result = compile(
            self.ctx.runner.as_ref(),
            &compile_cmd,
            &self.ctx.compile_limits,
            self.toolchain.strict_diagnostics,
        )
        .await
        .map_err(|e| PrepareFailure::Infrastructure(format!("{:#}", e)))?;

        if !result.success {
            info!(
                "Compilation failed for submission {} ({})",
                submission.id(),
                self.language
            );
            return Err(PrepareFailure::Compile(
                result.message.unwrap_or_default().trim_end().to_string(),
            ));
        }

        if !exe_path.exists() {
            return Err(PrepareFailure::Compile(format!(
                "Compiler produced no executable for {}",
                submission.display_name()
            )));
        }

        debug!("Compiled submission {} to {:?}", submission.id(), exe_path);
        Ok(PreparedProgram::new(workspace, self.toolchain.run_spec(&vars)))
    }

    async fn execute(&self, program: &PreparedProgram, input: &[u8]) -> ExecutionOutcome {
        self.ctx.execute(program, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessRunner;
    use crate::submission::{SubmissionId, SubmissionMeta};
    use std::sync::Arc;

    /// "Compiles" a shell script by copying it into place as the executable
    fn copy_toolchain() -> ToolchainConfig {
        ToolchainConfig::compiled(
            &["sh", "-c", "cp {source} {exe} && chmod +x {exe}"],
            &["{exe}"],
        )
    }

    fn adapter(temp_root: &std::path::Path, toolchain: ToolchainConfig) -> NativeAdapter {
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new())).with_temp_root(temp_root);
        NativeAdapter::new(Language::Cpp, toolchain, ctx)
    }

    fn submission(source: &str) -> Submission {
        Submission::new(SubmissionId(7), source, "postes.cpp", SubmissionMeta::default())
    }

    #[tokio::test]
    async fn test_compile_once_run_many() {
        let root = tempfile::tempdir().unwrap();
        let adapter = adapter(root.path(), copy_toolchain());
        let program = adapter
            .prepare(&submission("#!/bin/sh\nread n\necho $((n * n))\n"))
            .await
            .unwrap();

        assert!(program.dir().join(EXECUTABLE_NAME).exists());
        for (input, expected) in [("2\n", "4\n"), ("9\n", "81\n")] {
            let outcome = adapter.execute(&program, input.as_bytes()).await;
            assert_eq!(outcome.stdout(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_compile_error_cleans_workspace() {
        let root = tempfile::tempdir().unwrap();
        let toolchain = ToolchainConfig::compiled(
            &["sh", "-c", "echo 'postes.cpp:3:1: error: expected ;' >&2; exit 1"],
            &["{exe}"],
        );
        let adapter = adapter(root.path(), toolchain);

        let err = adapter.prepare(&submission("int main(")).await.unwrap_err();
        assert_eq!(
            err,
            PrepareFailure::Compile("postes.cpp:3:1: error: expected ;".into())
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_warnings_fail_strict_build() {
        let root = tempfile::tempdir().unwrap();
        let toolchain = ToolchainConfig::compiled(
            &["sh", "-c", "echo 'warning: unused variable' >&2; cp {source} {exe}"],
            &["{exe}"],
        );

        let strict = adapter(root.path(), toolchain.clone());
        assert!(matches!(
            strict.prepare(&submission("x")).await,
            Err(PrepareFailure::Compile(_))
        ));

        let lenient = adapter(root.path(), toolchain.with_strict_diagnostics(false));
        assert!(lenient.prepare(&submission("x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_executable_is_compile_error() {
        let root = tempfile::tempdir().unwrap();
        let adapter = adapter(
            root.path(),
            ToolchainConfig::compiled(&["true"], &["{exe}"]),
        );

        let err = adapter.prepare(&submission("")).await.unwrap_err();
        assert!(matches!(err, PrepareFailure::Compile(_)));
        assert!(err.diagnostic().contains("postes.cpp"));
    }

    #[tokio::test]
    async fn test_missing_compiler_is_infrastructure_error() {
        let root = tempfile::tempdir().unwrap();
        let adapter = adapter(
            root.path(),
            ToolchainConfig::compiled(&["/nonexistent/codedojo-g++", "{source}"], &["{exe}"]),
        );

        let err = adapter.prepare(&submission("")).await.unwrap_err();
        assert!(matches!(err, PrepareFailure::Infrastructure(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
