//! Interpreted languages: stage the source, run it through the interpreter

use async_trait::async_trait;
use tracing::debug;

use super::{AdapterContext, ExecutionOutcome, LanguageAdapter, PrepareFailure, PreparedProgram};
use crate::core::Language;
use crate::languages::{Placeholders, ToolchainConfig};
use crate::submission::Submission;

pub struct InterpretedAdapter {
    language: Language,
    toolchain: ToolchainConfig,
    ctx: AdapterContext,
}

impl InterpretedAdapter {
    pub fn new(language: Language, toolchain: ToolchainConfig, ctx: AdapterContext) -> Self {
        Self {
            language,
            toolchain,
            ctx,
        }
    }
}

#[async_trait]
impl LanguageAdapter for InterpretedAdapter {
    fn language(&self) -> Language {
        self.language
    }

    async fn prepare(&self, submission: &Submission) -> Result<PreparedProgram, PrepareFailure> {
        let file_name = submission.staged_file_name();
        let (workspace, source_path) = self.ctx.stage(&file_name, submission.source()).await?;

        let vars = Placeholders {
            source: source_path.to_string_lossy().into_owned(),
            dir: workspace.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let run = self.toolchain.run_spec(&vars);
        debug!("Prepared {} submission {}", self.language, submission.id());

        Ok(PreparedProgram::new(workspace, run))
    }

    async fn execute(&self, program: &PreparedProgram, input: &[u8]) -> ExecutionOutcome {
        self.ctx.execute(program, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{ProcessRunner, RunLimits};
    use crate::submission::{SubmissionId, SubmissionMeta};
    use std::sync::Arc;

    fn adapter(temp_root: &std::path::Path) -> InterpretedAdapter {
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new()))
            .with_run_limits(RunLimits::new(500))
            .with_temp_root(temp_root);
        InterpretedAdapter::new(
            Language::Python,
            ToolchainConfig::interpreted(&["sh", "{source}"]),
            ctx,
        )
    }

    fn submission(source: &str) -> Submission {
        Submission::new(SubmissionId(1), source, "squared.py", SubmissionMeta::default())
    }

    #[tokio::test]
    async fn test_runs_staged_source() {
        let root = tempfile::tempdir().unwrap();
        let adapter = adapter(root.path());
        let program = adapter
            .prepare(&submission("read n; echo $((n * n))"))
            .await
            .unwrap();

        assert!(program.dir().join("squared.py").exists());
        assert!(program
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("codedojo_"));

        let outcome = adapter.execute(&program, b"5\n").await;
        assert_eq!(outcome.stdout(), Some("25\n"));
        assert!(matches!(outcome, ExecutionOutcome::Success { .. }));

        // The same prepared program serves every test case
        let outcome = adapter.execute(&program, b"7\n").await;
        assert_eq!(outcome.stdout(), Some("49\n"));

        let dir = program.dir().to_path_buf();
        program.cleanup().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_runtime_error_and_timeout() {
        let root = tempfile::tempdir().unwrap();
        let adapter = adapter(root.path());

        let program = adapter
            .prepare(&submission("echo 'Traceback: boom' >&2; exit 1"))
            .await
            .unwrap();
        match adapter.execute(&program, b"").await {
            ExecutionOutcome::RuntimeError {
                diagnostic,
                exit_status,
                timed_out,
                ..
            } => {
                assert_eq!(diagnostic, "Traceback: boom");
                assert_eq!(exit_status, Some(1));
                assert!(!timed_out);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let program = adapter.prepare(&submission("sleep 5")).await.unwrap();
        match adapter.execute(&program, b"").await {
            ExecutionOutcome::RuntimeError { timed_out, .. } => assert!(timed_out),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_infrastructure_error() {
        let root = tempfile::tempdir().unwrap();
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new())).with_temp_root(root.path());
        let adapter = InterpretedAdapter::new(
            Language::Php,
            ToolchainConfig::interpreted(&["/nonexistent/codedojo-php", "{source}"]),
            ctx,
        );

        let sub = Submission::new(SubmissionId(2), "<?php", "a.php", SubmissionMeta::default());
        let program = adapter.prepare(&sub).await.unwrap();
        let outcome = adapter.execute(&program, b"").await;
        assert!(matches!(outcome, ExecutionOutcome::InfrastructureError { .. }));
    }
}
