//! Java: stage under the public class name, compile to bytecode, run on the JVM

use async_trait::async_trait;
use tracing::{debug, info};

use super::{AdapterContext, ExecutionOutcome, LanguageAdapter, PrepareFailure, PreparedProgram};
use crate::compiler::compile;
use crate::core::Language;
use crate::languages::{Placeholders, ToolchainConfig};
use crate::submission::Submission;

const DEFAULT_CLASS: &str = "Main";

pub struct JavaAdapter {
    toolchain: ToolchainConfig,
    ctx: AdapterContext,
}

impl JavaAdapter {
    pub fn new(toolchain: ToolchainConfig, ctx: AdapterContext) -> Self {
        Self { toolchain, ctx }
    }
}

/// Class the JVM must be started with.
///
/// javac requires a public class to live in a file of the same name, so the
/// declared public class wins. Otherwise the file stem is used when it is a
/// valid identifier, then `Main`.
pub fn detect_public_class(source: &str, file_stem: &str) -> String {
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*") {
            continue;
        }
        let mut words = trimmed.split_whitespace().peekable();
        if words.next() != Some("public") {
            continue;
        }
        while matches!(words.peek(), Some(&"final") | Some(&"abstract") | Some(&"static")) {
            words.next();
        }
        if words.next() != Some("class") {
            continue;
        }
        if let Some(name) = words.next() {
            let name = name.split(['{', '<']).next().unwrap_or_default();
            if is_java_identifier(name) {
                return name.to_string();
            }
        }
    }

    if is_java_identifier(file_stem) {
        file_stem.to_string()
    } else {
        DEFAULT_CLASS.to_string()
    }
}

fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[async_trait]
impl LanguageAdapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    async fn prepare(&self, submission: &Submission) -> Result<PreparedProgram, PrepareFailure> {
        let class = detect_public_class(submission.source(), submission.file_stem());
        let file_name = format!("{}.java", class);
        let (workspace, source_path) = self.ctx.stage(&file_name, submission.source()).await?;

        let vars = Placeholders {
            source: source_path.to_string_lossy().into_owned(),
            dir: workspace.path().to_string_lossy().into_owned(),
            class,
            ..Default::default()
        };

        let compile_cmd = self.toolchain.compile_spec(&vars).ok_or_else(|| {
            PrepareFailure::Infrastructure("No compile command for java".to_string())
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
            info!("Compilation failed for submission {} (java)", submission.id());
            return Err(PrepareFailure::Compile(
                result.message.unwrap_or_default().trim_end().to_string(),
            ));
        }

        debug!("Compiled submission {} as class {}", submission.id(), vars.class);
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

    #[test]
    fn test_detect_public_class() {
        let source = "import java.util.*;\n\npublic class Squared {\n    public static void main(String[] a) {}\n}\n";
        assert_eq!(detect_public_class(source, "postes"), "Squared");

        let generic = "public final class Box<T>{ }";
        assert_eq!(detect_public_class(generic, "x"), "Box");
    }

    #[test]
    fn test_detect_skips_comments() {
        let source = "// public class Commented\n/* public class Block */\nclass Helper {}\npublic class Real {}\n";
        assert_eq!(detect_public_class(source, "postes"), "Real");
    }

    #[test]
    fn test_detect_falls_back_to_stem_then_main() {
        assert_eq!(detect_public_class("class A {}", "postes"), "postes");
        assert_eq!(detect_public_class("class A {}", "my-solution"), "Main");
        assert_eq!(detect_public_class("", ""), "Main");
    }

    #[tokio::test]
    async fn test_stages_under_class_name() {
        let root = tempfile::tempdir().unwrap();
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new())).with_temp_root(root.path());
        // Stand-in toolchain: "compiling" checks the file name, "running" prints the class
        let toolchain = ToolchainConfig::compiled(
            &["sh", "-c", "test -f {dir}/{class}.java"],
            &["sh", "-c", "echo {class}"],
        )
        .with_strict_diagnostics(false);
        let adapter = JavaAdapter::new(toolchain, ctx);

        let sub = Submission::new(
            SubmissionId(3),
            "public class Squared {}",
            "postes.java",
            SubmissionMeta::default(),
        );
        let program = adapter.prepare(&sub).await.unwrap();
        assert!(program.dir().join("Squared.java").exists());

        let outcome = adapter.execute(&program, b"").await;
        assert_eq!(outcome.stdout(), Some("Squared\n"));
    }

    #[tokio::test]
    async fn test_java_banner_is_not_a_diagnostic() {
        let root = tempfile::tempdir().unwrap();
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new())).with_temp_root(root.path());
        let toolchain = ToolchainConfig::compiled(
            &["sh", "-c", "echo 'Picked up JAVA_TOOL_OPTIONS: -Xss64m' >&2"],
            &["sh", "-c", "echo 'Picked up JAVA_TOOL_OPTIONS: -Xss64m' >&2; exit 1"],
        );
        let adapter = JavaAdapter::new(toolchain, ctx);

        let sub = Submission::new(SubmissionId(4), "", "Main.java", SubmissionMeta::default());
        let program = adapter.prepare(&sub).await.unwrap();
        let outcome = adapter.execute(&program, b"").await;
        assert_eq!(outcome.diagnostic(), Some("exit code 1"));
    }
}
