//! Compiler module - Source code compilation
//!
//! Runs a toolchain command through a `Runner` and turns its result into a
//! success flag plus the diagnostic text to show for a failed build.

use anyhow::Result;
use tracing::debug;

use crate::runner::{CommandSpec, RunLimits, RunStatus, Runner};

/// JVM banner printed to stderr whenever JAVA_TOOL_OPTIONS is set
const JAVA_TOOL_OPTIONS_NOTICE: &str = "Picked up JAVA_TOOL_OPTIONS";

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CompileResult {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

/// Compile with the given toolchain command.
///
/// `Err` means the compiler could not be started at all. With
/// `strict_diagnostics`, a zero exit that still printed to stderr counts as a
/// failed build.
pub async fn compile(
    runner: &dyn Runner,
    compile_cmd: &CommandSpec,
    limits: &RunLimits,
    strict_diagnostics: bool,
) -> Result<CompileResult> {
    if compile_cmd.program.is_empty() {
        return Ok(CompileResult::ok());
    }

    debug!("Compiling with {:?}", compile_cmd.to_vec());

    let result = runner.run(compile_cmd, &[], limits).await?;
    let stderr = clean_diagnostics(&result.stderr);

    match result.status {
        RunStatus::Exited(0) if strict_diagnostics && !stderr.trim().is_empty() => {
            Ok(CompileResult::failed(stderr))
        }
        RunStatus::Exited(0) => Ok(CompileResult::ok()),
        status => {
            let error_msg = if !stderr.trim().is_empty() {
                stderr
            } else if !result.stdout.trim().is_empty() {
                result.stdout
            } else {
                match status {
                    RunStatus::TimedOut => "Compilation timed out".to_string(),
                    RunStatus::Signaled(sig) => format!("Compiler killed by signal {}", sig),
                    RunStatus::Exited(code) => {
                        format!("Compilation failed with exit code {}", code)
                    }
                }
            };
            Ok(CompileResult::failed(error_msg))
        }
    }
}

/// Drop runtime banners that are not diagnostics about the submission
pub fn clean_diagnostics(stderr: &str) -> String {
    if !stderr.contains(JAVA_TOOL_OPTIONS_NOTICE) {
        return stderr.to_string();
    }
    stderr
        .lines()
        .filter(|line| !line.trim().starts_with(JAVA_TOOL_OPTIONS_NOTICE))
        .collect::<Vec<_>>()
        .join("\n")
}
