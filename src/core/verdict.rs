use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of comparing one execution against its expected output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Correct,
    WrongAnswer,
    Errored,
}

/// Per-test verdict as it appears in reports and result records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    WrongAnswer,
    CompileError,
    RuntimeError,
    InfrastructureError,
    MissingFixture,
}

impl Verdict {
    /// Errored verdicts count against the `errored` tally
    pub fn is_errored(&self) -> bool {
        matches!(
            self,
            Verdict::CompileError | Verdict::RuntimeError | Verdict::InfrastructureError
        )
    }

    /// `None` for tests that never reached comparison
    pub fn comparison(&self) -> Option<Comparison> {
        match self {
            Verdict::Correct => Some(Comparison::Correct),
            Verdict::WrongAnswer => Some(Comparison::WrongAnswer),
            Verdict::CompileError | Verdict::RuntimeError | Verdict::InfrastructureError => {
                Some(Comparison::Errored)
            }
            Verdict::MissingFixture => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Correct => "correct",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::CompileError => "compile_error",
            Verdict::RuntimeError => "runtime_error",
            Verdict::InfrastructureError => "infrastructure_error",
            Verdict::MissingFixture => "missing_fixture",
        };
        write!(f, "{}", s)
    }
}

/// Submission-wide status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Passed,
    Failed,
    CompileError,
    InfrastructureError,
    UnsupportedLanguage,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallStatus::Passed => "passed",
            OverallStatus::Failed => "failed",
            OverallStatus::CompileError => "compile_error",
            OverallStatus::InfrastructureError => "infrastructure_error",
            OverallStatus::UnsupportedLanguage => "unsupported_language",
        };
        write!(f, "{}", s)
    }
}

/// Compare program output with expected output.
///
/// Only leading and trailing whitespace is ignored. Internal whitespace,
/// including line endings, must match exactly.
pub fn compare_output(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_output_exact_match() {
        assert!(compare_output("5 squared is 25", "5 squared is 25"));
    }

    #[test]
    fn test_compare_output_outer_whitespace() {
        assert!(compare_output("error\n", "error"));
        assert!(compare_output("  1 2\n\n", "1 2"));
        assert!(compare_output("\t1 2", "1 2\r\n"));
    }

    #[test]
    fn test_compare_output_internal_whitespace_is_significant() {
        assert!(!compare_output("1  2", "1 2"));
        assert!(!compare_output("1\r\n2", "1\n2"));
        assert!(!compare_output("hello  \nworld", "hello\nworld"));
    }

    #[test]
    fn test_compare_output_different() {
        assert!(!compare_output("hello\nworld\n", "hello\nearth\n"));
        assert!(!compare_output("", "0"));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Correct.to_string(), "correct");
        assert_eq!(Verdict::WrongAnswer.to_string(), "wrong_answer");
        assert_eq!(Verdict::MissingFixture.to_string(), "missing_fixture");
        assert_eq!(OverallStatus::UnsupportedLanguage.to_string(), "unsupported_language");
    }

    #[test]
    fn test_verdict_comparison() {
        assert_eq!(Verdict::RuntimeError.comparison(), Some(Comparison::Errored));
        assert_eq!(Verdict::Correct.comparison(), Some(Comparison::Correct));
        assert_eq!(Verdict::MissingFixture.comparison(), None);
        assert!(Verdict::InfrastructureError.is_errored());
        assert!(!Verdict::WrongAnswer.is_errored());
    }

    #[test]
    fn test_verdict_serde_tag() {
        let json = serde_json::to_string(&Verdict::InfrastructureError).unwrap();
        assert_eq!(json, "\"infrastructure_error\"");
    }
}
