//! Judge report - per-test verdicts, per-group and total summaries
//!
//! The report is the only artifact handed to presentation layers. It is
//! serialized as JSON and can render itself as the text progress tree.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::core::{Language, OverallStatus, Verdict};
use crate::submission::SubmissionId;

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Counts and cumulative execution time folded from test verdicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub correct: usize,
    pub wrong: usize,
    pub errored: usize,
    pub missing_fixture: usize,
    pub elapsed_ms: f64,
}

impl Summary {
    pub fn record(&mut self, verdict: Verdict, elapsed_ms: f64) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::WrongAnswer => self.wrong += 1,
            Verdict::MissingFixture => self.missing_fixture += 1,
            Verdict::CompileError | Verdict::RuntimeError | Verdict::InfrastructureError => {
                self.errored += 1
            }
        }
        self.elapsed_ms += elapsed_ms;
    }

    pub fn merge(&mut self, other: &Summary) {
        self.correct += other.correct;
        self.wrong += other.wrong;
        self.errored += other.errored;
        self.missing_fixture += other.missing_fixture;
        self.elapsed_ms += other.elapsed_ms;
    }

    pub fn fold<'a>(summaries: impl IntoIterator<Item = &'a Summary>) -> Summary {
        summaries.into_iter().fold(Summary::default(), |mut acc, s| {
            acc.merge(s);
            acc
        })
    }

    /// Number of declared test cases
    pub fn total(&self) -> usize {
        self.correct + self.wrong + self.errored + self.missing_fixture
    }

    pub fn all_correct(&self) -> bool {
        self.wrong == 0 && self.errored == 0 && self.missing_fixture == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub id: String,
    pub verdict: Verdict,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub name: String,
    pub tests: Vec<TestReport>,
    pub summary: Summary,
}

impl GroupReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn push(&mut self, test: TestReport) {
        self.summary.record(test.verdict, test.elapsed_ms);
        self.tests.push(test);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub submission_id: SubmissionId,
    pub filename: String,
    pub author: String,
    pub language: Language,
    pub target: String,
    pub status: OverallStatus,
    /// Submission-level diagnostic (compile error, unsupported language, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub groups: Vec<GroupReport>,
    pub total: Summary,
}

impl Report {
    /// Human-readable progress tree
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} / (language: {})", self.target, self.language);
        out.push_str("│\n");

        if self.status == OverallStatus::UnsupportedLanguage {
            let _ = writeln!(
                out,
                "└── {}",
                self.diagnostic.as_deref().unwrap_or("unsupported language")
            );
            return out;
        }

        for group in &self.groups {
            out.push_str("│\n");
            let _ = writeln!(out, "├── folder {}", group.name);
            for test in &group.tests {
                render_test(&mut out, test);
            }
            out.push_str("    └── statistics folder\n");
            render_counts(&mut out, &group.summary, false);
        }

        out.push('\n');
        out.push_str("----------------------------------------------\n");
        out.push_str("    └── Statistics Total\n");
        render_counts(&mut out, &self.total, true);
        out
    }
}

fn render_test(out: &mut String, test: &TestReport) {
    let diagnostic = test.diagnostic.as_deref().unwrap_or("").trim();
    match test.verdict {
        Verdict::Correct | Verdict::WrongAnswer => {
            let label = if test.verdict == Verdict::Correct {
                "right answer"
            } else {
                "wrong answer"
            };
            let _ = writeln!(out, "    ├── {} / {}", test.id, label);
            let _ = writeln!(out, "        ├── out: {}", test.output.as_deref().unwrap_or("").trim());
            let _ = writeln!(out, "        └── answer: {}", test.expected.as_deref().unwrap_or("").trim());
        }
        Verdict::MissingFixture => {
            let _ = writeln!(out, "    ├── {} / .sol file not found", test.id);
        }
        Verdict::CompileError => {
            let _ = writeln!(out, "    ├── {} / compilation error", test.id);
            let _ = writeln!(out, "        └── error: {}", diagnostic);
        }
        Verdict::RuntimeError => {
            let _ = writeln!(out, "    ├── {} / execution error", test.id);
            let _ = writeln!(out, "        └── error: {}", diagnostic);
        }
        Verdict::InfrastructureError => {
            let _ = writeln!(out, "    ├── {} / infrastructure error", test.id);
            let _ = writeln!(out, "        └── error: {}", diagnostic);
        }
    }
}

fn render_counts(out: &mut String, summary: &Summary, with_time: bool) {
    let _ = writeln!(out, "        ├── correct: {}", summary.correct);
    let _ = writeln!(out, "        ├── wrong: {}", summary.wrong);
    let _ = writeln!(out, "        ├── errored: {}", summary.errored);
    if with_time {
        let _ = writeln!(out, "        ├── missing fixture: {}", summary.missing_fixture);
        let _ = writeln!(out, "        └── execution time: {:.2}ms", summary.elapsed_ms);
    } else {
        let _ = writeln!(out, "        └── missing fixture: {}", summary.missing_fixture);
    }
}

/// Truncate to at most `max_chars` characters, marking the cut
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
