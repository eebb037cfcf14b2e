//! Result sinks - append-only persistence of judge results
//!
//! The judge emits one `TestRecord` per declared test case and one
//! `SummaryRecord` per submission. Sinks are never read back by the judge.

pub mod jsonl;
pub mod memory;
pub mod redis;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Comparison, Language, OverallStatus, Verdict};
use crate::submission::SubmissionId;

pub use self::jsonl::JsonlSink;
pub use self::memory::MemorySink;
pub use self::redis::RedisSink;

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub submission_id: SubmissionId,
    pub group: String,
    pub case_id: String,
    pub verdict: Verdict,
    /// `None` for missing fixtures, which never reach comparison
    pub comparison: Option<Comparison>,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Submission totals, emitted once when judging is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub submission_id: SubmissionId,
    pub author: String,
    pub filename: String,
    pub language: Language,
    pub target: String,
    pub total_correct: usize,
    pub total_wrong: usize,
    pub total_errored: usize,
    pub total_missing_fixture: usize,
    pub total_elapsed_ms: f64,
    pub status: OverallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// One line of an event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    Test(TestRecord),
    Summary(SummaryRecord),
}

/// Append-only result persistence. Must tolerate concurrent appends.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record_test(&self, record: &TestRecord) -> Result<()>;

    async fn record_summary(&self, record: &SummaryRecord) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn test_record(id: u64, case_id: &str) -> TestRecord {
        TestRecord {
            submission_id: SubmissionId(id),
            group: "1".into(),
            case_id: case_id.into(),
            verdict: Verdict::WrongAnswer,
            comparison: Some(Comparison::WrongAnswer),
            elapsed_ms: 1.5,
            output: Some("1 2".into()),
            expected: Some("0 3".into()),
            diagnostic: None,
        }
    }

    pub fn summary_record(id: u64) -> SummaryRecord {
        SummaryRecord {
            submission_id: SubmissionId(id),
            author: "system".into(),
            filename: "postes.py".into(),
            language: Language::Python,
            target: "postes".into(),
            total_correct: 1,
            total_wrong: 1,
            total_errored: 0,
            total_missing_fixture: 0,
            total_elapsed_ms: 3.0,
            status: OverallStatus::Failed,
            diagnostic: None,
        }
    }
}
