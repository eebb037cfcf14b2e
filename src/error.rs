use thiserror::Error;

use crate::submission::SubmissionId;

/// Failures of the submission intake
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("unknown submission {0}")]
    UnknownSubmission(SubmissionId),

    #[error("failed to load test cases")]
    TestSource(#[source] anyhow::Error),
}
