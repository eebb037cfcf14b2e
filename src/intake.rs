//! Submission intake: `submit` stores source code, `judge` runs it

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::JudgeError;
use crate::judger::Judge;
use crate::report::Report;
use crate::submission::{Submission, SubmissionId, SubmissionMeta};

pub struct Intake {
    judge: Judge,
    submissions: Mutex<HashMap<SubmissionId, Arc<Submission>>>,
    next_id: AtomicU64,
}

impl Intake {
    pub fn new(judge: Judge) -> Self {
        Self {
            judge,
            submissions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn submit(
        &self,
        source: impl Into<String>,
        filename: impl Into<String>,
        meta: SubmissionMeta,
    ) -> SubmissionId {
        let id = SubmissionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let submission = Submission::new(id, source, filename, meta);
        debug!(
            "Accepted submission {} ({}, {})",
            id,
            submission.display_name(),
            submission.language()
        );

        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, Arc::new(submission));
        id
    }

    pub fn get(&self, id: SubmissionId) -> Option<Arc<Submission>> {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
    }

    /// Judge a stored submission. Can be repeated; each call is independent.
    pub async fn judge(&self, id: SubmissionId) -> Result<Report, JudgeError> {
        let submission = self.get(id).ok_or(JudgeError::UnknownSubmission(id))?;
        self.judge
            .judge(&submission)
            .await
            .map_err(JudgeError::TestSource)
    }
}
