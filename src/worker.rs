//! Queue worker: judge jobs popped from Redis, results stored back in Redis

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::AdapterRegistry;
use crate::config::JudgeConfig;
use crate::judger::Judge;
use crate::redis_manager::RedisManager;
use crate::sink::RedisSink;
use crate::submission::{Submission, SubmissionId, SubmissionMeta};

/// Job received from the Redis queue
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeJob {
    pub submission_id: u64,
    /// Language is detected from the extension
    pub filename: String,
    pub code: String,
    /// Test target; defaults to the filename stem
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl JudgeJob {
    pub fn into_submission(self) -> Submission {
        Submission::new(
            SubmissionId(self.submission_id),
            self.code,
            self.filename,
            SubmissionMeta {
                author: self.author,
                challenge: self.challenge,
            },
        )
    }
}

/// Consume the queue until the process is stopped
pub async fn run(config: &JudgeConfig) -> Result<()> {
    info!("Starting Judge Worker...");

    let toolchains = config.toolchains()?;
    let adapters = AdapterRegistry::from_toolchains(&toolchains, &config.adapter_context());
    info!("Loaded toolchains for {:?}", toolchains.languages());

    // BLPOP blocks its connection, so results go through a second one
    let mut queue = RedisManager::with_url(&config.redis_url).await?;
    let sink = Arc::new(RedisSink::connect(&config.redis_url).await?);
    let judge = Judge::new(adapters, config.test_case_source(), sink)
        .with_excerpt_chars(config.excerpt_chars);

    info!("Waiting for jobs...");

    loop {
        let job: JudgeJob = queue.pop_job().await?;
        info!(
            "Received judge job: submission_id={}, filename={}",
            job.submission_id, job.filename
        );

        // A failed judge has already stored an infrastructure_error summary
        // at judge:result:<id>, so pollers are never left waiting
        let submission = job.into_submission();
        if let Err(e) = judge.judge(&submission).await {
            error!(
                "Failed to judge submission {}: {:#}",
                submission.id(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;

    #[test]
    fn test_parse_job_with_optional_fields() {
        let job: JudgeJob = serde_json::from_str(
            r#"{"submission_id": 12, "filename": "postes.cpp", "code": "int main(){}"}"#,
        )
        .unwrap();
        let submission = job.into_submission();
        assert_eq!(submission.id(), SubmissionId(12));
        assert_eq!(submission.language(), Language::Cpp);
        assert_eq!(submission.target(), "postes");
        assert_eq!(submission.author(), "system");

        let job: JudgeJob = serde_json::from_str(
            r#"{"submission_id": 13, "filename": "Main.java", "code": "", "challenge": "postes", "author": "Ana"}"#,
        )
        .unwrap();
        let submission = job.into_submission();
        assert_eq!(submission.target(), "postes");
        assert_eq!(submission.author(), "Ana");
    }
}
