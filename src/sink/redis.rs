//! Redis sink: per-test records in `judge:tests:<id>`, summary in
//! `judge:result:<id>` and on the `judge:results` channel

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ResultSink, SummaryRecord, TestRecord};
use crate::redis_manager::{keys, RedisManager};
use crate::submission::SubmissionId;

pub struct RedisSink {
    manager: Mutex<RedisManager>,
}

impl RedisSink {
    pub fn new(manager: RedisManager) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    pub async fn connect(redis_url: &str) -> Result<Self> {
        Ok(Self::new(RedisManager::with_url(redis_url).await?))
    }
}

pub fn tests_key(id: SubmissionId) -> String {
    format!("{}{}", keys::JUDGE_TESTS_PREFIX, id)
}

pub fn result_key(id: SubmissionId) -> String {
    format!("{}{}", keys::JUDGE_RESULT_PREFIX, id)
}

#[async_trait]
impl ResultSink for RedisSink {
    async fn record_test(&self, record: &TestRecord) -> Result<()> {
        let key = tests_key(record.submission_id);
        self.manager.lock().await.push_record(&key, record).await
    }

    async fn record_summary(&self, record: &SummaryRecord) -> Result<()> {
        let key = result_key(record.submission_id);
        self.manager
            .lock()
            .await
            .store_result(&key, Some(keys::JUDGE_RESULT_CHANNEL), record)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(tests_key(SubmissionId(42)), "judge:tests:42");
        assert_eq!(result_key(SubmissionId(42)), "judge:result:42");
    }
}
