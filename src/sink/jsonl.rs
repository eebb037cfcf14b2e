//! JSON lines sink: one event per line, appended to a file

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{ResultSink, SinkEvent, SummaryRecord, TestRecord};

pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, event: SinkEvent) -> Result<()> {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to {:?}", self.path))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for JsonlSink {
    async fn record_test(&self, record: &TestRecord) -> Result<()> {
        self.append(SinkEvent::Test(record.clone())).await
    }

    async fn record_summary(&self, record: &SummaryRecord) -> Result<()> {
        self.append(SinkEvent::Summary(record.clone())).await
    }
}
