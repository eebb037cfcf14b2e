use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::{ResultSink, SinkEvent, SummaryRecord, TestRecord};

/// Collects events in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn tests(&self) -> Vec<TestRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Test(record) => Some(record),
                SinkEvent::Summary(_) => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Summary(record) => Some(record),
                SinkEvent::Test(_) => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record_test(&self, record: &TestRecord) -> Result<()> {
        self.push(SinkEvent::Test(record.clone()));
        Ok(())
    }

    async fn record_summary(&self, record: &SummaryRecord) -> Result<()> {
        self.push(SinkEvent::Summary(record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::fixtures::{summary_record, test_record};

    #[tokio::test]
    async fn test_keeps_arrival_order() {
        let sink = MemorySink::new();
        sink.record_test(&test_record(1, "1")).await.unwrap();
        sink.record_test(&test_record(1, "2")).await.unwrap();
        sink.record_summary(&summary_record(1)).await.unwrap();

        let case_ids: Vec<String> = sink.tests().into_iter().map(|t| t.case_id).collect();
        assert_eq!(case_ids, vec!["1", "2"]);
        assert_eq!(sink.summaries().len(), 1);
        assert!(matches!(sink.events().last(), Some(SinkEvent::Summary(_))));
    }

    #[tokio::test]
    async fn test_poisoned_lock_keeps_recording_and_reading() {
        let sink = std::sync::Arc::new(MemorySink::new());
        sink.record_test(&test_record(1, "1")).await.unwrap();

        let poisoner = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.events.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(sink.events.is_poisoned());

        sink.record_test(&test_record(1, "2")).await.unwrap();
        assert_eq!(sink.tests().len(), 2);
    }
}
