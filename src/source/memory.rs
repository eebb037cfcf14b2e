//! In-memory test source for embedding and tests

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{TestCase, TestCaseSource, TestGroup};

#[derive(Debug, Default)]
pub struct MemoryTestCaseSource {
    groups: Vec<(TestGroup, Vec<TestCase>)>,
    group_listings: AtomicUsize,
}

impl MemoryTestCaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a case, creating its group on first use. Insertion order is kept.
    pub fn with_case(
        mut self,
        target: &str,
        group: &str,
        id: &str,
        input: impl AsRef<[u8]>,
        expected: Option<&str>,
    ) -> Self {
        let case = TestCase {
            id: id.to_string(),
            input: input.as_ref().to_vec(),
            expected: expected.map(|e| e.as_bytes().to_vec()),
        };
        match self
            .groups
            .iter_mut()
            .find(|(g, _)| g.target == target && g.name == group)
        {
            Some((_, cases)) => cases.push(case),
            None => self.groups.push((TestGroup::new(target, group), vec![case])),
        }
        self
    }

    /// Number of `list_groups` calls served so far
    pub fn group_listings(&self) -> usize {
        self.group_listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestCaseSource for MemoryTestCaseSource {
    async fn list_groups(&self, target: &str) -> Result<Vec<TestGroup>> {
        self.group_listings.fetch_add(1, Ordering::SeqCst);
        let groups: Vec<TestGroup> = self
            .groups
            .iter()
            .filter(|(g, _)| g.target == target)
            .map(|(g, _)| g.clone())
            .collect();
        if groups.is_empty() {
            anyhow::bail!("test folder not found: {}", target);
        }
        Ok(groups)
    }

    async fn list_cases(&self, group: &TestGroup) -> Result<Vec<TestCase>> {
        self.groups
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, cases)| cases.clone())
            .ok_or_else(|| anyhow::anyhow!("Unknown test group {}/{}", group.target, group.name))
    }
}
