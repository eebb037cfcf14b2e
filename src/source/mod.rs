//! Test case sources
//!
//! A target (challenge) holds ordered groups, each holding ordered cases.
//! Every backend uses the same layout: `<target>/<group>/<case>.in` with the
//! expected answer next to it in `<case>.sol`.

pub mod fs;
pub mod memory;
pub mod storage;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub use fs::FsTestCaseSource;
pub use memory::MemoryTestCaseSource;
pub use storage::StorageTestCaseSource;

pub(crate) const INPUT_EXTENSION: &str = "in";
pub(crate) const ANSWER_EXTENSION: &str = "sol";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestGroup {
    pub target: String,
    pub name: String,
}

impl TestGroup {
    pub fn new(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Unique within its group
    pub id: String,
    /// Raw bytes fed to stdin; not required to be UTF-8
    pub input: Vec<u8>,
    /// `None` when the answer file is missing
    pub expected: Option<Vec<u8>>,
}

/// Supplier of test groups and cases. Must be stable for one judge run.
#[async_trait]
pub trait TestCaseSource: Send + Sync {
    async fn list_groups(&self, target: &str) -> Result<Vec<TestGroup>>;

    async fn list_cases(&self, group: &TestGroup) -> Result<Vec<TestCase>>;
}

/// Numeric names compare numerically and sort before everything else
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}

/// Case files found in one group directory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CaseFiles {
    pub id: String,
    pub has_input: bool,
    pub has_answer: bool,
}

/// Pair `.in` and `.sol` file names by stem, naturally ordered.
/// Answers without an input are dropped; other files are ignored.
pub(crate) fn pair_case_files<I, S>(file_names: I) -> Vec<CaseFiles>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut by_id: BTreeMap<String, CaseFiles> = BTreeMap::new();
    for name in file_names {
        let Some((stem, ext)) = name.as_ref().rsplit_once('.') else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        let entry = by_id.entry(stem.to_string()).or_insert_with(|| CaseFiles {
            id: stem.to_string(),
            ..Default::default()
        });
        match ext {
            INPUT_EXTENSION => entry.has_input = true,
            ANSWER_EXTENSION => entry.has_answer = true,
            _ => {}
        }
    }

    let mut cases: Vec<CaseFiles> = by_id.into_values().filter(|c| c.has_input).collect();
    cases.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    cases
}

/// Reject names that would escape the source root
pub(crate) fn validate_segment(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        anyhow::bail!("Invalid {} name: {:?}", kind, name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order() {
        let mut names: Vec<String> = ["10", "2", "edge", "1", "big", "02"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        sort_natural(&mut names);
        assert_eq!(names, vec!["1", "02", "2", "10", "big", "edge"]);
    }

    #[test]
    fn test_pair_case_files() {
        let cases = pair_case_files(["2.in", "2.sol", "10.in", "10.sol", "1.in", "3.sol", "notes.txt", "README"]);
        let ids: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert!(!cases[0].has_answer);
        assert!(cases[1].has_answer);
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("target", "postes").is_ok());
        assert!(validate_segment("target", "..").is_err());
        assert!(validate_segment("target", "a/b").is_err());
        assert!(validate_segment("target", "").is_err());
    }
}
