//! Filesystem test source: `<root>/<target>/<group>/<case>.in|.sol`

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{
    pair_case_files, sort_natural, validate_segment, TestCase, TestCaseSource, TestGroup,
    ANSWER_EXTENSION, INPUT_EXTENSION,
};

#[derive(Debug, Clone)]
pub struct FsTestCaseSource {
    root: PathBuf,
}

impl FsTestCaseSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

async fn read_payload(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
}

async fn list_dir(dir: &Path, want_dirs: bool) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {:?}", dir))?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_dir() != want_dirs {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[async_trait]
impl TestCaseSource for FsTestCaseSource {
    async fn list_groups(&self, target: &str) -> Result<Vec<TestGroup>> {
        validate_segment("target", target)?;
        let dir = self.root.join(target);
        if !tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            anyhow::bail!("test folder not found: {}", dir.display());
        }

        let mut names = list_dir(&dir, true).await?;
        sort_natural(&mut names);
        debug!("Found {} test groups in {:?}", names.len(), dir);

        Ok(names
            .into_iter()
            .map(|name| TestGroup::new(target, name))
            .collect())
    }

    async fn list_cases(&self, group: &TestGroup) -> Result<Vec<TestCase>> {
        validate_segment("target", &group.target)?;
        validate_segment("group", &group.name)?;
        let dir = self.root.join(&group.target).join(&group.name);

        let files = list_dir(&dir, false).await?;
        let mut cases = Vec::new();
        for case in pair_case_files(&files) {
            let input_path = dir.join(format!("{}.{}", case.id, INPUT_EXTENSION));
            let input = read_payload(&input_path).await?;

            let expected = if case.has_answer {
                let answer_path = dir.join(format!("{}.{}", case.id, ANSWER_EXTENSION));
                Some(read_payload(&answer_path).await?)
            } else {
                None
            };

            cases.push(TestCase {
                id: case.id,
                input,
                expected,
            });
        }
        Ok(cases)
    }
}
