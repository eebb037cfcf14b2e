//! MinIO/S3 test source
//!
//! Same layout as the filesystem source, stored as object keys:
//! `[<prefix>/]<target>/<group>/<case>.in|.sol`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use tracing::{debug, info};

use super::{
    pair_case_files, sort_natural, validate_segment, TestCase, TestCaseSource, TestGroup,
    ANSWER_EXTENSION, INPUT_EXTENSION,
};
use crate::config::StorageConfig;

#[derive(Clone)]
pub struct StorageTestCaseSource {
    client: Client,
    bucket: String,
    prefix: String,
}

impl StorageTestCaseSource {
    pub fn new(config: &StorageConfig) -> Self {
        let protocol = if config.use_ssl { "https" } else { "http" };
        let endpoint_url = format!("{}://{}:{}", protocol, config.endpoint, config.port);

        info!("Using MinIO test source at {} (bucket {})", endpoint_url, config.bucket);

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "minio",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(&endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            prefix: normalize_prefix(&config.prefix),
        }
    }

    fn key(&self, parts: &[&str]) -> String {
        format!("{}{}", self.prefix, parts.join("/"))
    }

    /// All keys under `prefix`, or the immediate "subdirectories" when
    /// `delimited` is set. Follows continuation tokens.
    async fn list(&self, prefix: &str, delimited: bool) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take());
            if delimited {
                request = request.delimiter("/");
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list {}", prefix))?;

            if delimited {
                for common in response.common_prefixes() {
                    if let Some(p) = common.prefix() {
                        let name = p.strip_prefix(prefix).unwrap_or(p);
                        names.push(name.trim_end_matches('/').to_string());
                    }
                }
            } else {
                for object in response.contents() {
                    if let Some(key) = object.key() {
                        names.push(key.strip_prefix(prefix).unwrap_or(key).to_string());
                    }
                }
            }

            match response.next_continuation_token() {
                Some(next) if response.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }

        names.retain(|n| !n.is_empty() && !n.contains('/'));
        Ok(names)
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", key))?;

        let data = response
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of {}", key))?;
        Ok(data.into_bytes().to_vec())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[async_trait]
impl TestCaseSource for StorageTestCaseSource {
    async fn list_groups(&self, target: &str) -> Result<Vec<TestGroup>> {
        validate_segment("target", target)?;
        let prefix = format!("{}/", self.key(&[target]));

        let mut names = self.list(&prefix, true).await?;
        if names.is_empty() {
            anyhow::bail!("test folder not found: {}", prefix);
        }
        sort_natural(&mut names);
        debug!("Found {} test groups under {}", names.len(), prefix);

        Ok(names
            .into_iter()
            .map(|name| TestGroup::new(target, name))
            .collect())
    }

    async fn list_cases(&self, group: &TestGroup) -> Result<Vec<TestCase>> {
        validate_segment("target", &group.target)?;
        validate_segment("group", &group.name)?;
        let prefix = format!("{}/", self.key(&[&group.target, &group.name]));

        let files = self.list(&prefix, false).await?;
        let mut cases = Vec::new();
        for case in pair_case_files(&files) {
            let input = self
                .download(&format!("{}{}.{}", prefix, case.id, INPUT_EXTENSION))
                .await?;
            let expected = if case.has_answer {
                Some(
                    self.download(&format!("{}{}.{}", prefix, case.id, ANSWER_EXTENSION))
                        .await?,
                )
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
