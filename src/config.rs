//! Deployment configuration loaded from environment variables

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapters::AdapterContext;
use crate::judger::DEFAULT_EXCERPT_CHARS;
use crate::languages::Toolchains;
use crate::runner::{ProcessRunner, RunLimits};
use crate::source::{FsTestCaseSource, StorageTestCaseSource, TestCaseSource};

/// Where test cases come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSourceKind {
    Fs,
    Storage,
}

impl FromStr for TestSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(TestSourceKind::Fs),
            "storage" | "minio" | "s3" => Ok(TestSourceKind::Storage),
            other => anyhow::bail!("Unknown test source {:?} (expected fs or storage)", other),
        }
    }
}

/// MinIO/S3 connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub port: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub use_ssl: bool,
    /// Key prefix above the challenge directories
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost".into(),
            port: "9000".into(),
            access_key: "minioadmin".into(),
            secret_key: "minioadmin".into(),
            bucket: "codedojo".into(),
            use_ssl: false,
            prefix: "templates".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub templates_root: PathBuf,
    pub run_timeout_ms: u64,
    pub compile_timeout_ms: u64,
    pub excerpt_chars: usize,
    pub temp_dir: Option<PathBuf>,
    pub results_path: PathBuf,
    pub test_source: TestSourceKind,
    pub redis_url: String,
    pub languages_config: Option<PathBuf>,
    pub storage: StorageConfig,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            templates_root: PathBuf::from("templates"),
            run_timeout_ms: 5_000,
            compile_timeout_ms: 30_000,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            temp_dir: None,
            results_path: PathBuf::from("results.jsonl"),
            test_source: TestSourceKind::Fs,
            redis_url: "redis://localhost:6379".into(),
            languages_config: None,
            storage: StorageConfig::default(),
        }
    }
}

impl JudgeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("TEMPLATES_ROOT") {
            config.templates_root = PathBuf::from(v);
        }
        if let Some(v) = get("RUN_TIMEOUT_MS") {
            config.run_timeout_ms = parse("RUN_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("COMPILE_TIMEOUT_MS") {
            config.compile_timeout_ms = parse("COMPILE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("OUTPUT_EXCERPT_CHARS") {
            config.excerpt_chars = parse("OUTPUT_EXCERPT_CHARS", &v)?;
        }
        config.temp_dir = get("JUDGE_TEMP_DIR").map(PathBuf::from);
        if let Some(v) = get("RESULTS_PATH") {
            config.results_path = PathBuf::from(v);
        }
        if let Some(v) = get("TESTCASE_SOURCE") {
            config.test_source = v.parse()?;
        }
        if let Some(v) = get("REDIS_URL") {
            config.redis_url = v;
        }
        config.languages_config = get("LANGUAGES_CONFIG").map(PathBuf::from);

        let storage = &mut config.storage;
        if let Some(v) = get("MINIO_ENDPOINT") {
            storage.endpoint = v;
        }
        if let Some(v) = get("MINIO_PORT") {
            storage.port = v;
        }
        if let Some(v) = get("MINIO_ACCESS_KEY") {
            storage.access_key = v;
        }
        if let Some(v) = get("MINIO_SECRET_KEY") {
            storage.secret_key = v;
        }
        if let Some(v) = get("MINIO_BUCKET") {
            storage.bucket = v;
        }
        if let Some(v) = get("MINIO_USE_SSL") {
            storage.use_ssl = v == "true" || v == "1";
        }
        if let Some(v) = lookup("MINIO_PREFIX") {
            storage.prefix = v;
        }

        Ok(config)
    }

    /// Built-in toolchains, or the file named by `LANGUAGES_CONFIG`
    pub fn toolchains(&self) -> Result<Toolchains> {
        match &self.languages_config {
            Some(path) => Toolchains::from_file(path),
            None => Toolchains::builtin(),
        }
    }

    pub fn adapter_context(&self) -> AdapterContext {
        let ctx = AdapterContext::new(Arc::new(ProcessRunner::new()))
            .with_run_limits(RunLimits::new(self.run_timeout_ms))
            .with_compile_limits(RunLimits::new(self.compile_timeout_ms));
        match &self.temp_dir {
            Some(dir) => ctx.with_temp_root(dir),
            None => ctx,
        }
    }

    pub fn test_case_source(&self) -> Arc<dyn TestCaseSource> {
        match self.test_source {
            TestSourceKind::Fs => Arc::new(FsTestCaseSource::new(&self.templates_root)),
            TestSourceKind::Storage => Arc::new(StorageTestCaseSource::new(&self.storage)),
        }
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<JudgeConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        JudgeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.templates_root, PathBuf::from("templates"));
        assert_eq!(config.run_timeout_ms, 5_000);
        assert_eq!(config.compile_timeout_ms, 30_000);
        assert_eq!(config.excerpt_chars, 4096);
        assert_eq!(config.test_source, TestSourceKind::Fs);
        assert!(config.temp_dir.is_none());
        assert_eq!(config.storage.prefix, "templates");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("RUN_TIMEOUT_MS", "1500"),
            ("TESTCASE_SOURCE", "storage"),
            ("JUDGE_TEMP_DIR", "/var/tmp/dojo"),
            ("MINIO_USE_SSL", "true"),
            ("MINIO_PREFIX", ""),
        ])
        .unwrap();
        assert_eq!(config.run_timeout_ms, 1500);
        assert_eq!(config.test_source, TestSourceKind::Storage);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/var/tmp/dojo")));
        assert!(config.storage.use_ssl);
        assert_eq!(config.storage.prefix, "");
        assert_eq!(config.adapter_context().run_limits.time_ms, 1500);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("RUN_TIMEOUT_MS", "soon")]).is_err());
        assert!(config(&[("TESTCASE_SOURCE", "database")]).is_err());
    }

    #[test]
    fn test_toolchains_default_to_builtin() {
        let toolchains = config(&[]).unwrap().toolchains().unwrap();
        assert!(toolchains.get(crate::core::Language::Java).is_some());
    }
}
