//! Submitted source code and its identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::Language;

const DEFAULT_AUTHOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional metadata supplied with a submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionMeta {
    pub author: Option<String>,
    /// Test target; defaults to the file stem
    pub challenge: Option<String>,
}

/// One piece of source code being judged. Immutable once created.
#[derive(Debug, Clone)]
pub struct Submission {
    id: SubmissionId,
    source: String,
    filename: String,
    language: Language,
    author: String,
    target: String,
}

impl Submission {
    pub fn new(
        id: SubmissionId,
        source: impl Into<String>,
        filename: impl Into<String>,
        meta: SubmissionMeta,
    ) -> Self {
        let filename = filename.into();
        let language = Language::from_filename(&filename);
        let target = meta
            .challenge
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| file_stem(&filename).to_string());

        Self {
            id,
            source: source.into(),
            language,
            author: meta.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            target,
            filename,
        }
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Name of the test set this submission is judged against
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Base name shown in reports
    pub fn display_name(&self) -> &str {
        base_name(&self.filename).unwrap_or(&self.filename)
    }

    pub fn file_stem(&self) -> &str {
        file_stem(&self.filename)
    }

    /// File name to stage the source under inside a private directory
    pub fn staged_file_name(&self) -> String {
        match base_name(&self.filename) {
            Some(name) => name.to_string(),
            None => format!("main.{}", self.language.extension()),
        }
    }
}

fn base_name(filename: &str) -> Option<&str> {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults_to_file_stem() {
        let sub = Submission::new(
            SubmissionId(1),
            "print(1)",
            "solutions/postes.py",
            SubmissionMeta::default(),
        );
        assert_eq!(sub.target(), "postes");
        assert_eq!(sub.language(), Language::Python);
        assert_eq!(sub.display_name(), "postes.py");
        assert_eq!(sub.author(), "system");
    }

    #[test]
    fn test_explicit_challenge_and_author() {
        let meta = SubmissionMeta {
            author: Some("Ana".into()),
            challenge: Some("squares".into()),
        };
        let sub = Submission::new(SubmissionId(2), "", "main.cpp", meta);
        assert_eq!(sub.target(), "squares");
        assert_eq!(sub.author(), "Ana");
    }

    #[test]
    fn test_staged_file_name() {
        let sub = Submission::new(SubmissionId(3), "", "../../etc/a.rs", SubmissionMeta::default());
        assert_eq!(sub.staged_file_name(), "a.rs");

        let sub = Submission::new(SubmissionId(4), "", "", SubmissionMeta::default());
        assert_eq!(sub.staged_file_name(), "main.txt");
        assert_eq!(sub.language(), Language::Unknown);
    }
}
