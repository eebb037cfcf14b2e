//! Language detection from submitted file names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Languages the judge knows how to name.
///
/// `Unknown` is a valid resolution result, not an error. Callers must reject
/// it explicitly as an unsupported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    C,
    Cpp,
    Java,
    Javascript,
    Go,
    Rust,
    Php,
    Unknown,
}

/// How a language turns source code into something runnable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageFamily {
    /// Source file is handed to an interpreter
    Interpreted,
    /// Toolchain produces a native executable
    Native,
    /// Toolchain produces bytecode for a runtime
    Bytecode,
}

impl Language {
    /// Every language with a real toolchain behind it
    pub const SUPPORTED: [Language; 8] = [
        Language::Python,
        Language::C,
        Language::Cpp,
        Language::Java,
        Language::Javascript,
        Language::Go,
        Language::Rust,
        Language::Php,
    ];

    /// Resolve a language from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" => Language::Python,
            "c" => Language::C,
            "cpp" | "cc" | "cxx" => Language::Cpp,
            "java" => Language::Java,
            "js" => Language::Javascript,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            _ => Language::Unknown,
        }
    }

    /// Resolve a language from a file name or path
    pub fn from_filename(filename: &str) -> Self {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Look up a language by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Language::SUPPORTED
            .into_iter()
            .find(|lang| lang.name() == name.to_lowercase())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Javascript => "javascript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Unknown => "unknown",
        }
    }

    /// Canonical extension, used when a submission has no usable file name
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Javascript => "js",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::Php => "php",
            Language::Unknown => "txt",
        }
    }

    /// `None` for `Unknown`
    pub fn family(&self) -> Option<LanguageFamily> {
        match self {
            Language::Python | Language::Javascript | Language::Php => {
                Some(LanguageFamily::Interpreted)
            }
            Language::C | Language::Cpp | Language::Go | Language::Rust => {
                Some(LanguageFamily::Native)
            }
            Language::Java => Some(LanguageFamily::Bytecode),
            Language::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert_eq!(Language::from_filename("postes.py"), Language::Python);
        assert_eq!(Language::from_filename("main.c"), Language::C);
        assert_eq!(Language::from_filename("main.cpp"), Language::Cpp);
        assert_eq!(Language::from_filename("main.cc"), Language::Cpp);
        assert_eq!(Language::from_filename("main.cxx"), Language::Cpp);
        assert_eq!(Language::from_filename("Main.java"), Language::Java);
        assert_eq!(Language::from_filename("index.js"), Language::Javascript);
        assert_eq!(Language::from_filename("main.go"), Language::Go);
        assert_eq!(Language::from_filename("main.rs"), Language::Rust);
        assert_eq!(Language::from_filename("index.php"), Language::Php);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(Language::from_filename("POSTES.PY"), Language::Python);
        assert_eq!(Language::from_filename("Main.Java"), Language::Java);
        assert_eq!(Language::from_filename("a/b/sol.CPP"), Language::Cpp);
    }

    #[test]
    fn test_unknown_extensions() {
        assert_eq!(Language::from_filename("main.ts"), Language::Unknown);
        assert_eq!(Language::from_filename("notes.txt"), Language::Unknown);
        assert_eq!(Language::from_filename("Makefile"), Language::Unknown);
        assert_eq!(Language::from_filename(""), Language::Unknown);
        assert_eq!(Language::from_filename("archive.tar.gz"), Language::Unknown);
    }

    #[test]
    fn test_families() {
        assert_eq!(Language::Python.family(), Some(LanguageFamily::Interpreted));
        assert_eq!(Language::Php.family(), Some(LanguageFamily::Interpreted));
        assert_eq!(Language::Go.family(), Some(LanguageFamily::Native));
        assert_eq!(Language::Rust.family(), Some(LanguageFamily::Native));
        assert_eq!(Language::Java.family(), Some(LanguageFamily::Bytecode));
        assert_eq!(Language::Unknown.family(), None);
    }

    #[test]
    fn test_from_name_roundtrips_supported() {
        for lang in Language::SUPPORTED {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
        assert_eq!(Language::from_name("unknown"), None);
        assert_eq!(Language::from_name("PYTHON"), Some(Language::Python));
    }
}
