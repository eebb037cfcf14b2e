pub mod language;
pub mod verdict;

pub use language::{Language, LanguageFamily};
pub use verdict::{compare_output, Comparison, OverallStatus, Verdict};
