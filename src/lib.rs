//! CodeDojo judge - compiles and runs submissions against folder-structured
//! test cases, then reports per-test verdicts and totals.

pub mod adapters;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod intake;
pub mod judger;
pub mod languages;
pub mod redis_manager;
pub mod report;
pub mod runner;
pub mod sink;
pub mod source;
pub mod submission;
pub mod worker;

pub use crate::config::JudgeConfig;
pub use crate::error::JudgeError;
pub use crate::intake::Intake;
pub use crate::judger::Judge;
pub use crate::report::Report;
pub use crate::submission::{Submission, SubmissionId, SubmissionMeta};
