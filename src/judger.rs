//! Judger module - drives one submission through every test case
//!
//! Phases: Detecting -> Preparing -> Running -> Summarizing -> Done.
//! The language is resolved once, the program is prepared once, then every
//! declared test case runs in order (groups in order, cases in order).
//! Each case produces exactly one report entry and one sink record, so
//! `correct + wrong + errored + missing_fixture` equals the declared total.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::{
    AdapterRegistry, ExecutionOutcome, LanguageAdapter, PrepareFailure, PreparedProgram,
};
use crate::core::{compare_output, OverallStatus, Verdict};
use crate::report::{excerpt, GroupReport, Report, Summary, TestReport};
use crate::sink::{ResultSink, SummaryRecord, TestRecord};
use crate::source::{TestCase, TestCaseSource, TestGroup};
use crate::submission::Submission;

pub const DEFAULT_EXCERPT_CHARS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Detecting,
    Preparing,
    Running,
    Summarizing,
    Done,
}

/// Result of the Preparing phase
enum Prepared {
    Ready(PreparedProgram),
    Failed(PrepareFailure),
}

/// Judges submissions against a test source, reporting to a sink.
///
/// Holds no per-submission state; one `Judge` may serve many submissions,
/// concurrently or not.
pub struct Judge {
    adapters: AdapterRegistry,
    source: Arc<dyn TestCaseSource>,
    sink: Arc<dyn ResultSink>,
    excerpt_chars: usize,
}

impl Judge {
    pub fn new(
        adapters: AdapterRegistry,
        source: Arc<dyn TestCaseSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            adapters,
            source,
            sink,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    /// Judge one submission.
    ///
    /// Verdicts never surface as `Err`; only a failing or empty test source
    /// does, and even then a summary record is written first.
    pub async fn judge(&self, submission: &Submission) -> Result<Report> {
        info!(
            "Judging submission {}: file={}, language={}, target={}",
            submission.id(),
            submission.display_name(),
            submission.language(),
            submission.target()
        );

        self.enter(submission, Phase::Detecting);
        let adapter = match self.detect(submission) {
            Ok(adapter) => adapter,
            Err(diagnostic) => return Ok(self.unsupported(submission, diagnostic).await),
        };

        self.enter(submission, Phase::Preparing);
        let prepared = match adapter.prepare(submission).await {
            Ok(program) => Prepared::Ready(program),
            Err(failure) => {
                info!(
                    "Submission {} failed to prepare: {}",
                    submission.id(),
                    failure
                );
                Prepared::Failed(failure)
            }
        };

        self.enter(submission, Phase::Running);
        let mut groups = Vec::new();
        let listed = self
            .run_groups(submission, adapter.as_ref(), &prepared, &mut groups)
            .await;
        let listed = match listed {
            Ok(()) if groups.iter().all(|g| g.tests.is_empty()) => Err(anyhow::anyhow!(
                "no test cases found for {}",
                submission.target()
            )),
            other => other,
        };

        // The workspace goes away before the result is known to the caller
        let failure = match prepared {
            Prepared::Ready(program) => {
                if let Err(e) = program.cleanup() {
                    warn!(
                        "Failed to remove workspace of submission {}: {}",
                        submission.id(),
                        e
                    );
                }
                None
            }
            Prepared::Failed(failure) => Some(failure),
        };

        self.enter(submission, Phase::Summarizing);
        let total = Summary::fold(groups.iter().map(|g| &g.summary));

        // Records already written stay consistent with a closing summary
        if let Err(e) = listed {
            warn!("Submission {}: test source failed: {:#}", submission.id(), e);
            let diagnostic = excerpt(&format!("{:#}", e), self.excerpt_chars);
            self.finish(
                submission,
                OverallStatus::InfrastructureError,
                Some(diagnostic),
                groups,
                total,
            )
            .await;
            self.enter(submission, Phase::Done);
            return Err(e);
        }

        let status = match &failure {
            Some(PrepareFailure::Compile(_)) => OverallStatus::CompileError,
            Some(PrepareFailure::Infrastructure(_)) => OverallStatus::InfrastructureError,
            None if total.all_correct() => OverallStatus::Passed,
            None => OverallStatus::Failed,
        };
        let diagnostic = failure.map(|f| excerpt(f.diagnostic(), self.excerpt_chars));
        let report = self.finish(submission, status, diagnostic, groups, total).await;

        self.enter(submission, Phase::Done);
        Ok(report)
    }

    fn enter(&self, submission: &Submission, phase: Phase) {
        debug!("Submission {} -> {:?}", submission.id(), phase);
    }

    fn detect(&self, submission: &Submission) -> Result<Arc<dyn LanguageAdapter>, String> {
        let language = submission.language();
        if !language.is_known() {
            return Err(format!(
                "unsupported language for {}",
                submission.display_name()
            ));
        }
        self.adapters
            .get(language)
            .ok_or_else(|| format!("no toolchain configured for {}", language))
    }

    async fn unsupported(&self, submission: &Submission, diagnostic: String) -> Report {
        warn!("Submission {}: {}", submission.id(), diagnostic);
        self.enter(submission, Phase::Summarizing);
        let report = self
            .finish(
                submission,
                OverallStatus::UnsupportedLanguage,
                Some(diagnostic),
                Vec::new(),
                Summary::default(),
            )
            .await;
        self.enter(submission, Phase::Done);
        report
    }

    async fn run_groups(
        &self,
        submission: &Submission,
        adapter: &dyn LanguageAdapter,
        prepared: &Prepared,
        reports: &mut Vec<GroupReport>,
    ) -> Result<()> {
        let groups = self.source.list_groups(submission.target()).await?;
        reports.reserve(groups.len());

        for group in groups {
            let cases = self.source.list_cases(&group).await?;
            let mut report = GroupReport::new(&group.name);

            for case in &cases {
                let test = self.run_case(adapter, prepared, case).await;
                self.record(submission, &group, &test).await;
                report.push(test);
            }

            debug!(
                "Submission {} finished group {}: {} correct of {}",
                submission.id(),
                group.name,
                report.summary.correct,
                report.summary.total()
            );
            reports.push(report);
        }

        Ok(())
    }

    async fn run_case(
        &self,
        adapter: &dyn LanguageAdapter,
        prepared: &Prepared,
        case: &TestCase,
    ) -> TestReport {
        let Some(expected) = case.expected.as_deref() else {
            return TestReport {
                id: case.id.clone(),
                verdict: Verdict::MissingFixture,
                elapsed_ms: 0.0,
                output: None,
                expected: None,
                diagnostic: Some(format!("missing expected output for case {}", case.id)),
            };
        };
        let expected = String::from_utf8_lossy(expected);

        let outcome = match prepared {
            Prepared::Ready(program) => adapter.execute(program, &case.input).await,
            Prepared::Failed(failure) => failure.to_outcome(),
        };

        let verdict = match &outcome {
            ExecutionOutcome::Success { stdout, .. } if compare_output(stdout, &expected) => {
                Verdict::Correct
            }
            ExecutionOutcome::Success { .. } => Verdict::WrongAnswer,
            ExecutionOutcome::RuntimeError { .. } => Verdict::RuntimeError,
            ExecutionOutcome::CompileError { .. } => Verdict::CompileError,
            ExecutionOutcome::InfrastructureError { .. } => Verdict::InfrastructureError,
        };

        TestReport {
            id: case.id.clone(),
            verdict,
            elapsed_ms: outcome.elapsed().as_secs_f64() * 1000.0,
            output: outcome.stdout().map(|s| excerpt(s, self.excerpt_chars)),
            expected: Some(excerpt(&expected, self.excerpt_chars)),
            diagnostic: outcome.diagnostic().map(|d| excerpt(d, self.excerpt_chars)),
        }
    }

    async fn record(&self, submission: &Submission, group: &TestGroup, test: &TestReport) {
        let record = TestRecord {
            submission_id: submission.id(),
            group: group.name.clone(),
            case_id: test.id.clone(),
            verdict: test.verdict,
            comparison: test.verdict.comparison(),
            elapsed_ms: test.elapsed_ms,
            output: test.output.clone(),
            expected: test.expected.clone(),
            diagnostic: test.diagnostic.clone(),
        };
        if let Err(e) = self.sink.record_test(&record).await {
            warn!(
                "Failed to record test {}/{} of submission {}: {:#}",
                group.name,
                test.id,
                submission.id(),
                e
            );
        }
    }

    async fn finish(
        &self,
        submission: &Submission,
        status: OverallStatus,
        diagnostic: Option<String>,
        groups: Vec<GroupReport>,
        total: Summary,
    ) -> Report {
        let record = SummaryRecord {
            submission_id: submission.id(),
            author: submission.author().to_string(),
            filename: submission.display_name().to_string(),
            language: submission.language(),
            target: submission.target().to_string(),
            total_correct: total.correct,
            total_wrong: total.wrong,
            total_errored: total.errored,
            total_missing_fixture: total.missing_fixture,
            total_elapsed_ms: total.elapsed_ms,
            status,
            diagnostic: diagnostic.clone(),
        };
        if let Err(e) = self.sink.record_summary(&record).await {
            warn!(
                "Failed to record summary of submission {}: {:#}",
                submission.id(),
                e
            );
        }

        info!(
            "Judge job completed: submission_id={}, status={}, correct={}/{}",
            submission.id(),
            status,
            total.correct,
            total.total()
        );

        Report {
            submission_id: submission.id(),
            filename: submission.display_name().to_string(),
            author: submission.author().to_string(),
            language: submission.language(),
            target: submission.target().to_string(),
            status,
            diagnostic,
            groups,
            total,
        }
    }
}
