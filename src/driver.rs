//! Runs every registered case and aggregates the results.
//!
//! # Execution model
//!
//! 1. **Setup**: open the optional log sink. Failure degrades to console only.
//! 2. **Snapshot**: copy the case list out of the registry and sort it by name.
//! 3. **Run**: for each case, reset its counters, make it current, run its body
//!    under `catch_unwind`, then clear the current slot.
//! 4. **Summarize**: print one status line per case and one aggregate line.
//!
//! Run order is purely lexicographic by case name, so it never depends on
//! declaration or link order. A panicking body is reported against its case and
//! the run continues with the next one.

use std::rc::Rc;
use std::sync::Arc;

use termcolor::WriteColor;

use crate::case::TestCase;
use crate::config::HarnessConfig;
use crate::locator::{self, Current};
use crate::panic::{self, CapturedPanic};
use crate::registry::Registry;
use crate::report::{format_real, Failure, LogSink, Reporter, Status};

// =============================================================================
// RESULTS
// =============================================================================

/// How a case's execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    /// Stopped early by `fail!`.
    Aborted,
    /// A panic escaped the body.
    Panicked { message: String },
}

/// Counters and outcome of one executed case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub name: String,
    pub weight: f64,
    pub checked: u64,
    pub passed: u64,
    pub termination: Termination,
}

impl CaseReport {
    fn from_case(case: &TestCase, termination: Termination) -> Self {
        Self {
            name: case.name().to_string(),
            weight: case.weight(),
            checked: case.checked(),
            passed: case.passed(),
            termination,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.passed == self.checked && !matches!(self.termination, Termination::Panicked { .. })
    }

    pub fn status(&self) -> Status {
        match self.termination {
            Termination::Panicked { .. } => Status::Panicked,
            Termination::Aborted => Status::Aborted,
            Termination::Completed if self.passed == self.checked => Status::Pass,
            Termination::Completed => Status::Fail,
        }
    }

    /// Fraction of checks passed, or `None` for a case with no checks.
    pub fn ratio(&self) -> Option<f64> {
        (self.checked > 0).then(|| self.passed as f64 / self.checked as f64)
    }
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cases: Vec<CaseReport>,
    pub checked: u64,
    pub passed: u64,
    pub weighted_score: Option<f64>,
}

impl RunSummary {
    pub fn from_reports(cases: Vec<CaseReport>) -> Self {
        let checked = cases.iter().map(|case| case.checked).sum();
        let passed = cases.iter().map(|case| case.passed).sum();
        let weighted_score = weighted_score(&cases);
        Self {
            cases,
            checked,
            passed,
            weighted_score,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(CaseReport::succeeded)
    }

    /// Process exit status: `0` when every case succeeded, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// Σ(weight × passed/checked) / Σ(weight), over cases that made at least one check.
pub fn weighted_score(cases: &[CaseReport]) -> Option<f64> {
    let (score, weight) = cases
        .iter()
        .filter_map(|case| case.ratio().map(|ratio| (case.weight * ratio, case.weight)))
        .fold((0.0, 0.0), |(score, weight), (s, w)| (score + s, weight + w));
    (weight != 0.0).then(|| score / weight)
}

// =============================================================================
// DRIVER
// =============================================================================

/// Executes test cases in name order and reports on them.
pub struct Driver {
    config: HarnessConfig,
    reporter: Rc<Reporter>,
    registry: Option<Registry>,
}

impl Driver {
    /// A driver over the global registry, printing to stdout.
    pub fn new(config: HarnessConfig) -> Self {
        let reporter = Reporter::stdout(config.color.choice());
        Self {
            config,
            reporter: Rc::new(reporter),
            registry: None,
        }
    }

    /// Replaces the display sink.
    pub fn with_display(mut self, display: Box<dyn WriteColor>) -> Self {
        self.reporter = Rc::new(Reporter::new(display));
        self
    }

    /// Runs the cases of `registry` instead of the global one.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Opens the log sink, if one is configured. Never fails the run.
    pub fn setup(&mut self) {
        let Some(path) = self.config.log_path.as_deref() else {
            return;
        };
        match LogSink::open(path) {
            Ok(sink) => self.reporter.attach_log(sink),
            Err(error) => {
                tracing::warn!(%error, "continuing without a log file");
                self.reporter.line(&format!("warning: {}", error));
            }
        }
    }

    /// Runs every case once, prints the summary and returns it.
    pub fn execute(&mut self) -> RunSummary {
        let mut cases = self.snapshot();
        cases.sort();
        tracing::debug!(cases = cases.len(), "running test cases");
        let diagnostics_before = self.reporter.diagnostic_count();

        let reports = cases.iter().map(|case| self.run_case(case)).collect();
        let summary = RunSummary::from_reports(reports);
        tracing::debug!(
            checked = summary.checked,
            passed = summary.passed,
            diagnostics = self.reporter.diagnostic_count() - diagnostics_before,
            "test run finished"
        );
        self.print_aggregate(&summary);
        self.reporter.flush();
        summary
    }

    fn snapshot(&self) -> Vec<Arc<TestCase>> {
        match &self.registry {
            Some(registry) => registry.all().to_vec(),
            None => Registry::global().all().to_vec(),
        }
    }

    fn run_case(&self, case: &Arc<TestCase>) -> CaseReport {
        case.reset();
        tracing::debug!(case = case.name(), "starting test case");

        let outcome = {
            let _active = locator::activate(Current::new(
                Arc::clone(case),
                Rc::clone(&self.reporter),
                self.config.expect_error,
            ));
            let _capture = panic::capture();
            panic::catch(|| case.execute())
        };

        let termination = match outcome {
            Ok(()) if case.aborted() => Termination::Aborted,
            Ok(()) => Termination::Completed,
            Err(panicked) => self.report_panic(case, panicked),
        };
        let report = CaseReport::from_case(case, termination);
        tracing::debug!(
            case = case.name(),
            checked = report.checked,
            passed = report.passed,
            "finished test case"
        );
        self.reporter.status_line(
            &format!(
                "\"{}\": {}/{} passed, weight {}",
                report.name,
                report.passed,
                report.checked,
                format_real(report.weight)
            ),
            report.status(),
        );
        report
    }

    /// Counts the panic as one failed check and reports it against the case.
    fn report_panic(&self, case: &TestCase, panicked: CapturedPanic) -> Termination {
        case.record_checked();
        let failure = Failure::Panicked {
            case: case.name().to_string(),
            message: panicked.message.clone(),
        };
        match &panicked.location {
            Some((file, line)) => self.reporter.report_at(file, *line, &failure),
            None => self.reporter.report_at(case.name(), 0, &failure),
        }
        Termination::Panicked {
            message: panicked.message,
        }
    }

    fn print_aggregate(&self, summary: &RunSummary) {
        let score = match summary.weighted_score {
            Some(score) => format!("{:.2}%", score * 100.0),
            None => "n/a".to_string(),
        };
        self.reporter.line(&format!(
            "{} cases, {}/{} checks passed, weighted score {}",
            summary.cases.len(),
            summary.passed,
            summary.checked,
            score
        ));
    }
}
