//! Outcome model - the result of running discovered tests

use crate::discovery::TestDescriptor;
use crate::error::HarnessError;
use std::time::Duration;

/// Classification of a single test execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Not run yet
    #[default]
    Pending,
    /// Test body returned without raising
    Success,
    /// Construction or invocation raised an error
    Failure { message: String, trace: String },
}

impl Outcome {
    /// Build a failure outcome
    pub fn failure(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
            trace: trace.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Short status word used in machine-readable output
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Success => "passed",
            Outcome::Failure { .. } => "failed",
        }
    }
}

/// One descriptor paired with its outcome
#[derive(Debug, Clone)]
pub struct TestRun {
    descriptor: TestDescriptor,
    outcome: Outcome,
    duration: Duration,
}

impl TestRun {
    /// A run that has not been executed yet
    pub fn pending(descriptor: TestDescriptor) -> Self {
        Self {
            descriptor,
            outcome: Outcome::Pending,
            duration: Duration::ZERO,
        }
    }

    pub fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Wall-clock time spent constructing and invoking this test
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Record the terminal outcome.
    ///
    /// A run leaves `Pending` exactly once; a second call is rejected.
    pub fn settle(&mut self, outcome: Outcome, duration: Duration) -> Result<(), HarnessError> {
        if !self.outcome.is_pending() {
            return Err(HarnessError::AlreadySettled(
                self.descriptor.name().to_string(),
            ));
        }
        self.outcome = outcome;
        self.duration = duration;
        Ok(())
    }
}

/// Largest exit status [`RunReport::exit_code`] reports.
///
/// POSIX keeps only the low 8 bits of a status, so larger failure counts
/// saturate here instead of wrapping to a passing 0.
pub const MAX_EXIT_CODE: i32 = 255;

/// Ordered results of one harness invocation
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    runs: Vec<TestRun>,
    elapsed: Duration,
}

impl RunReport {
    pub fn new(runs: Vec<TestRun>, elapsed: Duration) -> Self {
        Self { runs, elapsed }
    }

    /// Runs in discovery order
    pub fn runs(&self) -> &[TestRun] {
        &self.runs
    }

    /// Wall-clock time for the whole run
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total(&self) -> usize {
        self.runs.len()
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::is_success)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    pub fn pending(&self) -> usize {
        self.count(Outcome::is_pending)
    }

    /// True when every run has a terminal outcome
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestRun> {
        self.runs.iter().filter(|r| r.outcome.is_failure())
    }

    /// Process exit status: the number of failed tests, capped at
    /// [`MAX_EXIT_CODE`]
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.failed()).map_or(MAX_EXIT_CODE, |failed| failed.min(MAX_EXIT_CODE))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.runs.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Registry, Suite};

    #[derive(Default)]
    struct Probe;

    impl Probe {
        fn noop(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn descriptors(count: usize) -> Vec<TestDescriptor> {
        const NAMES: [&str; 4] = ["first", "second", "third", "fourth"];
        let mut suite = Suite::<Probe>::new();
        for &name in &NAMES[..count] {
            suite = suite.test(name, Probe::noop);
        }
        let mut registry = Registry::new();
        registry.register(suite);
        registry.discover().tests
    }

    #[test]
    fn test_run_starts_pending() {
        let run = TestRun::pending(descriptors(1).remove(0));
        assert!(run.outcome().is_pending());
        assert_eq!(run.duration(), Duration::ZERO);
    }

    #[test]
    fn test_settle_is_terminal() {
        let mut run = TestRun::pending(descriptors(1).remove(0));
        run.settle(Outcome::Success, Duration::from_millis(3))
            .unwrap();
        assert!(run.outcome().is_success());

        let err = run
            .settle(Outcome::failure("late", ""), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, HarnessError::AlreadySettled(name) if name == "Probe › first"));
        assert!(run.outcome().is_success());
        assert_eq!(run.duration(), Duration::from_millis(3));
    }

    #[test]
    fn test_report_counts() {
        let mut runs: Vec<_> = descriptors(4).into_iter().map(TestRun::pending).collect();
        runs[0].settle(Outcome::Success, Duration::ZERO).unwrap();
        runs[1].settle(Outcome::failure("boom", "at x"), Duration::ZERO).unwrap();
        runs[2].settle(Outcome::Success, Duration::ZERO).unwrap();

        let report = RunReport::new(runs, Duration::from_millis(12));
        assert_eq!(report.total(), 4);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.pending(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_exit_code_saturates() {
        let descriptor = descriptors(1).remove(0);
        let report = |failures: usize| {
            let runs = (0..failures)
                .map(|_| {
                    let mut run = TestRun::pending(descriptor.clone());
                    run.settle(Outcome::failure("boom", ""), Duration::ZERO).unwrap();
                    run
                })
                .collect();
            RunReport::new(runs, Duration::ZERO)
        };

        assert_eq!(report(255).exit_code(), 255);
        assert_eq!(report(256).exit_code(), MAX_EXIT_CODE);
        assert_eq!(report(300).exit_code(), MAX_EXIT_CODE);
        assert_eq!(report(300).failed(), 300);
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = RunReport::default();
        assert!(report.is_complete());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Pending.label(), "pending");
        assert_eq!(Outcome::Success.label(), "passed");
        assert_eq!(Outcome::failure("m", "t").label(), "failed");
    }
}
