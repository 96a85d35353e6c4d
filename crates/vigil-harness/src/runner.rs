//! Test runner - execute discovered tests

use crate::assert::CheckError;
use crate::discovery::{Discovery, TestDescriptor};
use crate::error::HarnessError;
use crate::outcome::{Outcome, RunReport, TestRun};
use rayon::prelude::*;
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Where in the invocation path a fault was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the fixture
    Construct,
    /// Calling the test method
    Invoke,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Construct => write!(f, "construction"),
            Stage::Invoke => write!(f, "invocation"),
        }
    }
}

/// What a test actually raised
#[derive(Debug)]
pub enum Cause {
    /// An error returned through `Result`
    Error(anyhow::Error),
    /// A panic with a readable message
    Panic(String),
}

/// Wrapper produced by the invocation path around the real cause
#[derive(Debug)]
pub struct Fault {
    stage: Stage,
    cause: Option<Cause>,
}

impl Fault {
    pub(crate) fn raised(stage: Stage, err: anyhow::Error) -> Self {
        Self {
            stage,
            cause: Some(Cause::Error(err)),
        }
    }

    pub(crate) fn panicked(stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        Self {
            stage,
            cause: panic_message(payload).map(Cause::Panic),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Unwrap one layer. `None` when the payload carried nothing readable.
    pub fn into_cause(self) -> Option<Cause> {
        self.cause
    }
}

/// Test runner with configuration
pub struct TestRunner {
    /// Whether to run tests on a worker pool
    parallel: bool,
    /// Worker pool size; 0 lets rayon pick
    workers: usize,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    /// Create a sequential runner
    pub fn new() -> Self {
        Self {
            parallel: false,
            workers: 0,
        }
    }

    /// Set whether to run tests in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Bound the worker pool used in parallel mode
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Run every discovered test and collect the report.
    ///
    /// All workers are joined before this returns; a report with a pending
    /// outcome is never handed out.
    pub fn run(&self, discovery: &Discovery) -> Result<RunReport, HarnessError> {
        let start = Instant::now();
        info!(
            tests = discovery.len(),
            parallel = self.parallel,
            workers = self.workers,
            "starting run"
        );

        let mut runs: Vec<TestRun> = discovery.tests.iter().cloned().map(TestRun::pending).collect();

        if self.parallel {
            self.run_parallel(&mut runs)?;
        } else {
            self.run_sequential(&mut runs)?;
        }

        let report = finish(runs, start.elapsed())?;

        info!(
            passed = report.passed(),
            failed = report.failed(),
            elapsed_ms = report.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    /// Run tests one at a time in discovery order
    fn run_sequential(&self, runs: &mut [TestRun]) -> Result<(), HarnessError> {
        runs.iter_mut().try_for_each(execute)
    }

    /// Run tests on a dedicated rayon pool
    fn run_parallel(&self, runs: &mut [TestRun]) -> Result<(), HarnessError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("vigil-worker-{}", i))
            .build()?;

        pool.install(|| runs.par_iter_mut().try_for_each(execute))
    }
}

/// Build the report, refusing one that still has pending outcomes
fn finish(runs: Vec<TestRun>, elapsed: Duration) -> Result<RunReport, HarnessError> {
    let report = RunReport::new(runs, elapsed);
    if !report.is_complete() {
        return Err(HarnessError::Incomplete {
            pending: report.pending(),
            total: report.total(),
        });
    }
    Ok(report)
}

/// Execute one run and settle its outcome
fn execute(run: &mut TestRun) -> Result<(), HarnessError> {
    let (outcome, duration) = run_single_test(run.descriptor());
    run.settle(outcome, duration)
}

/// Run a single test
pub fn run_single_test(test: &TestDescriptor) -> (Outcome, Duration) {
    let start = Instant::now();
    let outcome = classify(test, test.invoke());
    let duration = start.elapsed();

    debug!(
        test = test.name(),
        outcome = outcome.label(),
        duration_ms = duration.as_millis() as u64,
        "test finished"
    );
    (outcome, duration)
}

fn classify(test: &TestDescriptor, result: Result<(), Fault>) -> Outcome {
    let fault = match result {
        Ok(()) => return Outcome::Success,
        Err(fault) => fault,
    };

    let stage = fault.stage();
    let context = match stage {
        Stage::Construct => format!("while constructing {}", test.type_name()),
        Stage::Invoke => format!("while running {}", test.name()),
    };

    match fault.into_cause() {
        Some(Cause::Error(err)) => Outcome::failure(err.to_string(), trace_of(&err, &context)),
        Some(Cause::Panic(message)) => {
            Outcome::failure(message, format!("panicked during {}\n{}", stage, context))
        }
        None => Outcome::failure(
            format!("panicked during {} with a non-string payload", stage),
            format!("no inner cause available\n{}", context),
        ),
    }
}

/// Render the diagnostic trace of a raised error
fn trace_of(err: &anyhow::Error, context: &str) -> String {
    let mut lines = Vec::new();

    if let Some(check) = err.downcast_ref::<CheckError>() {
        lines.push(format!("at {}", check.location()));
    }
    for cause in err.chain().skip(1) {
        lines.push(format!("caused by: {}", cause));
    }
    lines.push(context.to_string());

    lines.join("\n")
}

thread_local! {
    /// Nesting depth of `catch_quietly` on this thread
    static CATCHING: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

/// `catch_unwind` for harness boundaries.
///
/// Panics caught here are reported as outcomes, so they bypass the panic
/// hook that was installed before the harness. Panics on other threads, or
/// outside any harness boundary, still reach it.
pub(crate) fn catch_quietly<R>(f: impl FnOnce() -> R) -> thread::Result<R> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCHING.with(|depth| depth.get()) == 0 {
                previous(info);
            }
        }));
    });

    CATCHING.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CATCHING.with(|depth| depth.set(depth.get() - 1));
    result
}

/// Extract the message of a panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> Option<String> {
    match payload.downcast::<String>() {
        Ok(message) => Some(*message),
        Err(payload) => payload.downcast_ref::<&'static str>().map(|s| s.to_string()),
    }
}
