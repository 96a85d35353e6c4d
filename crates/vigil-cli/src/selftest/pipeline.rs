//! Harness pipeline self-tests
//!
//! Each test drives a nested registry through discovery, execution and
//! reporting, then checks what the run recorded.

use vigil_harness::{assert, Outcome, Registry, RunReport, Suite, TestReporter, TestRunner};

pub fn register(registry: &mut Registry) {
    registry.register(
        Suite::<PipelineTests>::new()
            .test("failure_count_is_exit_status", PipelineTests::failure_count_is_exit_status)
            .test("construction_failure_is_reported", PipelineTests::construction_failure_is_reported)
            .test("panic_is_reported", PipelineTests::panic_is_reported)
            .test("bad_suite_is_skipped", PipelineTests::bad_suite_is_skipped)
            .test("parallel_run_settles_every_test", PipelineTests::parallel_run_settles_every_test)
            .test("report_summarizes_counts", PipelineTests::report_summarizes_counts),
    );
}

#[derive(Default)]
struct Sample;

impl Sample {
    fn passes(&mut self) -> anyhow::Result<()> {
        assert::is_true(true, "")?;
        Ok(())
    }

    fn fails(&mut self) -> anyhow::Result<()> {
        assert::equal(1, 2, "math")?;
        Ok(())
    }

    fn panics(&mut self) -> anyhow::Result<()> {
        panic!("exploded")
    }
}

struct Unbuildable;

impl Unbuildable {
    fn build() -> anyhow::Result<Self> {
        anyhow::bail!("connection refused")
    }

    fn never_runs(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct PipelineTests {
    inner: Registry,
}

impl PipelineTests {
    fn run(&self) -> anyhow::Result<RunReport> {
        Ok(TestRunner::new().run(&self.inner.discover())?)
    }

    fn only_outcome(report: &RunReport) -> anyhow::Result<&Outcome> {
        assert::equal(report.total(), 1, "inner tests")?;
        Ok(report.runs()[0].outcome())
    }

    fn failure_count_is_exit_status(&mut self) -> anyhow::Result<()> {
        self.inner
            .register(Suite::<Sample>::new().test("passes", Sample::passes).test("fails", Sample::fails));

        let report = self.run()?;
        assert::equal(report.passed(), 1, "passed")?;
        assert::equal(report.failed(), 1, "failed")?;
        assert::equal(report.exit_code(), 1, "exit code")?;
        Ok(())
    }

    fn construction_failure_is_reported(&mut self) -> anyhow::Result<()> {
        self.inner
            .register(Suite::with_factory(Unbuildable::build).test("never_runs", Unbuildable::never_runs));

        let report = self.run()?;
        match Self::only_outcome(&report)? {
            Outcome::Failure { message, trace } => {
                assert::equal(message.as_str(), "connection refused", "message")?;
                assert::is_true(trace.ends_with("while constructing Unbuildable"), "trace")?;
            }
            other => anyhow::bail!("expected a failure, got {:?}", other),
        }
        Ok(())
    }

    fn panic_is_reported(&mut self) -> anyhow::Result<()> {
        self.inner.register(Suite::<Sample>::new().test("panics", Sample::panics));

        let report = self.run()?;
        let expected = Outcome::failure(
            "exploded",
            "panicked during invocation\nwhile running Sample › panics",
        );
        assert::equal(Self::only_outcome(&report)?, &expected, "outcome")?;
        Ok(())
    }

    fn bad_suite_is_skipped(&mut self) -> anyhow::Result<()> {
        self.inner
            .register(Suite::<Sample>::new().test("twice", Sample::passes).test("twice", Sample::fails))
            .register(Suite::<Sample>::new().test("passes", Sample::passes));

        let discovery = self.inner.discover();
        assert::equal(discovery.skipped.len(), 1, "skipped suites")?;
        assert::equal(discovery.len(), 1, "discovered tests")?;
        Ok(())
    }

    fn parallel_run_settles_every_test(&mut self) -> anyhow::Result<()> {
        let mut suite = Suite::<Sample>::new();
        for name in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            suite = suite.test(name, Sample::passes);
        }
        self.inner.register(suite.test("fails", Sample::fails));

        let report = TestRunner::new()
            .with_parallel(true)
            .with_workers(4)
            .run(&self.inner.discover())?;
        assert::is_true(report.is_complete(), "no pending outcomes")?;
        assert::equal(report.passed(), 8, "passed")?;
        assert::equal(report.failed(), 1, "failed")?;
        Ok(())
    }

    fn report_summarizes_counts(&mut self) -> anyhow::Result<()> {
        self.inner
            .register(Suite::<Sample>::new().test("passes", Sample::passes).test("fails", Sample::fails));

        let report = self.run()?;
        let mut out = Vec::new();
        let failed = TestReporter::new(false)
            .with_color(false)
            .report(&report, &mut out)?;
        let text = String::from_utf8(out)?;

        assert::equal(failed, 1, "reported failures")?;
        assert::is_true(text.contains("Sample › fails\n\tmath: Expected: `2` Got: `1`\n"), "failure block")?;
        assert::is_true(text.ends_with("Passed: 1/2\nFailed: 1/2\n"), "summary")?;
        Ok(())
    }
}
