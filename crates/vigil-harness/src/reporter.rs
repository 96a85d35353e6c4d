//! Test reporter - display test results

use crate::outcome::{Outcome, RunReport, TestRun};
use colored::*;
use serde_json::json;
use std::io::{self, Write};

/// Output styling owned by one reporter.
///
/// Colour is decided per reporter instead of through `colored`'s
/// process-wide override, so reporters never race on shared state.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    fn paint(&self, text: &str, apply: impl FnOnce(&str) -> ColoredString) -> String {
        if self.color {
            apply(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        self.paint(text, |t| t.red().bold())
    }

    fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.green().bold())
    }

    fn warning(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    fn detail(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Test reporter with output configuration
pub struct TestReporter {
    /// Show a line for passing tests too
    verbose: bool,
    style: Style,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    /// Create a new test reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            style: Style::default(),
        }
    }

    /// Enable or disable coloured output
    pub fn with_color(mut self, color: bool) -> Self {
        self.style = Style::new(color);
        self
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Write a human-readable report and return the number of failed tests
    pub fn report<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<usize> {
        let total = report.total();
        writeln!(
            out,
            "{} tests run in {}ms",
            total,
            report.elapsed().as_millis()
        )?;
        writeln!(out, "Discovered {} tests", total)?;

        for run in report.runs() {
            self.write_run(run, out)?;
        }

        self.write_summary(report, out)?;
        Ok(report.failed())
    }

    /// Print a single test result
    fn write_run<W: Write>(&self, run: &TestRun, out: &mut W) -> io::Result<()> {
        let name = run.descriptor().name();
        match run.outcome() {
            Outcome::Failure { message, trace } => {
                writeln!(out, "{}", self.style.failure(name))?;
                for line in message.lines() {
                    writeln!(out, "\t{}", line)?;
                }
                for line in trace.lines() {
                    writeln!(out, "\t{}", self.style.detail(line))?;
                }
            }
            Outcome::Success => {
                if self.verbose {
                    writeln!(
                        out,
                        "{} {} ({:.2?})",
                        self.style.success("PASS"),
                        name,
                        run.duration()
                    )?;
                }
            }
            Outcome::Pending => {
                writeln!(out, "{}", self.style.warning(&format!("{} inconclusive", name)))?;
            }
        }
        Ok(())
    }

    /// Print summary statistics
    fn write_summary<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<()> {
        let total = report.total();
        let failed = report.failed();

        let passed = format!("Passed: {}/{}", report.passed(), total);
        if failed > 0 {
            writeln!(out, "{}", self.style.failure(&passed))?;
            writeln!(out, "{}", self.style.failure(&format!("Failed: {}/{}", failed, total)))?;
        } else {
            writeln!(out, "{}", self.style.success(&passed))?;
        }
        Ok(())
    }

    /// Write the report as one JSON document and return the failure count
    pub fn report_json<W: Write>(&self, report: &RunReport, out: &mut W) -> io::Result<usize> {
        let results: Vec<_> = report
            .runs()
            .iter()
            .map(|run| {
                let (message, trace) = match run.outcome() {
                    Outcome::Failure { message, trace } => (Some(message), Some(trace)),
                    _ => (None, None),
                };
                json!({
                    "name": run.descriptor().name(),
                    "type": run.descriptor().type_name(),
                    "method": run.descriptor().method_name(),
                    "status": run.outcome().label(),
                    "duration_ms": run.duration().as_millis() as u64,
                    "message": message,
                    "trace": trace,
                })
            })
            .collect();

        let document = json!({
            "tests": report.total(),
            "passed": report.passed(),
            "failed": report.failed(),
            "elapsed_ms": report.elapsed().as_millis() as u64,
            "results": results,
        });
        writeln!(out, "{}", document)?;
        Ok(report.failed())
    }
}
