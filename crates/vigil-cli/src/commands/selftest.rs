//! Selftest command - run the built-in test suites

use crate::selftest;
use colored::*;
use std::io;
use vigil_harness::{HarnessError, Registry, TestReporter, TestRunner};

/// Arguments for the selftest command
#[derive(Debug, Clone, Default)]
pub struct SelftestArgs {
    /// Filter tests by display-name pattern
    pub pattern: Option<String>,
    /// Run tests on a worker pool
    pub parallel: bool,
    /// Worker pool size (defaults to one per core)
    pub workers: Option<usize>,
    /// Sort tests by display name before running
    pub sort: bool,
    /// Verbose output (show passing tests)
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Output in JSON format
    pub json: bool,
}

/// Run the built-in suites; returns the exit status (failure count)
pub fn run(args: SelftestArgs) -> Result<i32, HarnessError> {
    let mut registry = Registry::new();
    selftest::register(&mut registry);
    run_registry(&registry, &args, &mut io::stdout().lock())
}

/// Discover, run and report the suites in `registry`
pub fn run_registry<W: io::Write>(
    registry: &Registry,
    args: &SelftestArgs,
    out: &mut W,
) -> Result<i32, HarnessError> {
    let mut discovery = registry.discover();

    // Report suites that could not be enumerated
    if !discovery.skipped.is_empty() && !args.json {
        let style = |s: &str| if args.no_color { s.normal() } else { s.yellow().bold() };
        eprintln!("{}", style("Skipped suites:"));
        for (suite, error) in &discovery.skipped {
            eprintln!("  {} {}: {}", style("●"), suite, error);
        }
    }

    // Apply filter if provided
    if let Some(pattern) = &args.pattern {
        discovery = discovery.filter(pattern);
    }
    if args.sort {
        discovery.sort_by_name();
    }

    let runner = TestRunner::new()
        .with_parallel(args.parallel)
        .with_workers(args.workers.unwrap_or(0));
    let report = runner.run(&discovery)?;

    // Report only after every worker has joined
    let reporter = TestReporter::new(args.verbose).with_color(!args.no_color);
    if args.json {
        reporter.report_json(&report, out)?;
    } else {
        reporter.report(&report, out)?;
    }

    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_harness::{assert, Suite};

    #[derive(Default)]
    struct Widgets;

    impl Widgets {
        fn counts(&mut self) -> anyhow::Result<()> {
            assert::equal(2 + 2, 4, "count")?;
            Ok(())
        }

        fn miscounts(&mut self) -> anyhow::Result<()> {
            assert::equal(2 + 2, 5, "count")?;
            Ok(())
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            Suite::<Widgets>::new()
                .test("miscounts", Widgets::miscounts)
                .test("counts", Widgets::counts),
        );
        registry
    }

    fn plain() -> SelftestArgs {
        SelftestArgs {
            no_color: true,
            ..Default::default()
        }
    }

    fn capture(args: &SelftestArgs) -> (i32, String) {
        let mut out = Vec::new();
        let code = run_registry(&registry(), args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_code_is_failure_count() {
        let (code, text) = capture(&plain());
        assert_eq!(code, 1);
        assert!(text.contains("Widgets › miscounts\n\tcount: Expected: `5` Got: `4`\n"));
        assert!(text.contains("Failed: 1/2"));
    }

    #[test]
    fn test_filter_limits_run() {
        let args = SelftestArgs {
            pattern: Some("› counts".to_string()),
            ..plain()
        };
        let (code, text) = capture(&args);
        assert_eq!(code, 0);
        assert!(text.contains("Passed: 1/1"));
    }

    #[test]
    fn test_sorted_verbose_output() {
        let args = SelftestArgs {
            sort: true,
            verbose: true,
            ..plain()
        };
        let (_, text) = capture(&args);
        let pass = text.find("PASS Widgets › counts").unwrap();
        let fail = text.find("Widgets › miscounts\n").unwrap();
        assert!(pass < fail);
    }

    #[test]
    fn test_parallel_json() {
        let args = SelftestArgs {
            parallel: true,
            workers: Some(2),
            json: true,
            ..plain()
        };
        let (code, text) = capture(&args);
        assert_eq!(code, 1);
        assert!(text.trim_start().starts_with('{'));
        assert!(text.contains("\"failed\":1"));
    }

    #[test]
    fn test_builtin_suites_pass() {
        let mut registry = Registry::new();
        selftest::register(&mut registry);

        let mut out = Vec::new();
        let code = run_registry(&registry, &plain(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(code, 0, "{}", text);
    }
}
