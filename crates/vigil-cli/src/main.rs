use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;
use vigil_harness::HarnessError;

mod commands;
mod config;
mod selftest;

/// Exit status for an unrecognized or malformed invocation
const EXIT_USAGE: i32 = -1;
/// Exit status when the harness itself cannot produce a report
const EXIT_HARNESS: i32 = -2;

/// vigil host binary with an embedded self-test harness.
///
/// Without arguments the host runs normally. `--selftest` discovers and runs
/// the built-in test suites instead; the exit status is the number of failed
/// tests.
///
/// EXAMPLES:
///     vigil --selftest                 Run all self-tests
///     vigil --selftest --parallel      Run on a worker pool
///     vigil --selftest --filter Poll   Run matching tests only
///     vigil --selftest --json          Output results as JSON
///
/// ENVIRONMENT VARIABLES:
///     VIGIL_PARALLEL    Set to '1' to run self-tests in parallel
///     VIGIL_WORKERS     Worker pool size for parallel runs
///     VIGIL_JSON        Set to '1' for JSON output by default
///     VIGIL_LOG         Log filter (default: warn)
///     NO_COLOR          Set to disable colored output
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version)]
struct Cli {
    /// Run the built-in self-test suites
    #[arg(long)]
    selftest: bool,
    /// Run tests on a worker pool
    #[arg(long, requires = "selftest")]
    parallel: bool,
    /// Worker pool size (defaults to one per core)
    #[arg(long, value_name = "N", requires = "selftest")]
    workers: Option<usize>,
    /// Only run tests whose name contains PATTERN
    #[arg(long, value_name = "PATTERN", requires = "selftest")]
    filter: Option<String>,
    /// Run tests in name order instead of registration order
    #[arg(long, requires = "selftest")]
    sort: bool,
    /// Also list passing tests
    #[arg(long, short = 'v', requires = "selftest")]
    verbose: bool,
    /// Disable colored output
    #[arg(long)]
    no_color: bool,
    /// Output results in JSON format
    #[arg(long, requires = "selftest")]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the command line, mapping misuse to [`EXIT_USAGE`]
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            ErrorKind::UnknownArgument => {
                let arg = match err.get(ContextKind::InvalidArg) {
                    Some(ContextValue::String(arg)) => arg.clone(),
                    _ => String::from("?"),
                };
                println!("Unknown argument: {}", arg);
                process::exit(EXIT_USAGE);
            }
            _ => {
                let _ = err.print();
                process::exit(EXIT_USAGE);
            }
        },
    }
}

/// Map a selftest result to the process exit status
fn exit_status(result: &Result<i32, HarnessError>) -> i32 {
    match result {
        Ok(failed) => *failed,
        Err(_) => EXIT_HARNESS,
    }
}

fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing();

    if !cli.selftest {
        println!("Hello World!");
        return Ok(());
    }

    // Command-line flags override environment variables
    let config = config::Config::from_env();
    let args = commands::selftest::SelftestArgs {
        pattern: cli.filter,
        parallel: cli.parallel || config.parallel,
        workers: cli.workers.or(config.workers),
        sort: cli.sort,
        verbose: cli.verbose,
        no_color: cli.no_color || config.no_color,
        json: cli.json || config.json,
    };
    let no_color = args.no_color;

    let result = commands::selftest::run(args);
    if let Err(err) = &result {
        let label = if no_color { "error:".normal() } else { "error:".red().bold() };
        eprintln!("{} {}", label, err);
    }
    process::exit(exit_status(&result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_is_host_mode() {
        let cli = Cli::try_parse_from(["vigil"]).unwrap();
        assert!(!cli.selftest);
    }

    #[test]
    fn test_selftest_options() {
        let cli = Cli::try_parse_from([
            "vigil",
            "--selftest",
            "--parallel",
            "--workers",
            "3",
            "--filter",
            "Polling",
            "-v",
        ])
        .unwrap();
        assert!(cli.selftest && cli.parallel && cli.verbose);
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.filter.as_deref(), Some("Polling"));
    }

    #[test]
    fn test_unknown_argument_names_flag() {
        let err = Cli::try_parse_from(["vigil", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(
            err.get(ContextKind::InvalidArg),
            Some(&ContextValue::String("--bogus".to_string()))
        );
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(exit_status(&Ok(0)), 0);
        assert_eq!(exit_status(&Ok(3)), 3);
        assert_eq!(
            exit_status(&Err(HarnessError::Incomplete { pending: 1, total: 2 })),
            EXIT_HARNESS
        );
        assert_eq!(
            exit_status(&Err(HarnessError::AlreadySettled("Widgets › counts".into()))),
            EXIT_HARNESS
        );
    }

    #[test]
    fn test_selftest_options_require_selftest() {
        let err = Cli::try_parse_from(["vigil", "--parallel"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
