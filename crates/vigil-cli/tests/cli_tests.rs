//! CLI integration tests
//!
//! Tests the vigil binary end to end:
//! - Host mode without arguments
//! - Self-test runs and their exit status
//! - Argument errors
//! - Environment variable support

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn vigil_cmd() -> Command {
    let mut cmd = Command::cargo_bin("vigil").unwrap();
    for var in ["VIGIL_PARALLEL", "VIGIL_WORKERS", "VIGIL_JSON", "VIGIL_NO_COLOR"] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

// ══════════════════════════════════════════════════════════════════════════════
// HOST MODE
// ══════════════════════════════════════════════════════════════════════════════

mod host {
    use super::*;

    #[test]
    fn test_no_arguments_prints_greeting() {
        vigil_cmd()
            .assert()
            .success()
            .stdout(predicate::str::diff("Hello World!\n"));
    }

    #[test]
    fn test_help_shows_examples_and_environment() {
        vigil_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("EXAMPLES"))
            .stdout(predicate::str::contains("--selftest"))
            .stdout(predicate::str::contains("VIGIL_PARALLEL"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// SELFTEST RUNS
// ══════════════════════════════════════════════════════════════════════════════

mod selftest {
    use super::*;

    #[test]
    fn test_selftest_passes() {
        vigil_cmd()
            .arg("--selftest")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Discovered"))
            .stdout(predicate::str::contains("Passed:"))
            .stdout(predicate::str::contains("Failed:").not());
    }

    #[test]
    fn test_caught_panics_stay_off_stderr() {
        vigil_cmd()
            .arg("--selftest")
            .assert()
            .code(0)
            .stderr(predicate::str::contains("panicked").not());
    }

    #[test]
    fn test_selftest_parallel() {
        vigil_cmd()
            .args(["--selftest", "--parallel", "--workers", "4"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Passed:"));
    }

    #[test]
    fn test_selftest_filter_and_verbose() {
        vigil_cmd()
            .args(["--selftest", "--filter", "PollingTests", "--verbose"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Discovered 4 tests"))
            .stdout(predicate::str::contains("PASS PollingTests › waits_for_background_work"))
            .stdout(predicate::str::contains("AssertionTests").not());
    }

    #[test]
    fn test_selftest_filter_matching_nothing() {
        vigil_cmd()
            .args(["--selftest", "--filter", "no-such-test"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Passed: 0/0"));
    }

    #[test]
    fn test_selftest_json() {
        vigil_cmd()
            .args(["--selftest", "--json"])
            .assert()
            .code(0)
            .stdout(predicate::str::starts_with("{"))
            .stdout(predicate::str::contains("\"failed\":0"));
    }

    #[test]
    fn test_selftest_json_from_env() {
        vigil_cmd()
            .arg("--selftest")
            .env("VIGIL_JSON", "1")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\"results\""));
    }

    #[test]
    fn test_selftest_no_color_output() {
        vigil_cmd()
            .args(["--selftest", "--no-color"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("\u{1b}[").not());
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// ARGUMENT ERRORS
// ══════════════════════════════════════════════════════════════════════════════

mod argument_errors {
    use super::*;

    #[test]
    fn test_unknown_flag_is_named() {
        let assert = vigil_cmd()
            .arg("--bogus")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Unknown argument: --bogus"));
        #[cfg(unix)]
        assert.code(255);
    }

    #[test]
    fn test_unknown_flag_alongside_selftest() {
        vigil_cmd()
            .args(["--selftest", "--frobnicate"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Unknown argument: --frobnicate"));
    }

    #[test]
    fn test_invalid_worker_count() {
        vigil_cmd()
            .args(["--selftest", "--parallel", "--workers", "lots"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("lots"));
    }
}
