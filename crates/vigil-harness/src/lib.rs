//! In-process test harness for vigil
//!
//! Provides test discovery, execution and reporting for code that lives in
//! the same binary as its tests. The pieces run in a fixed pipeline:
//!
//! 1. [`Registry::discover`] expands registered [`Suite`]s into
//!    [`TestDescriptor`]s without running any test code.
//! 2. [`TestRunner::run`] builds a fresh fixture per descriptor, invokes the
//!    test method and records an [`Outcome`] in a [`RunReport`].
//! 3. [`TestReporter`] prints the report; the failure count is the process
//!    exit status.
//!
//! Test bodies use the primitives in [`assert`] and propagate failures with
//! `?`.
//!
//! # Example
//!
//! ```
//! use vigil_harness::{assert, Registry, Suite, TestReporter, TestRunner};
//!
//! #[derive(Default)]
//! struct MathTests;
//!
//! impl MathTests {
//!     fn adds(&mut self) -> anyhow::Result<()> {
//!         assert::equal(1 + 1, 2, "sum")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(Suite::<MathTests>::new().test("adds", MathTests::adds));
//!
//! let report = TestRunner::new().run(&registry.discover()).unwrap();
//! let failed = TestReporter::new(false)
//!     .report(&report, &mut std::io::sink())
//!     .unwrap();
//! assert_eq!(failed, 0);
//! ```

pub mod assert;
pub mod discovery;
pub mod error;
pub mod outcome;
pub mod reporter;
pub mod runner;

pub use assert::{CheckError, CheckResult, Reflect, POLL_INTERVAL};
pub use discovery::{Discovery, Registry, Suite, TestDescriptor};
pub use error::{DiscoveryError, HarnessError};
pub use outcome::{Outcome, RunReport, TestRun, MAX_EXIT_CODE};
pub use reporter::{Style, TestReporter};
pub use runner::{Cause, Fault, Stage, TestRunner};
