//! Built-in self-test suites
//!
//! Run with `vigil --selftest`. The suites exercise the assertion library,
//! polling against background work, fixture lifecycle and the harness
//! pipeline itself; every test is expected to pass.

mod assertions;
mod fixtures;
mod pipeline;
mod polling;

use vigil_harness::Registry;

/// Register every built-in suite
pub fn register(registry: &mut Registry) {
    assertions::register(registry);
    fixtures::register(registry);
    polling::register(registry);
    pipeline::register(registry);
}
