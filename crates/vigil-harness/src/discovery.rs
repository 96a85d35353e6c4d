//! Test discovery - find registered test methods
//!
//! Rust has no runtime method scanning, so the test marker is an explicit
//! registration: a [`Suite`] names the owning type, how to construct it, and
//! which of its methods are tests. The [`Registry`] is append-only and
//! [`Registry::discover`] expands every suite into [`TestDescriptor`]s
//! without executing any test code.

use crate::error::DiscoveryError;
use crate::runner::{catch_quietly, Fault, Stage};
use std::any::type_name;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// No-argument constructor for a fixture type
pub type Factory<T> = fn() -> anyhow::Result<T>;

/// A test method: takes only the fixture, returns nothing meaningful
pub type TestMethod<T> = fn(&mut T) -> anyhow::Result<()>;

type Invoke = dyn Fn() -> Result<(), Fault> + Send + Sync;

/// A discovered test
///
/// Cheap to clone; the invocation path is shared.
#[derive(Clone)]
pub struct TestDescriptor {
    type_name: &'static str,
    method_name: &'static str,
    name: String,
    invoke: Arc<Invoke>,
}

impl TestDescriptor {
    /// Short name of the owning type (e.g., "StoreTests")
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Name the method was registered under
    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// Display name: `"{TypeName} › {method}"`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct a fresh fixture and call the test method on it
    pub(crate) fn invoke(&self) -> Result<(), Fault> {
        (self.invoke)()
    }
}

impl fmt::Debug for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The test methods of one fixture type
pub struct Suite<T> {
    type_name: &'static str,
    factory: Factory<T>,
    tests: Vec<(&'static str, TestMethod<T>)>,
}

impl<T: Default + 'static> Suite<T> {
    /// Suite whose fixture is built with `T::default()`
    pub fn new() -> Self {
        Self::with_factory(|| Ok(T::default()))
    }
}

impl<T: Default + 'static> Default for Suite<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Suite<T> {
    /// Suite whose fixture is built by a fallible constructor
    pub fn with_factory(factory: Factory<T>) -> Self {
        Self {
            type_name: short_type_name(type_name::<T>()),
            factory,
            tests: Vec::new(),
        }
    }

    /// Mark `method` as a test named `name`
    pub fn test(mut self, name: &'static str, method: TestMethod<T>) -> Self {
        self.tests.push((name, method));
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    fn descriptor(&self, method_name: &'static str, method: TestMethod<T>) -> TestDescriptor {
        let factory = self.factory;
        let invoke = move || {
            let mut fixture = match catch_quietly(factory) {
                Ok(Ok(fixture)) => fixture,
                Ok(Err(err)) => return Err(Fault::raised(Stage::Construct, err)),
                Err(payload) => return Err(Fault::panicked(Stage::Construct, payload)),
            };
            match catch_quietly(|| method(&mut fixture)) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(Fault::raised(Stage::Invoke, err)),
                Err(payload) => Err(Fault::panicked(Stage::Invoke, payload)),
            }
        };

        TestDescriptor {
            type_name: self.type_name,
            method_name,
            name: format!("{} › {}", self.type_name, method_name),
            invoke: Arc::new(invoke),
        }
    }
}

/// Type-erased view of a [`Suite`]
trait Enumerate {
    fn type_name(&self) -> &'static str;
    fn enumerate(&self) -> Result<Vec<TestDescriptor>, DiscoveryError>;
}

impl<T: 'static> Enumerate for Suite<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn enumerate(&self) -> Result<Vec<TestDescriptor>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut descriptors = Vec::with_capacity(self.tests.len());

        for &(name, method) in &self.tests {
            if name.trim().is_empty() {
                return Err(DiscoveryError::EmptyName);
            }
            if !seen.insert(name) {
                return Err(DiscoveryError::DuplicateName(name.to_string()));
            }
            descriptors.push(self.descriptor(name, method));
        }

        Ok(descriptors)
    }
}

/// Append-only collection of suites
#[derive(Default)]
pub struct Registry {
    suites: Vec<Box<dyn Enumerate>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suite; registration order is discovery order
    pub fn register<T: 'static>(&mut self, suite: Suite<T>) -> &mut Self {
        self.suites.push(Box::new(suite));
        self
    }

    /// Number of registered suites
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Expand all suites into descriptors.
    ///
    /// A suite that fails to enumerate is skipped whole and recorded in
    /// [`Discovery::skipped`]; it never aborts discovery of the others.
    pub fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();

        for suite in &self.suites {
            match suite.enumerate() {
                Ok(tests) => discovery.tests.extend(tests),
                Err(error) => {
                    warn!(suite = suite.type_name(), %error, "skipping suite");
                    discovery
                        .skipped
                        .push((suite.type_name().to_string(), error));
                }
            }
        }

        debug!(
            tests = discovery.tests.len(),
            skipped = discovery.skipped.len(),
            "discovery complete"
        );
        discovery
    }
}

/// Result of discovery
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Descriptors in registration order
    pub tests: Vec<TestDescriptor>,
    /// Suites that failed to enumerate
    pub skipped: Vec<(String, DiscoveryError)>,
}

impl Discovery {
    /// Keep tests whose display name contains `pattern`
    pub fn filter(&self, pattern: &str) -> Self {
        let tests = self
            .tests
            .iter()
            .filter(|t| t.name.contains(pattern))
            .cloned()
            .collect();

        Discovery {
            tests,
            skipped: self.skipped.clone(),
        }
    }

    /// Order tests by display name for a report that is stable across builds
    pub fn sort_by_name(&mut self) {
        self.tests.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }
}

/// `my_crate::tests::StoreTests<u8>` -> `StoreTests`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
