//! Assertion primitives for test bodies
//!
//! Every check returns [`CheckResult`] so test bodies propagate failures with
//! `?`. Checks are `#[track_caller]`: the failing call site becomes the
//! first line of the reported trace. An empty label drops the
//! `"{label}: "` prefix from the message.
//!
//! # API
//!
//! ## Option
//! - `is_none(value, label)` - value must be `None`
//! - `is_some(value, label)` - value must be `Some`
//!
//! ## Type
//! - `is_type::<T>(value, label)` - concrete type must be `T`
//!
//! ## Equality
//! - `equal(actual, expected, label)` - value equality
//! - `not_equal(actual, expected, label)` - values must differ
//!
//! ## Boolean
//! - `is_true(value, label)` / `is_false(value, label)`
//!
//! ## Collections
//! - `contains(collection, element, label)` - some element equals `element`
//!
//! ## Errors
//! - `throws::<E>(action, message, label)` - action fails with exactly `E`
//!
//! ## Polling
//! - `within(timeout, check)` - retry `check` every [`POLL_INTERVAL`]

use crate::runner::{catch_quietly, panic_message};
use std::any::{type_name, Any};
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::panic::Location;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Fixed delay between attempts of [`within`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a single check
pub type CheckResult = Result<(), CheckError>;

/// A violated check
#[derive(Error, Debug)]
pub enum CheckError {
    /// A condition did not hold
    #[error("{message}")]
    Failed {
        message: String,
        location: &'static Location<'static>,
    },

    /// [`within`] ran out of time; `last` is the final attempt's failure
    #[error("Assertions did not pass within {}ms: {last}", .timeout.as_millis())]
    Timeout {
        timeout: Duration,
        #[source]
        last: Box<dyn StdError + Send + Sync>,
        location: &'static Location<'static>,
    },
}

impl CheckError {
    /// Call site of the failing check
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            CheckError::Failed { location, .. } | CheckError::Timeout { location, .. } => location,
        }
    }
}

/// Runtime type information for [`is_type`].
///
/// Implemented for every `'static` type. Pass `&*boxed` rather than `&boxed`
/// when checking a `Box<dyn Reflect>`, otherwise the box itself is inspected.
pub trait Reflect: Any {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> Reflect for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

#[track_caller]
fn fail(label: &str, detail: impl fmt::Display) -> CheckError {
    let message = if label.is_empty() {
        detail.to_string()
    } else {
        format!("{}: {}", label, detail)
    };
    CheckError::Failed {
        message,
        location: Location::caller(),
    }
}

// ============================================================================
// Option assertions
// ============================================================================

/// Fails if `value` is `Some`
#[track_caller]
pub fn is_none<T: Debug>(value: &Option<T>, label: &str) -> CheckResult {
    match value {
        None => Ok(()),
        Some(_) => Err(fail(label, format!("Expected: `None` Got: `{:?}`", value))),
    }
}

/// Fails if `value` is `None`
#[track_caller]
pub fn is_some<T>(value: &Option<T>, label: &str) -> CheckResult {
    match value {
        Some(_) => Ok(()),
        None => Err(fail(label, "Expected: `Some(_)` Got: `None`")),
    }
}

// ============================================================================
// Type assertions
// ============================================================================

/// Fails unless the concrete type behind `value` is `T`
#[track_caller]
pub fn is_type<T: Any>(value: &dyn Reflect, label: &str) -> CheckResult {
    if value.as_any().is::<T>() {
        return Ok(());
    }
    Err(fail(
        label,
        format!(
            "Expected: `{}` Got: `{}`",
            type_name::<T>(),
            value.type_name()
        ),
    ))
}

// ============================================================================
// Equality assertions
// ============================================================================

/// Fails unless `actual == expected`
#[track_caller]
pub fn equal<T: PartialEq + Debug>(actual: T, expected: T, label: &str) -> CheckResult {
    if actual == expected {
        return Ok(());
    }
    Err(fail(
        label,
        format!("Expected: `{:?}` Got: `{:?}`", expected, actual),
    ))
}

/// Fails if `actual == expected`
#[track_caller]
pub fn not_equal<T: PartialEq + Debug>(actual: T, expected: T, label: &str) -> CheckResult {
    if actual != expected {
        return Ok(());
    }
    Err(fail(
        label,
        format!("Expected a value other than `{:?}`", expected),
    ))
}

// ============================================================================
// Boolean assertions
// ============================================================================

#[track_caller]
pub fn is_true(value: bool, label: &str) -> CheckResult {
    if value {
        return Ok(());
    }
    Err(fail(label, "Expected: `true` Got: `false`"))
}

#[track_caller]
pub fn is_false(value: bool, label: &str) -> CheckResult {
    if !value {
        return Ok(());
    }
    Err(fail(label, "Expected: `false` Got: `true`"))
}

// ============================================================================
// Collection assertions
// ============================================================================

/// Fails if either argument is missing or no element equals `element`.
///
/// `None` stands in for an absent collection or element.
#[track_caller]
pub fn contains<T: PartialEq + Debug>(
    collection: Option<&[T]>,
    element: Option<&T>,
    label: &str,
) -> CheckResult {
    let collection = match collection {
        Some(collection) => collection,
        None => return Err(fail(label, "Collection cannot be null")),
    };
    let element = match element {
        Some(element) => element,
        None => return Err(fail(label, "Element cannot be null")),
    };

    if collection.iter().any(|e| e == element) {
        return Ok(());
    }
    Err(fail(
        label,
        format!(
            "Expected to find `{:?}` in collection of {} but did not",
            element,
            collection.len()
        ),
    ))
}

// ============================================================================
// Error assertions
// ============================================================================

/// Run `action` and require it to fail with an `E` whose message is
/// exactly `expected_message`.
///
/// Only the outermost error counts: an `E` wrapped in `.context(..)` is a
/// different error. Returning `Ok`, failing with another type or message,
/// or panicking all fail this check.
#[track_caller]
pub fn throws<E>(
    action: impl FnOnce() -> anyhow::Result<()>,
    expected_message: &str,
    label: &str,
) -> CheckResult
where
    E: StdError + Send + Sync + 'static,
{
    let expected = type_name::<E>();

    let err = match catch_quietly(action) {
        Ok(Ok(())) => {
            return Err(fail(
                label,
                format!(
                    "Expected: `{}` with message `{}` Got: no error",
                    expected, expected_message
                ),
            ))
        }
        Ok(Err(err)) => err,
        Err(payload) => {
            let message = panic_message(payload).unwrap_or_default();
            return Err(fail(
                label,
                format!("Expected: `{}` Got: panic `{}`", expected, message),
            ));
        }
    };

    let outermost = err.chain().next().and_then(|e| e.downcast_ref::<E>());
    match outermost {
        Some(raised) if raised.to_string() == expected_message => Ok(()),
        Some(raised) => Err(fail(
            label,
            format!(
                "Expected: `{}` with message `{}` Got: message `{}`",
                expected, expected_message, raised
            ),
        )),
        None => Err(fail(
            label,
            format!("Expected: `{}` Got: different error `{}`", expected, err),
        )),
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Retry `check` until it passes or `timeout` elapses.
///
/// `check` runs at least once, then every [`POLL_INTERVAL`]; the last sleep
/// is clipped so one attempt always happens at the deadline. Panics inside
/// `check` count as failed attempts. On expiry the returned
/// [`CheckError::Timeout`] carries the last failure.
#[track_caller]
pub fn within<E>(timeout: Duration, mut check: impl FnMut() -> Result<(), E>) -> CheckResult
where
    E: Into<anyhow::Error>,
{
    let location = Location::caller();
    // No deadline when the timeout is too large to represent
    let deadline = Instant::now().checked_add(timeout);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let last: anyhow::Error = match catch_quietly(&mut check) {
            Ok(Ok(())) => {
                trace!(attempts, "polled check passed");
                return Ok(());
            }
            Ok(Err(err)) => err.into(),
            Err(payload) => anyhow::anyhow!(
                "check panicked: {}",
                panic_message(payload).unwrap_or_default()
            ),
        };

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                trace!(attempts, "polled check timed out");
                return Err(CheckError::Timeout {
                    timeout,
                    last: last.into(),
                    location,
                });
            }
            Some(deadline) => POLL_INTERVAL.min(deadline - now),
            None => POLL_INTERVAL,
        };
        thread::sleep(pause);
    }
}
