//! Harness error types
//!
//! Assertion failures live in [`crate::assert::CheckError`]; the types here
//! cover faults of the harness itself.

use thiserror::Error;

/// A suite that could not be expanded into test descriptors.
///
/// Discovery skips the offending suite and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("test registered with an empty name")]
    EmptyName,

    #[error("test '{0}' registered more than once")]
    DuplicateName(String),
}

/// Faults that prevent the harness from producing a meaningful report.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Run incomplete: {pending} of {total} tests never produced an outcome")]
    Incomplete { pending: usize, total: usize },

    #[error("Outcome for '{0}' was already settled")]
    AlreadySettled(String),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
