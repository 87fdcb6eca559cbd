//! Per-trial scratch resources held by an oracle.
//!
//! Oracles that talk to an external solver may need temporary files or
//! channels. The search acquires one scratch value per trial, hands it to the
//! oracle, then releases it on every exit path. Release failures are reported
//! but never invalidate a solution.

use thiserror::Error;

/// A scratch resource that could not be released.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("failed to release {resource}: {message}")]
pub struct ResourceCleanupError {
    /// Human-readable name of the resource, such as a file path.
    pub resource: String,
    /// Description of the failure.
    pub message: String,
}

impl ResourceCleanupError {
    /// Construct a cleanup error.
    pub fn new(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

/// Something an oracle holds for the duration of one trial.
pub trait ScratchResource {
    /// Release the resource.
    ///
    /// Implementations must attempt every part of the release even when an
    /// earlier part fails.
    ///
    /// # Errors
    ///
    /// Returns every failure encountered.
    fn release(self) -> Result<(), Vec<ResourceCleanupError>>;
}

/// Oracles without external state use the unit scratch.
impl ScratchResource for () {
    fn release(self) -> Result<(), Vec<ResourceCleanupError>> {
        Ok(())
    }
}

/// Release every resource, collecting all failures.
///
/// # Errors
///
/// Returns the concatenated failures when any release fails.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::{ResourceCleanupError, ScratchResource, release_all};
///
/// struct Leaky(&'static str);
///
/// impl ScratchResource for Leaky {
///     fn release(self) -> Result<(), Vec<ResourceCleanupError>> {
///         Err(vec![ResourceCleanupError::new(self.0, "busy")])
///     }
/// }
///
/// let failures = release_all([Leaky("a"), Leaky("b")]).unwrap_err();
/// assert_eq!(failures.len(), 2);
/// ```
pub fn release_all<I>(resources: I) -> Result<(), Vec<ResourceCleanupError>>
where
    I: IntoIterator,
    I::Item: ScratchResource,
{
    let failures: Vec<ResourceCleanupError> = resources
        .into_iter()
        .filter_map(|resource| resource.release().err())
        .flatten()
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
