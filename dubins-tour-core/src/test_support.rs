//! Test doubles for the ordering oracle.
//!
//! Available in unit tests and to downstream crates through the
//! `test-support` feature.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use geo::Coord;

use crate::matrix::CostMatrix;
use crate::oracle::{OracleError, OrderingOracle};
use crate::scratch::{ResourceCleanupError, ScratchResource};
use crate::waypoint::Waypoint;

/// Build waypoints from coordinate pairs, numbering ids from zero.
#[must_use]
pub fn waypoints_from(points: &[(f64, f64)]) -> Vec<Waypoint> {
    points
        .iter()
        .zip(0_u64..)
        .map(|(&(x, y), id)| Waypoint::new(id, Coord { x, y }))
        .collect()
}

/// Oracle answering `0, 1, …, n - 1` for every matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOracle;

impl OrderingOracle for IdentityOracle {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        Ok((0..matrix.len()).collect())
    }
}

/// Oracle returning the same answer regardless of the matrix.
///
/// Useful for feeding malformed orderings to the search.
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    answer: Vec<usize>,
}

impl FixedOracle {
    /// Oracle that always answers `answer`.
    #[must_use]
    pub const fn new(answer: Vec<usize>) -> Self {
        Self { answer }
    }
}

impl OrderingOracle for FixedOracle {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        _matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        Ok(self.answer.clone())
    }
}

/// Oracle that fails on selected calls and answers the identity otherwise.
///
/// Calls are counted from zero across the lifetime of the oracle.
#[derive(Debug)]
pub struct FailingOracle {
    error: OracleError,
    failing_calls: Option<BTreeSet<usize>>,
    calls: AtomicUsize,
}

impl FailingOracle {
    /// Fail every call with `error`.
    #[must_use]
    pub const fn always(error: OracleError) -> Self {
        Self {
            error,
            failing_calls: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail only the listed calls with `error`.
    #[must_use]
    pub fn on_calls(error: OracleError, calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            error,
            failing_calls: Some(calls.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `solve` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }
}

impl OrderingOracle for FailingOracle {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let fails = self
            .failing_calls
            .as_ref()
            .is_none_or(|calls| calls.contains(&call));
        if fails {
            return Err(self.error.clone());
        }
        Ok((0..matrix.len()).collect())
    }
}

/// Shared counters for [`TrackedScratch`].
#[derive(Debug, Default)]
pub struct ScratchLedger {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl ScratchLedger {
    /// Number of scratch resources handed out.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired.load(AtomicOrdering::SeqCst)
    }

    /// Number of scratch resources released, successfully or not.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(AtomicOrdering::SeqCst)
    }
}

/// Scratch resource that records its release in a [`ScratchLedger`].
#[derive(Debug)]
pub struct TrackedScratch {
    ledger: Arc<ScratchLedger>,
    fail_release: bool,
}

impl ScratchResource for TrackedScratch {
    fn release(self) -> Result<(), Vec<ResourceCleanupError>> {
        self.ledger.released.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_release {
            return Err(vec![ResourceCleanupError::new(
                "tracked-scratch",
                "release refused",
            )]);
        }
        Ok(())
    }
}

/// Wraps a scratch-free oracle with a [`TrackedScratch`] per call.
#[derive(Debug)]
pub struct TrackingOracle<O> {
    inner: O,
    ledger: Arc<ScratchLedger>,
    fail_release: bool,
}

impl<O> TrackingOracle<O> {
    /// Track scratch handed to `inner`.
    #[must_use]
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            ledger: Arc::default(),
            fail_release: false,
        }
    }

    /// Make every release report a cleanup failure.
    #[must_use]
    pub const fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Counters shared with every scratch handed out.
    #[must_use]
    pub fn ledger(&self) -> Arc<ScratchLedger> {
        Arc::clone(&self.ledger)
    }
}

impl<O: OrderingOracle<Scratch = ()>> OrderingOracle for TrackingOracle<O> {
    type Scratch = TrackedScratch;

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        self.ledger.acquired.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(TrackedScratch {
            ledger: Arc::clone(&self.ledger),
            fail_release: self.fail_release,
        })
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        self.inner.solve(matrix, &mut ())
    }
}
