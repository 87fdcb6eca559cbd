//! The ordering oracle port.
//!
//! The search never decides the visiting order itself. Each trial hands a
//! [`CostMatrix`] to an [`OrderingOracle`], which answers with a list of
//! waypoint indices. The oracle is a heuristic black box: the search only
//! requires that the answer is a permutation starting at the origin, and
//! checks that itself.

mod nearest;

use thiserror::Error;

use crate::matrix::CostMatrix;
use crate::scratch::ScratchResource;

pub use nearest::{NearestNeighbourConfig, NearestNeighbourOracle};

/// Failures reported by an oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle could not be reached or the request could not be built.
    #[error("oracle unavailable: {message}")]
    Io {
        /// Description of the failure.
        message: String,
    },
    /// The oracle ran but produced no usable answer.
    #[error("oracle produced no usable ordering: {message}")]
    Output {
        /// Description of the failure.
        message: String,
    },
}

impl OracleError {
    /// An [`OracleError::Io`] with the given message.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// An [`OracleError::Output`] with the given message.
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

/// Solve the asymmetric ordering problem for a cost matrix.
///
/// Implementations return every index `0..matrix.len()` exactly once,
/// starting at [`CostMatrix::ORIGIN`]. Optimality is not required.
///
/// Scratch state is acquired immediately before each [`solve`](Self::solve)
/// call and released by the caller straight afterwards, whatever the outcome.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::{CostMatrix, OracleError, OrderingOracle};
///
/// struct InOrder;
///
/// impl OrderingOracle for InOrder {
///     type Scratch = ();
///
///     fn acquire_scratch(&self) -> Result<(), OracleError> {
///         Ok(())
///     }
///
///     fn solve(&self, matrix: &CostMatrix, _scratch: &mut ()) -> Result<Vec<usize>, OracleError> {
///         Ok((0..matrix.len()).collect())
///     }
/// }
///
/// let matrix = CostMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
/// assert_eq!(InOrder.solve(&matrix, &mut ()).unwrap(), vec![0, 1]);
/// ```
pub trait OrderingOracle {
    /// Per-call resources, `()` when none are needed.
    type Scratch: ScratchResource;

    /// Acquire the scratch state for one call.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Io`] when the resources cannot be created.
    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError>;

    /// Produce a visiting order for `matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Io`] when the solver cannot be reached and
    /// [`OracleError::Output`] when its answer cannot be read.
    fn solve(
        &self,
        matrix: &CostMatrix,
        scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError>;
}

impl<T: OrderingOracle + ?Sized> OrderingOracle for &T {
    type Scratch = T::Scratch;

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        (**self).acquire_scratch()
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        (**self).solve(matrix, scratch)
    }
}
