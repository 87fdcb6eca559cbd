//! Tour cost evaluation and edge materialisation.

#![expect(clippy::float_arithmetic, reason = "tour costs are floating-point sums")]

use crate::dubins::{DubinsError, DubinsPath};
use crate::ordering::Ordering;
use crate::search::InvalidArgument;
use crate::waypoint::{Pose, Waypoint};

/// One leg of a materialised tour.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TourEdge {
    /// Index of the waypoint the leg leaves.
    pub from: usize,
    /// Index of the waypoint the leg reaches.
    pub to: usize,
    /// Path flown along the leg.
    pub path: DubinsPath,
}

impl TourEdge {
    /// Length of the leg.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.path.length()
    }
}

/// Errors from [`TourEvaluator`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Headings, waypoints or ordering disagree in size.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// A leg has no Dubins path.
    #[error("leg {from} -> {to}: {source}")]
    Geometry {
        /// Source waypoint index.
        from: usize,
        /// Target waypoint index.
        to: usize,
        /// Underlying geometry failure.
        source: DubinsError,
    },
}

/// Scores orderings of a fixed waypoint set under a fixed turning radius.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use dubins_tour_core::{Ordering, TourEvaluator, Waypoint};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let waypoints = [
///     Waypoint::new(0, Coord { x: 0.0, y: 0.0 }),
///     Waypoint::new(1, Coord { x: 10.0, y: 0.0 }),
/// ];
/// let evaluator = TourEvaluator::new(&waypoints, 1.0);
/// let ordering = Ordering::identity(2)?;
/// let open = evaluator.evaluate(&ordering, &[0.0, 0.0], false)?;
/// assert!((open - 10.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TourEvaluator<'a> {
    waypoints: &'a [Waypoint],
    radius: f64,
}

impl<'a> TourEvaluator<'a> {
    /// Evaluator over `waypoints` with turning radius `radius`.
    #[must_use]
    pub const fn new(waypoints: &'a [Waypoint], radius: f64) -> Self {
        Self { waypoints, radius }
    }

    /// Total Dubins length of `ordering`, plus the leg back to the origin
    /// when `close_loop` is set.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidArgument`] when the headings or the
    /// ordering do not match the waypoint count, and
    /// [`EvaluationError::Geometry`] when a leg has no path.
    pub fn evaluate(
        &self,
        ordering: &Ordering,
        headings: &[f64],
        close_loop: bool,
    ) -> Result<f64, EvaluationError> {
        self.check_sizes(ordering, headings)?;
        ordering
            .legs(close_loop)
            .map(|(from, to)| self.path(from, to, headings).map(|path| path.length()))
            .sum()
    }

    /// Build the concrete legs of `ordering` and their total length.
    ///
    /// The returned total equals [`evaluate`](Self::evaluate) for the same
    /// arguments.
    ///
    /// # Errors
    ///
    /// As for [`evaluate`](Self::evaluate).
    pub fn materialize(
        &self,
        ordering: &Ordering,
        headings: &[f64],
        close_loop: bool,
    ) -> Result<(Vec<TourEdge>, f64), EvaluationError> {
        self.check_sizes(ordering, headings)?;
        let edges = ordering
            .legs(close_loop)
            .map(|(from, to)| {
                self.path(from, to, headings)
                    .map(|path| TourEdge { from, to, path })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = edges.iter().map(TourEdge::cost).sum();
        Ok((edges, total))
    }

    fn check_sizes(&self, ordering: &Ordering, headings: &[f64]) -> Result<(), InvalidArgument> {
        if headings.len() != self.waypoints.len() {
            return Err(InvalidArgument::HeadingCountMismatch {
                expected: self.waypoints.len(),
                actual: headings.len(),
            });
        }
        if ordering.len() != self.waypoints.len() {
            return Err(InvalidArgument::OrderingSizeMismatch {
                expected: self.waypoints.len(),
                actual: ordering.len(),
            });
        }
        Ok(())
    }

    fn path(&self, from: usize, to: usize, headings: &[f64]) -> Result<DubinsPath, EvaluationError> {
        let pose = |index: usize| {
            self.waypoints
                .get(index)
                .zip(headings.get(index))
                .map(|(waypoint, heading)| Pose::at(waypoint, *heading))
        };
        let (Some(start), Some(end)) = (pose(from), pose(to)) else {
            return Err(InvalidArgument::OrderingSizeMismatch {
                expected: self.waypoints.len(),
                actual: from.max(to) + 1,
            }
            .into());
        };
        DubinsPath::shortest(start, end, self.radius)
            .map_err(|source| EvaluationError::Geometry { from, to, source })
    }
}
