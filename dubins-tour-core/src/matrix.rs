//! Asymmetric Dubins cost matrix.

use thiserror::Error;

use crate::dubins::{DubinsError, dubins_length};
use crate::waypoint::Waypoint;

/// Errors from [`CostMatrix`] construction.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CostMatrixError {
    /// The heading assignment does not cover every waypoint.
    #[error("expected {expected} headings, got {actual}")]
    HeadingCountMismatch {
        /// Number of waypoints.
        expected: usize,
        /// Number of headings supplied.
        actual: usize,
    },
    /// A pair of poses had no Dubins path.
    #[error("no path from waypoint {from} to waypoint {to}: {source}")]
    Geometry {
        /// Source waypoint index.
        from: usize,
        /// Target waypoint index.
        to: usize,
        /// Underlying geometry failure.
        source: DubinsError,
    },
}

/// A rows-based matrix was not square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row {row} has {len} entries, expected {expected}")]
pub struct MatrixShapeError {
    /// Offending row.
    pub row: usize,
    /// Its length.
    pub len: usize,
    /// Expected length.
    pub expected: usize,
}

/// Dense `n × n` table of travel costs between oriented waypoints.
///
/// `cost(i, j)` is the Dubins path length from waypoint `i` with its heading
/// to waypoint `j` with its heading. Entries are asymmetric in general. The
/// diagonal is stored as zero and reported as undefined. Index `0` is the
/// origin.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::CostMatrix;
///
/// # fn main() -> Result<(), dubins_tour_core::MatrixShapeError> {
/// let matrix = CostMatrix::from_rows(vec![vec![0.0, 4.0], vec![6.0, 0.0]])?;
/// assert_eq!(matrix.cost(0, 1), Some(4.0));
/// assert_eq!(matrix.cost(1, 0), Some(6.0));
/// assert_eq!(matrix.cost(1, 1), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostMatrix {
    size: usize,
    entries: Vec<f64>,
}

impl CostMatrix {
    /// Index of the origin waypoint.
    pub const ORIGIN: usize = 0;

    /// Evaluate the Dubins length for every ordered pair of distinct
    /// waypoints.
    ///
    /// # Errors
    ///
    /// Returns [`CostMatrixError::HeadingCountMismatch`] when `headings` and
    /// `waypoints` differ in length and [`CostMatrixError::Geometry`] when a
    /// pair has no path (invalid radius or non-finite input).
    pub fn build(
        waypoints: &[Waypoint],
        headings: &[f64],
        radius: f64,
    ) -> Result<Self, CostMatrixError> {
        if headings.len() != waypoints.len() {
            return Err(CostMatrixError::HeadingCountMismatch {
                expected: waypoints.len(),
                actual: headings.len(),
            });
        }
        let size = waypoints.len();
        let mut entries = Vec::with_capacity(size * size);
        for (from, (a, a_heading)) in waypoints.iter().zip(headings).enumerate() {
            for (to, (b, b_heading)) in waypoints.iter().zip(headings).enumerate() {
                let cost = if from == to {
                    0.0
                } else {
                    dubins_length(a, *a_heading, b, *b_heading, radius)
                        .map_err(|source| CostMatrixError::Geometry { from, to, source })?
                };
                entries.push(cost);
            }
        }
        Ok(Self { size, entries })
    }

    /// Build a matrix from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixShapeError`] if any row length differs from the row
    /// count.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixShapeError> {
        let size = rows.len();
        let mut entries = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(MatrixShapeError {
                    row,
                    len: values.len(),
                    expected: size,
                });
            }
            entries.extend(values);
        }
        Ok(Self { size, entries })
    }

    /// Number of waypoints covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Whether the matrix covers no waypoints.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Cost from `from` to `to`, or `None` on the diagonal or out of range.
    #[must_use]
    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        if from == to || from >= self.size || to >= self.size {
            return None;
        }
        self.entries.get(from * self.size + to).copied()
    }

    /// Row of outgoing costs from `from`, diagonal included as zero.
    #[must_use]
    pub fn row(&self, from: usize) -> Option<&[f64]> {
        if from >= self.size {
            return None;
        }
        self.entries.get(from * self.size..(from + 1) * self.size)
    }

    /// Iterate rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.entries.chunks(self.size.max(1))
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::rstest;
    use std::f64::consts::PI;

    fn waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::new(0, Coord { x: 0.0, y: 0.0 }),
            Waypoint::new(1, Coord { x: 10.0, y: 0.0 }),
            Waypoint::new(2, Coord { x: 10.0, y: 10.0 }),
        ]
    }

    #[rstest]
    fn build_fills_off_diagonal_pairs() {
        let matrix = CostMatrix::build(&waypoints(), &[0.0, 0.0, PI], 1.0).expect("matrix");
        assert_eq!(matrix.len(), 3);
        let forward = matrix.cost(0, 1).expect("0 -> 1");
        assert!((forward - 10.0).abs() < 1e-9);
        for i in 0..3 {
            assert_eq!(matrix.cost(i, i), None);
            for j in (0..3).filter(|j| *j != i) {
                assert!(matrix.cost(i, j).is_some_and(|c| c > 0.0));
            }
        }
    }

    #[rstest]
    fn build_is_asymmetric() {
        let matrix = CostMatrix::build(&waypoints(), &[0.0, 0.0, PI], 1.0).expect("matrix");
        let there = matrix.cost(0, 1).expect("0 -> 1");
        let back = matrix.cost(1, 0).expect("1 -> 0");
        assert!((there - back).abs() > 1.0);
    }

    #[rstest]
    fn build_rejects_heading_count_mismatch() {
        let err = CostMatrix::build(&waypoints(), &[0.0], 1.0).expect_err("mismatch");
        assert_eq!(
            err,
            CostMatrixError::HeadingCountMismatch {
                expected: 3,
                actual: 1
            }
        );
    }

    #[rstest]
    fn build_surfaces_geometry_failure() {
        let err = CostMatrix::build(&waypoints(), &[0.0, 0.0, 0.0], 0.0).expect_err("radius");
        assert!(matches!(err, CostMatrixError::Geometry { from: 0, to: 1, .. }));
    }

    #[rstest]
    fn from_rows_rejects_ragged_input() {
        let err = CostMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).expect_err("ragged");
        assert_eq!(
            err,
            MatrixShapeError {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[rstest]
    fn out_of_range_lookups_are_none() {
        let matrix = CostMatrix::from_rows(vec![vec![0.0, 1.0], vec![2.0, 0.0]]).expect("matrix");
        assert_eq!(matrix.cost(0, 5), None);
        assert_eq!(matrix.row(2), None);
        assert_eq!(matrix.row(1), Some(&[2.0, 0.0][..]));
        assert_eq!(matrix.rows().count(), 2);
    }
}
