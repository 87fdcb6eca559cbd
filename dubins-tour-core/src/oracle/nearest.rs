//! Greedy construction with or-opt relocation.
//!
//! Builds a tour by repeatedly moving to the cheapest unvisited successor,
//! then relocates segments of one to three consecutive waypoints to any other
//! position while that lowers the tour cost (first improvement). Segments are
//! never reversed, so asymmetric costs are respected.

#![expect(
    clippy::float_arithmetic,
    reason = "tour costs are floating-point sums"
)]

use crate::matrix::CostMatrix;

use super::{OracleError, OrderingOracle};

/// Improvements smaller than this are ignored to avoid cycling on rounding.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Configuration for [`NearestNeighbourOracle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearestNeighbourConfig {
    /// Include the leg back to the origin when comparing tours. Off by
    /// default, since the search ranks trials by their open tour cost.
    pub close_loop: bool,
    /// Longest run of consecutive waypoints moved as a block.
    pub max_segment: usize,
    /// Upper bound on improvement passes.
    pub max_passes: usize,
}

impl Default for NearestNeighbourConfig {
    fn default() -> Self {
        Self {
            close_loop: false,
            max_segment: 3,
            max_passes: 50,
        }
    }
}

/// Dependency-free heuristic oracle.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::{CostMatrix, NearestNeighbourOracle, OrderingOracle};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let matrix = CostMatrix::from_rows(vec![
///     vec![0.0, 9.0, 1.0],
///     vec![1.0, 0.0, 9.0],
///     vec![9.0, 1.0, 0.0],
/// ])?;
/// let order = NearestNeighbourOracle::default().solve(&matrix, &mut ())?;
/// assert_eq!(order, vec![0, 2, 1]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighbourOracle {
    config: NearestNeighbourConfig,
}

impl NearestNeighbourOracle {
    /// Construct an oracle with explicit configuration.
    #[must_use]
    pub const fn with_config(config: NearestNeighbourConfig) -> Self {
        Self { config }
    }

    fn tour_cost(&self, matrix: &CostMatrix, tour: &[usize]) -> f64 {
        let open: f64 = tour
            .windows(2)
            .map(|pair| match pair {
                [from, to] => leg(matrix, *from, *to),
                _ => 0.0,
            })
            .sum();
        match (self.config.close_loop, tour.last()) {
            (true, Some(&last)) if last != CostMatrix::ORIGIN => {
                open + leg(matrix, last, CostMatrix::ORIGIN)
            }
            _ => open,
        }
    }

    /// Try every relocation once, applying the first that helps.
    fn improve_once(&self, matrix: &CostMatrix, tour: &mut Vec<usize>, cost: &mut f64) -> bool {
        let len = tour.len();
        for segment_len in 1..=self.config.max_segment.min(len.saturating_sub(1)) {
            for start in 1..=len - segment_len {
                let mut rest = tour.clone();
                let segment: Vec<usize> = rest.drain(start..start + segment_len).collect();
                for insert_at in 1..=rest.len() {
                    if insert_at == start {
                        continue;
                    }
                    let mut candidate = rest.clone();
                    candidate.splice(insert_at..insert_at, segment.iter().copied());
                    let candidate_cost = self.tour_cost(matrix, &candidate);
                    if candidate_cost < *cost - IMPROVEMENT_EPSILON {
                        *tour = candidate;
                        *cost = candidate_cost;
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn leg(matrix: &CostMatrix, from: usize, to: usize) -> f64 {
    matrix.cost(from, to).unwrap_or(f64::INFINITY)
}

fn nearest_neighbour_tour(matrix: &CostMatrix) -> Vec<usize> {
    let len = matrix.len();
    let mut visited = vec![false; len];
    let mut tour = Vec::with_capacity(len);
    let mut current = CostMatrix::ORIGIN;
    if let Some(slot) = visited.get_mut(current) {
        *slot = true;
        tour.push(current);
    }
    while tour.len() < len {
        let next = visited
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(candidate, _)| (candidate, leg(matrix, current, candidate)))
            .min_by(|(lhs_idx, lhs), (rhs_idx, rhs)| {
                lhs.total_cmp(rhs).then_with(|| lhs_idx.cmp(rhs_idx))
            })
            .map(|(candidate, _)| candidate);
        let Some(next) = next else { break };
        if let Some(slot) = visited.get_mut(next) {
            *slot = true;
        }
        tour.push(next);
        current = next;
    }
    tour
}

impl OrderingOracle for NearestNeighbourOracle {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        if matrix.is_empty() {
            return Err(OracleError::output("cost matrix is empty"));
        }
        let mut tour = nearest_neighbour_tour(matrix);
        let mut cost = self.tour_cost(matrix, &tour);
        let mut passes = 0;
        while passes < self.config.max_passes && self.improve_once(matrix, &mut tour, &mut cost) {
            passes += 1;
        }
        log::trace!("nearest-neighbour oracle: {passes} improvement passes, cost {cost:.3}");
        Ok(tour)
    }
}
