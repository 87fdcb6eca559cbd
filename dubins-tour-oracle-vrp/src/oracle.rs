//! `VrpOracle` implementation backed by `vrp-core`.

use std::time::Instant;

use dubins_tour_core::{CostMatrix, OracleError, OrderingOracle};

use crate::vrp::VrpSolveContext;

/// Configuration for [`VrpOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrpOracleConfig {
    /// Upper bound on `vrp-core` generations per solve.
    pub max_generations: usize,
    /// Require the route to end back at the origin.
    pub return_to_origin: bool,
}

impl Default for VrpOracleConfig {
    fn default() -> Self {
        Self {
            max_generations: 50,
            return_to_origin: true,
        }
    }
}

/// Ordering oracle that solves each matrix as a single-vehicle VRP.
///
/// The `vrp-core` search is internally randomized, so two solves of the same
/// matrix may return different orders.
///
/// # Examples
///
/// ```no_run
/// use dubins_tour_core::{BestOfNSearch, SearchConfig};
/// use dubins_tour_oracle_vrp::{VrpOracle, VrpOracleConfig};
///
/// let oracle = VrpOracle::with_config(VrpOracleConfig {
///     max_generations: 100,
///     ..VrpOracleConfig::default()
/// });
/// let search = BestOfNSearch::with_config(oracle, SearchConfig::seeded(7));
/// assert_eq!(search.config().trials, 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VrpOracle {
    config: VrpOracleConfig,
}

impl VrpOracle {
    /// Construct an oracle using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an oracle with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpOracleConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &VrpOracleConfig {
        &self.config
    }
}

impl OrderingOracle for VrpOracle {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        _scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        match matrix.len() {
            0 => return Err(OracleError::output("cost matrix is empty")),
            1 => return Ok(vec![CostMatrix::ORIGIN]),
            _ => {}
        }
        let started_at = Instant::now();
        let order = VrpSolveContext::new(&self.config).solve(matrix)?;
        log::debug!(
            "vrp oracle ordered {} waypoints in {:?}",
            order.len(),
            started_at.elapsed()
        );
        Ok(order)
    }
}
