//! `vrp-core` modelling helpers for `VrpOracle`.
//!
//! This module converts a Dubins cost matrix into a `vrp-core` problem, runs
//! the solver, and reads the visiting order back out of the best route.

use std::sync::Arc;

use dubins_tour_core::{CostMatrix, OracleError};
use vrp_core::models::common::{Location, Profile};
use vrp_core::models::problem::TravelTime;
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;

use crate::oracle::VrpOracleConfig;

fn define_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let unassigned_feature = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-turning-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[unassigned_feature, transport_feature])?.build()
}

fn define_problem(
    waypoint_count: usize,
    transport: Arc<dyn TransportCost>,
    goal: GoalContext,
    return_to_origin: bool,
) -> GenericResult<Problem> {
    let jobs = (1..waypoint_count)
        .map(|location| {
            SingleBuilder::default()
                .id(format!("waypoint{location}").as_str())
                .location(location)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let detail = if return_to_origin {
        VehicleDetailBuilder::default()
            .set_start_location(CostMatrix::ORIGIN)
            .set_end_location(CostMatrix::ORIGIN)
            .build()?
    } else {
        VehicleDetailBuilder::default()
            .set_start_location(CostMatrix::ORIGIN)
            .build()?
    };
    let vehicle = VehicleBuilder::default()
        .id("vehicle")
        .add_detail(detail)
        .build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(std::iter::once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

/// Exposes a [`CostMatrix`] through `vrp-core`'s transport interface.
///
/// Distance and duration are both the Dubins length.
struct CostMatrixTransport {
    rows: Vec<Vec<f64>>,
}

impl CostMatrixTransport {
    fn new(matrix: &CostMatrix) -> Self {
        Self {
            rows: matrix.rows().map(<[f64]>::to_vec).collect(),
        }
    }

    fn cost(&self, from: Location, to: Location) -> f64 {
        let result = self.rows.get(from).and_then(|row| row.get(to)).copied();
        debug_assert!(result.is_some(), "matrix lookup failed: from={from}, to={to}");
        result.unwrap_or(f64::INFINITY)
    }
}

impl TransportCost for CostMatrixTransport {
    // The matrix is route- and time-independent, so `route` and `departure`
    // are ignored.
    fn distance(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> Cost {
        self.cost(from, to)
    }

    fn duration(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> f64 {
        self.cost(from, to)
    }

    fn distance_approx(&self, profile: &Profile, from: usize, to: usize) -> f64 {
        self.duration_approx(profile, from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.cost(from, to)
    }
}

/// Runs one `vrp-core` solve per matrix.
pub(crate) struct VrpSolveContext<'a> {
    config: &'a VrpOracleConfig,
}

impl<'a> VrpSolveContext<'a> {
    pub(crate) const fn new(config: &'a VrpOracleConfig) -> Self {
        Self { config }
    }

    /// Solve the matrix and return the visiting order from the origin.
    ///
    /// Modelling failures are reported as [`OracleError::Io`] since the
    /// request never reached the solver. Solver failures and incomplete
    /// routes are [`OracleError::Output`].
    pub(crate) fn solve(&self, matrix: &CostMatrix) -> Result<Vec<usize>, OracleError> {
        let transport = Arc::new(CostMatrixTransport::new(matrix));
        let goal = define_goal(transport.clone()).map_err(|err| OracleError::io(err.to_string()))?;
        let problem = Arc::new(
            define_problem(matrix.len(), transport, goal, self.config.return_to_origin)
                .map_err(|err| OracleError::io(err.to_string()))?,
        );

        let vrp_config = VrpConfigBuilder::new(problem.clone())
            .prebuild()
            .map_err(|err| OracleError::io(err.to_string()))?
            .with_max_generations(Some(self.config.max_generations))
            .build()
            .map_err(|err| OracleError::io(err.to_string()))?;

        let solution = vrp_core::solver::Solver::new(problem, vrp_config)
            .solve()
            .map_err(|err| OracleError::output(err.to_string()))?;

        let order = visiting_order(solution.get_locations().flatten());
        if order.len() != matrix.len() {
            return Err(OracleError::output(format!(
                "route visits {} of {} waypoints",
                order.len(),
                matrix.len()
            )));
        }
        Ok(order)
    }
}

/// Origin first, then each job location in route order.
fn visiting_order(locations: impl Iterator<Item = Location>) -> Vec<usize> {
    std::iter::once(CostMatrix::ORIGIN)
        .chain(locations.filter(|location| *location != CostMatrix::ORIGIN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::closed(vec![0, 2, 1, 3, 0], vec![0, 2, 1, 3])]
    #[case::open(vec![0, 3, 1, 2], vec![0, 3, 1, 2])]
    #[case::no_depot(vec![1, 2], vec![0, 1, 2])]
    fn visiting_order_drops_depot_visits(#[case] locations: Vec<usize>, #[case] expected: Vec<usize>) {
        assert_eq!(visiting_order(locations.into_iter()), expected);
    }

    #[rstest]
    #[expect(
        clippy::float_arithmetic,
        reason = "test uses float maths for assertions"
    )]
    fn transport_reads_matrix_entries() {
        let matrix =
            CostMatrix::from_rows(vec![vec![0.0, 3.0], vec![5.0, 0.0]]).expect("square");
        let transport = CostMatrixTransport::new(&matrix);
        assert!((transport.cost(0, 1) - 3.0).abs() < f64::EPSILON);
        assert!((transport.cost(1, 0) - 5.0).abs() < f64::EPSILON);
    }
}
