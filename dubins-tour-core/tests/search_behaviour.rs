//! Behavioural tests for `BestOfNSearch` using rstest-bdd.

use std::cell::RefCell;
use std::f64::consts::PI;

use dubins_tour_core::{
    BestOfNSearch, CostMatrix, DubinsTour, InvalidArgument, NearestNeighbourOracle, OracleError,
    OrderingOracle, SearchConfig, SearchError, TourRequest, Waypoint, dubins_length,
};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Clone, Copy, Default)]
enum OracleChoice {
    #[default]
    Heuristic,
    Unreachable,
}

impl OrderingOracle for OracleChoice {
    type Scratch = ();

    fn acquire_scratch(&self) -> Result<Self::Scratch, OracleError> {
        Ok(())
    }

    fn solve(
        &self,
        matrix: &CostMatrix,
        scratch: &mut Self::Scratch,
    ) -> Result<Vec<usize>, OracleError> {
        match self {
            Self::Heuristic => NearestNeighbourOracle::default().solve(matrix, scratch),
            Self::Unreachable => Err(OracleError::io("connection refused")),
        }
    }
}

#[derive(Debug)]
struct SearchWorld {
    waypoints: RefCell<Vec<Waypoint>>,
    headings: RefCell<Vec<f64>>,
    origin_heading: RefCell<f64>,
    return_to_initial: RefCell<bool>,
    oracle: RefCell<OracleChoice>,
    outcome: RefCell<Option<Result<DubinsTour, SearchError>>>,
}

impl SearchWorld {
    fn new() -> Self {
        Self {
            waypoints: RefCell::new(Vec::new()),
            headings: RefCell::new(Vec::new()),
            origin_heading: RefCell::new(0.0),
            return_to_initial: RefCell::new(false),
            oracle: RefCell::new(OracleChoice::default()),
            outcome: RefCell::new(None),
        }
    }

    fn request(&self) -> TourRequest {
        TourRequest::new(
            self.waypoints.borrow().clone(),
            *self.origin_heading.borrow(),
            1.0,
        )
        .returning_to_initial(*self.return_to_initial.borrow())
    }

    fn search(&self) -> BestOfNSearch<OracleChoice> {
        BestOfNSearch::with_config(*self.oracle.borrow(), SearchConfig::seeded(11))
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_outcome(&self) -> Result<DubinsTour, SearchError> {
        self.outcome
            .borrow()
            .as_ref()
            .cloned()
            .expect("outcome should be recorded before assertions")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_tour(&self) -> DubinsTour {
        self.expect_outcome().expect("expected search success")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_error(&self) -> SearchError {
        self.expect_outcome().expect_err("expected search failure")
    }

    /// Leg lengths of the solved tour, recomputed from its retained headings.
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn recomputed_legs(&self) -> Vec<f64> {
        let tour = self.expect_tour();
        let waypoints = self.waypoints.borrow();
        let order = tour.ordering.indices();
        let mut legs: Vec<(usize, usize)> = order
            .iter()
            .copied()
            .zip(order.iter().copied().skip(1))
            .collect();
        if *self.return_to_initial.borrow()
            && let (Some(&last), Some(&first)) = (order.last(), order.first())
        {
            legs.push((last, first));
        }
        legs.into_iter()
            .map(|(from, to)| {
                let start = waypoints.get(from).expect("leg start");
                let end = waypoints.get(to).expect("leg end");
                let start_heading = tour.headings.get(from).copied().expect("start heading");
                let end_heading = tour.headings.get(to).copied().expect("end heading");
                dubins_length(start, start_heading, end, end_heading, 1.0).expect("leg length")
            })
            .collect()
    }
}

fn waypoint(id: u64, x: f64, y: f64) -> Waypoint {
    Waypoint::new(id, Coord { x, y })
}

#[fixture]
fn world() -> SearchWorld {
    SearchWorld::new()
}

#[given("two waypoints ten units apart along the x-axis")]
fn given_straight_pair(world: &SearchWorld) {
    world
        .waypoints
        .replace(vec![waypoint(0, 0.0, 0.0), waypoint(1, 10.0, 0.0)]);
}

#[given("both headings point along the x-axis")]
fn given_parallel_headings(world: &SearchWorld) {
    world.headings.replace(vec![0.0, 0.0]);
}

#[given("a waypoint two radii to the left of the origin")]
fn given_left_pair(world: &SearchWorld) {
    world
        .waypoints
        .replace(vec![waypoint(0, 0.0, 0.0), waypoint(1, 0.0, 2.0)]);
}

#[given("the second heading points back along the x-axis")]
fn given_reversed_heading(world: &SearchWorld) {
    world.headings.replace(vec![0.0, PI]);
}

#[given("an origin heading of seven radians")]
fn given_bad_origin_heading(world: &SearchWorld) {
    world.origin_heading.replace(7.0);
}

#[given("only the origin waypoint")]
fn given_single_waypoint(world: &SearchWorld) {
    world.waypoints.replace(vec![waypoint(0, 0.0, 0.0)]);
}

#[given("the corners of a square")]
fn given_square(world: &SearchWorld) {
    world.waypoints.replace(vec![
        waypoint(0, 0.0, 0.0),
        waypoint(1, 10.0, 0.0),
        waypoint(2, 10.0, 10.0),
        waypoint(3, 0.0, 10.0),
    ]);
}

#[given("three waypoints forming a right angle")]
fn given_right_angle(world: &SearchWorld) {
    world.waypoints.replace(vec![
        waypoint(0, 0.0, 0.0),
        waypoint(1, 10.0, 0.0),
        waypoint(2, 10.0, 10.0),
    ]);
}

#[given("the tour must return to the origin")]
fn given_closed_tour(world: &SearchWorld) {
    world.return_to_initial.replace(true);
}

#[given("an oracle that cannot be reached")]
fn given_unreachable_oracle(world: &SearchWorld) {
    world.oracle.replace(OracleChoice::Unreachable);
}

#[when("the tour is solved with those headings")]
fn when_solved_with_headings(world: &SearchWorld) {
    let outcome = world
        .search()
        .run_with_headings(&world.request(), &world.headings.borrow());
    world.outcome.replace(Some(outcome));
}

#[when("the tour is searched")]
fn when_searched(world: &SearchWorld) {
    let outcome = world.search().run(&world.request());
    world.outcome.replace(Some(outcome));
}

#[then("the tour cost is ten")]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
fn then_cost_ten(world: &SearchWorld) {
    let tour = world.expect_tour();
    assert!((tour.total_cost - 10.0).abs() < 1e-9, "{}", tour.total_cost);
}

#[then("the tour cost is pi")]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
fn then_cost_pi(world: &SearchWorld) {
    let tour = world.expect_tour();
    assert!((tour.total_cost - PI).abs() < 1e-9, "{}", tour.total_cost);
}

#[then("the search fails with an invalid origin heading")]
fn then_invalid_origin_heading(world: &SearchWorld) {
    assert!(matches!(
        world.expect_error(),
        SearchError::InvalidArgument(InvalidArgument::OriginHeadingOutOfRange { .. })
    ));
}

#[then("the search fails with too few waypoints")]
fn then_too_few_waypoints(world: &SearchWorld) {
    assert_eq!(
        world.expect_error(),
        SearchError::InvalidArgument(InvalidArgument::TooFewWaypoints { count: 1 })
    );
}

#[then("every waypoint is visited once")]
fn then_permutation(world: &SearchWorld) {
    let tour = world.expect_tour();
    let mut visited = tour.ordering.indices().to_vec();
    visited.sort_unstable();
    let expected: Vec<usize> = (0..world.waypoints.borrow().len()).collect();
    assert_eq!(visited, expected);
}

#[then("the tour visits the origin then the second waypoint")]
fn then_pair_order(world: &SearchWorld) {
    assert_eq!(world.expect_tour().ordering.indices(), &[0, 1]);
}

#[then("the tour has three legs")]
fn then_three_legs(world: &SearchWorld) {
    assert_eq!(world.expect_tour().edges.len(), 3);
    assert_eq!(world.recomputed_legs().len(), 3);
}

#[then("the tour cost is the Dubins length of its legs")]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
fn then_cost_matches_legs(world: &SearchWorld) {
    let tour = world.expect_tour();
    let total: f64 = world.recomputed_legs().iter().sum();
    assert!(
        (tour.total_cost - total).abs() < 1e-9,
        "{} != {total}",
        tour.total_cost
    );
}

#[then("the tour cost is at least ten")]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
fn then_cost_at_least_ten(world: &SearchWorld) {
    let tour = world.expect_tour();
    assert!(tour.total_cost > 10.0 - 1e-9, "{}", tour.total_cost);
}

#[then("the last leg ends at the origin")]
fn then_closed(world: &SearchWorld) {
    let tour = world.expect_tour();
    assert_eq!(tour.edges.len(), 4);
    assert_eq!(tour.edges.last().map(|edge| edge.to), Some(0));
}

#[then("the search fails with an oracle error")]
fn then_oracle_error(world: &SearchWorld) {
    let err = world.expect_error();
    assert!(err.is_oracle_failure());
    assert!(matches!(err, SearchError::OracleIo { trial: 0, .. }));
}

#[scenario(path = "tests/features/search.feature", index = 0)]
fn straight_pair(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 1)]
fn half_turn(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 2)]
fn invalid_origin_heading(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 3)]
fn single_waypoint(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 4)]
fn closed_tour(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 5)]
fn unreachable_oracle(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 6)]
fn searched_pair(world: SearchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/search.feature", index = 7)]
fn closed_triangle(world: SearchWorld) {
    let _ = world;
}
