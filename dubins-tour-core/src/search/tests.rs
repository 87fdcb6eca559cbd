use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::oracle::{NearestNeighbourOracle, OracleError};
use crate::ordering::OrderingError;
use crate::test_support::{
    FailingOracle, FixedOracle, IdentityOracle, TrackingOracle, waypoints_from,
};

#[fixture]
fn square() -> TourRequest {
    TourRequest::new(
        waypoints_from(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
        0.0,
        1.0,
    )
}

fn seeded(trials: usize) -> SearchConfig {
    SearchConfig::seeded(42).with_trials(trials)
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn straight_pair_costs_its_distance() {
    let request = TourRequest::new(waypoints_from(&[(0.0, 0.0), (10.0, 0.0)]), 0.0, 1.0);
    let tour = BestOfNSearch::new(IdentityOracle)
        .run_with_headings(&request, &[0.0, 0.0])
        .expect("tour");
    assert_eq!(tour.ordering.indices(), &[0, 1]);
    assert_eq!(tour.edges.len(), 1);
    assert!((tour.total_cost - 10.0).abs() < 1e-9);
}

/// Length of each leg of `tour`, recomputed from its retained headings.
fn recomputed_legs(request: &TourRequest, tour: &DubinsTour) -> Vec<f64> {
    let order = tour.ordering.indices();
    let mut legs: Vec<(usize, usize)> = order
        .iter()
        .copied()
        .zip(order.iter().copied().skip(1))
        .collect();
    if request.return_to_initial
        && let (Some(&last), Some(&first)) = (order.last(), order.first())
    {
        legs.push((last, first));
    }
    legs.into_iter()
        .map(|(from, to)| {
            let start = request.waypoints.get(from).expect("leg start");
            let end = request.waypoints.get(to).expect("leg end");
            let start_heading = tour.headings.get(from).copied().expect("start heading");
            let end_heading = tour.headings.get(to).copied().expect("end heading");
            crate::dubins::dubins_length(
                start,
                start_heading,
                end,
                end_heading,
                request.turning_radius,
            )
            .expect("leg length")
        })
        .collect()
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn random_pair_is_one_admissible_leg() {
    let request = TourRequest::new(waypoints_from(&[(0.0, 0.0), (10.0, 0.0)]), 0.0, 1.0);
    let tour = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(10))
        .run(&request)
        .expect("tour");
    assert_eq!(tour.ordering.indices(), &[0, 1]);
    assert_eq!(tour.headings.first(), Some(&0.0));
    let legs = recomputed_legs(&request, &tour);
    assert_eq!(legs.len(), 1);
    let leg: f64 = legs.iter().sum();
    assert!((tour.total_cost - leg).abs() < 1e-9);
    assert!(tour.total_cost > 10.0 - 1e-9);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn closed_triangle_costs_its_three_legs() {
    let request = TourRequest::new(
        waypoints_from(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
        0.0,
        1.0,
    )
    .returning_to_initial(true);
    let tour = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(10))
        .run(&request)
        .expect("tour");
    let mut visited = tour.ordering.indices().to_vec();
    visited.sort_unstable();
    assert_eq!(visited, vec![0, 1, 2]);
    let legs = recomputed_legs(&request, &tour);
    assert_eq!(legs.len(), 3);
    assert_eq!(tour.edges.len(), 3);
    let total: f64 = legs.iter().sum();
    assert!((tour.total_cost - total).abs() < 1e-9);
}

#[rstest]
#[case::heading_too_large(TourRequest::new(waypoints_from(&[(0.0, 0.0), (1.0, 0.0)]), 7.0, 1.0),
    InvalidArgument::OriginHeadingOutOfRange { heading: 7.0 })]
#[case::negative_heading(TourRequest::new(waypoints_from(&[(0.0, 0.0), (1.0, 0.0)]), -0.5, 1.0),
    InvalidArgument::OriginHeadingOutOfRange { heading: -0.5 })]
#[case::zero_radius(TourRequest::new(waypoints_from(&[(0.0, 0.0), (1.0, 0.0)]), 0.0, 0.0),
    InvalidArgument::InvalidTurningRadius { radius: 0.0 })]
#[case::single_waypoint(TourRequest::new(waypoints_from(&[(0.0, 0.0)]), 0.0, 1.0),
    InvalidArgument::TooFewWaypoints { count: 1 })]
#[case::non_finite(TourRequest::new(waypoints_from(&[(0.0, 0.0), (f64::INFINITY, 0.0)]), 0.0, 1.0),
    InvalidArgument::NonFiniteWaypoint { index: 1 })]
fn invalid_requests_fail_before_any_trial(
    #[case] request: TourRequest,
    #[case] expected: InvalidArgument,
) {
    let oracle = FailingOracle::always(OracleError::io("unreachable"));
    let err = BestOfNSearch::new(&oracle).run(&request).expect_err("invalid");
    assert_eq!(err, SearchError::InvalidArgument(expected));
    assert_eq!(oracle.calls(), 0);
}

#[rstest]
fn zero_trials_is_rejected(square: TourRequest) {
    let err = BestOfNSearch::with_config(IdentityOracle, seeded(0))
        .run(&square)
        .expect_err("zero trials");
    assert_eq!(err, SearchError::InvalidArgument(InvalidArgument::ZeroTrials));
}

#[rstest]
fn same_seed_replays_the_same_tour(square: TourRequest) {
    let search = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(8));
    let first = search.run(&square).expect("first");
    let second = search.run(&square).expect("second");
    assert_eq!(first.ordering, second.ordering);
    assert_eq!(first.headings, second.headings);
    assert_eq!(first.total_cost.to_bits(), second.total_cost.to_bits());
    assert_eq!(first.diagnostics.trial_costs, second.diagnostics.trial_costs);
}

#[rstest]
fn winner_is_the_cheapest_trial(square: TourRequest) {
    let tour = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(12))
        .run(&square)
        .expect("tour");
    let costs: Vec<f64> = tour.diagnostics.trial_costs.iter().flatten().copied().collect();
    assert_eq!(costs.len(), 12);
    let best = tour
        .diagnostics
        .trial_costs
        .get(tour.diagnostics.best_trial)
        .copied()
        .flatten()
        .expect("winning cost");
    assert!(costs.iter().all(|cost| best <= *cost));
    // Ties keep the earliest trial.
    let first_best = costs.iter().position(|cost| cost.to_bits() == best.to_bits());
    assert_eq!(first_best, Some(tour.diagnostics.best_trial));
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn open_tour_total_matches_the_winning_trial(square: TourRequest) {
    let tour = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(5))
        .run(&square)
        .expect("tour");
    let best = tour
        .diagnostics
        .trial_costs
        .get(tour.diagnostics.best_trial)
        .copied()
        .flatten()
        .expect("winning cost");
    assert!((tour.total_cost - best).abs() < 1e-9);
    assert_eq!(tour.edges.len(), 3);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn closed_tour_ends_with_the_return_leg(square: TourRequest) {
    let request = square.returning_to_initial(true);
    let tour = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(5))
        .run(&request)
        .expect("tour");
    assert_eq!(tour.edges.len(), 4);
    let last = tour.edges.last().expect("closing leg");
    assert_eq!(last.to, 0);
    let sum: f64 = tour.edges.iter().map(TourEdge::cost).sum();
    assert!((tour.total_cost - sum).abs() < 1e-9);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test uses float maths for assertions")]
fn single_trial_replays_with_its_headings(square: TourRequest) {
    let search = BestOfNSearch::with_config(IdentityOracle, seeded(1));
    let random = search.run(&square).expect("random");
    let replay = search
        .run_with_headings(&square, &random.headings)
        .expect("replay");
    assert_eq!(random.ordering, replay.ordering);
    assert!((random.total_cost - replay.total_cost).abs() < 1e-12);
}

#[rstest]
#[case::short(vec![0.0, 0.0], InvalidArgument::HeadingCountMismatch { expected: 4, actual: 2 })]
#[case::out_of_range(vec![0.0, 0.0, 9.0, 0.0], InvalidArgument::HeadingOutOfRange { index: 2, heading: 9.0 })]
#[case::origin_changed(vec![PI, 0.0, 0.0, 0.0], InvalidArgument::OriginHeadingMismatch { expected: 0.0, actual: PI })]
fn supplied_headings_are_validated(
    square: TourRequest,
    #[case] headings: Vec<f64>,
    #[case] expected: InvalidArgument,
) {
    let err = BestOfNSearch::new(IdentityOracle)
        .run_with_headings(&square, &headings)
        .expect_err("invalid headings");
    assert_eq!(err, SearchError::InvalidArgument(expected));
}

#[rstest]
fn abort_stops_at_the_first_failure(square: TourRequest) {
    let oracle = FailingOracle::always(OracleError::io("socket closed"));
    let err = BestOfNSearch::with_config(&oracle, seeded(5))
        .run(&square)
        .expect_err("abort");
    assert_eq!(
        err,
        SearchError::OracleIo {
            trial: 0,
            message: "socket closed".to_owned(),
        }
    );
    assert_eq!(oracle.calls(), 1);
}

#[cfg(feature = "parallel")]
#[rstest]
fn parallel_abort_skips_trials_after_a_failure(square: TourRequest) {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .expect("thread pool");
    let oracle = FailingOracle::always(OracleError::io("socket closed"));
    let search = BestOfNSearch::with_config(&oracle, seeded(64).with_parallel(true));
    let err = pool.install(|| search.run(&square)).expect_err("abort");
    assert_eq!(
        err,
        SearchError::OracleIo {
            trial: 0,
            message: "socket closed".to_owned(),
        }
    );
    assert!(oracle.calls() < 64, "{} oracle calls", oracle.calls());
}

#[rstest]
fn skip_trial_continues_past_failures(square: TourRequest) {
    let oracle = FailingOracle::on_calls(OracleError::output("no tour"), [0, 2]);
    let config = seeded(4).with_failure_policy(FailurePolicy::SkipTrial);
    let tour = BestOfNSearch::with_config(&oracle, config)
        .run(&square)
        .expect("tour");
    assert_eq!(tour.diagnostics.skipped_trials(), 2);
    assert_eq!(tour.diagnostics.trial_costs.first(), Some(&None));
    assert!(tour.diagnostics.trial_costs.get(1).is_some_and(Option::is_some));
    assert_eq!(oracle.calls(), 4);
}

#[rstest]
fn skip_trial_reports_the_last_failure_when_all_fail(square: TourRequest) {
    let oracle = FailingOracle::always(OracleError::output("no tour"));
    let config = seeded(3).with_failure_policy(FailurePolicy::SkipTrial);
    let err = BestOfNSearch::with_config(&oracle, config)
        .run(&square)
        .expect_err("all failed");
    assert_eq!(
        err,
        SearchError::OracleRejected {
            trial: 2,
            message: "no tour".to_owned(),
        }
    );
}

#[rstest]
#[case::missing_origin(vec![1, 0, 2, 3], OrderingError::MissingOrigin { first: Some(1), origin: 0 })]
#[case::duplicate(vec![0, 1, 1, 3], OrderingError::Duplicate { index: 1 })]
#[case::too_short(vec![0, 1], OrderingError::WrongLength { expected: 4, actual: 2 })]
fn malformed_answers_are_output_errors(
    square: TourRequest,
    #[case] answer: Vec<usize>,
    #[case] expected: OrderingError,
) {
    let err = BestOfNSearch::with_config(FixedOracle::new(answer), seeded(2))
        .run(&square)
        .expect_err("malformed");
    assert_eq!(
        err,
        SearchError::OracleOutput {
            trial: 0,
            source: expected,
        }
    );
    assert!(err.is_oracle_failure());
}

#[rstest]
fn scratch_is_released_after_every_trial(square: TourRequest) {
    let oracle = TrackingOracle::new(FailingOracle::on_calls(OracleError::io("flaky"), [1]));
    let ledger = oracle.ledger();
    let config = seeded(5).with_failure_policy(FailurePolicy::SkipTrial);
    BestOfNSearch::with_config(oracle, config)
        .run(&square)
        .expect("tour");
    assert_eq!(ledger.acquired(), 5);
    assert_eq!(ledger.released(), 5);
}

#[rstest]
fn cleanup_failures_are_reported_not_fatal(square: TourRequest) {
    let oracle = TrackingOracle::new(IdentityOracle).failing_release();
    let tour = BestOfNSearch::with_config(oracle, seeded(3))
        .run(&square)
        .expect("tour");
    assert_eq!(tour.diagnostics.cleanup_failures.len(), 3);
}

#[rstest]
fn best_cost_history_never_increases() {
    let diagnostics = Diagnostics {
        solve_time: Duration::ZERO,
        trial_costs: vec![Some(5.0), None, Some(7.0), Some(3.0), Some(4.0)],
        best_trial: 3,
        cleanup_failures: Vec::new(),
    };
    assert_eq!(diagnostics.best_cost_history(), vec![5.0, 5.0, 3.0, 3.0]);
    assert_eq!(diagnostics.skipped_trials(), 1);
}

#[rstest]
fn request_builder_sets_closure() {
    let request = TourRequest::new(waypoints_from(&[(0.0, 0.0), (0.0, 5.0)]), FRAC_PI_2, 2.0)
        .returning_to_initial(true);
    assert!(request.return_to_initial);
    assert!(request.validate().is_ok());
}

#[cfg(feature = "parallel")]
#[rstest]
fn parallel_trials_match_sequential(square: TourRequest) {
    let sequential = BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(6))
        .run(&square)
        .expect("sequential");
    let parallel =
        BestOfNSearch::with_config(NearestNeighbourOracle::default(), seeded(6).with_parallel(true))
            .run(&square)
            .expect("parallel");
    assert_eq!(sequential.ordering, parallel.ordering);
    assert_eq!(
        sequential.diagnostics.trial_costs,
        parallel.diagnostics.trial_costs
    );
}

#[cfg(feature = "serde")]
#[rstest]
fn tours_serialise_for_reporting(square: TourRequest) {
    let tour = BestOfNSearch::with_config(IdentityOracle, seeded(2))
        .run(&square)
        .expect("tour");
    let json = serde_json::to_value(&tour).expect("serialise");
    assert_eq!(json["ordering"]["indices"], serde_json::json!([0, 1, 2, 3]));
    assert_eq!(json["edges"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["diagnostics"]["best_trial"], tour.diagnostics.best_trial);

    let config: SearchConfig =
        serde_json::from_str(r#"{"trials":4,"seed":9,"failure_policy":"SkipTrial","parallel":false}"#)
            .expect("config");
    assert_eq!(
        config,
        SearchConfig::seeded(9)
            .with_trials(4)
            .with_failure_policy(FailurePolicy::SkipTrial)
    );
}
