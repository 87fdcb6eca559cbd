//! Best-of-N randomized heading search.
//!
//! Each trial draws fresh headings, builds the Dubins cost matrix, asks the
//! oracle for a visiting order and scores the open tour. The cheapest trial
//! wins; its tour is then re-evaluated with the caller's loop-closure choice
//! and materialised into edges.
//!
//! Trial seeds are drawn up front from the search generator so every trial
//! owns an independent stream. That keeps sequential and parallel runs with
//! the same seed identical.

mod error;

use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::heading::HeadingSampler;
use crate::matrix::CostMatrix;
use crate::oracle::OrderingOracle;
use crate::ordering::Ordering;
use crate::scratch::{ResourceCleanupError, ScratchResource};
use crate::tour::{TourEdge, TourEvaluator};
use crate::waypoint::{Waypoint, is_valid_heading};

pub use error::{InvalidArgument, SearchError};

/// Trial count used when none is configured.
pub const DEFAULT_TRIALS: usize = 10;

/// What to do when a trial's oracle call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Abort the whole search on the first failed trial.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining trials. The search
    /// fails only if every trial fails.
    SkipTrial,
}

/// Configuration for [`BestOfNSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Number of randomized trials.
    pub trials: usize,
    /// Seed for the search generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Handling of oracle failures.
    pub failure_policy: FailurePolicy,
    /// Run trials on the rayon pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            failure_policy: FailurePolicy::default(),
            parallel: false,
        }
    }
}

impl SearchConfig {
    /// Default configuration with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Replace the trial count.
    #[must_use]
    pub const fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Replace the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Enable or disable parallel trials.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject configurations that cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::ZeroTrials`] when `trials` is zero.
    pub const fn validate(&self) -> Result<(), InvalidArgument> {
        if self.trials == 0 {
            return Err(InvalidArgument::ZeroTrials);
        }
        Ok(())
    }
}

/// Parameters of one tour request.
///
/// The first waypoint is the origin.
///
/// # Examples
/// ```rust
/// use geo::Coord;
/// use dubins_tour_core::{TourRequest, Waypoint};
///
/// let request = TourRequest::new(
///     vec![
///         Waypoint::new(0, Coord { x: 0.0, y: 0.0 }),
///         Waypoint::new(1, Coord { x: 10.0, y: 0.0 }),
///     ],
///     0.0,
///     1.0,
/// )
/// .returning_to_initial(true);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TourRequest {
    /// Waypoints to visit; index `0` is the origin.
    pub waypoints: Vec<Waypoint>,
    /// Fixed heading at the origin, in `[0, 2π)`.
    pub origin_heading: f64,
    /// Minimum turning radius of the vehicle.
    pub turning_radius: f64,
    /// Close the tour with a leg back to the origin.
    pub return_to_initial: bool,
}

impl TourRequest {
    /// Open-tour request.
    #[must_use]
    pub const fn new(waypoints: Vec<Waypoint>, origin_heading: f64, turning_radius: f64) -> Self {
        Self {
            waypoints,
            origin_heading,
            turning_radius,
            return_to_initial: false,
        }
    }

    /// Set whether the tour returns to the origin.
    #[must_use]
    pub const fn returning_to_initial(mut self, return_to_initial: bool) -> Self {
        self.return_to_initial = return_to_initial;
        self
    }

    /// Check the request preconditions.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`InvalidArgument`], checking the origin
    /// heading, the turning radius, the waypoint count and finally the
    /// waypoint positions.
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if !is_valid_heading(self.origin_heading) {
            return Err(InvalidArgument::OriginHeadingOutOfRange {
                heading: self.origin_heading,
            });
        }
        if !(self.turning_radius.is_finite() && self.turning_radius > 0.0) {
            return Err(InvalidArgument::InvalidTurningRadius {
                radius: self.turning_radius,
            });
        }
        if self.waypoints.len() < 2 {
            return Err(InvalidArgument::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        if let Some(index) = self.waypoints.iter().position(|w| !w.is_finite()) {
            return Err(InvalidArgument::NonFiniteWaypoint { index });
        }
        Ok(())
    }

    fn validate_headings(&self, headings: &[f64]) -> Result<(), InvalidArgument> {
        if headings.len() != self.waypoints.len() {
            return Err(InvalidArgument::HeadingCountMismatch {
                expected: self.waypoints.len(),
                actual: headings.len(),
            });
        }
        if let Some((index, heading)) = headings
            .iter()
            .enumerate()
            .find(|(_, heading)| !is_valid_heading(**heading))
        {
            return Err(InvalidArgument::HeadingOutOfRange {
                index,
                heading: *heading,
            });
        }
        match headings.first() {
            Some(&first) if first.to_bits() == self.origin_heading.to_bits() => Ok(()),
            first => Err(InvalidArgument::OriginHeadingMismatch {
                expected: self.origin_heading,
                actual: first.copied().unwrap_or(f64::NAN),
            }),
        }
    }
}

/// Bookkeeping from a completed search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostics {
    /// Wall-clock time spent in the search.
    pub solve_time: Duration,
    /// Open-tour cost of each trial in trial order; `None` for skipped trials.
    pub trial_costs: Vec<Option<f64>>,
    /// Index of the winning trial.
    pub best_trial: usize,
    /// Scratch resources that could not be released.
    pub cleanup_failures: Vec<ResourceCleanupError>,
}

impl Diagnostics {
    /// Number of trials skipped under [`FailurePolicy::SkipTrial`].
    #[must_use]
    pub fn skipped_trials(&self) -> usize {
        self.trial_costs.iter().filter(|cost| cost.is_none()).count()
    }

    /// Best open-tour cost after each completed trial.
    ///
    /// Skipped trials are omitted. The sequence never increases.
    #[must_use]
    pub fn best_cost_history(&self) -> Vec<f64> {
        let mut best: Option<f64> = None;
        self.trial_costs
            .iter()
            .flatten()
            .map(|&cost| {
                let current = best.map_or(cost, |previous| previous.min(cost));
                best = Some(current);
                current
            })
            .collect()
    }
}

/// A solved tour.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DubinsTour {
    /// Visiting order, starting at the origin.
    pub ordering: Ordering,
    /// Concrete legs, including the closing leg when requested.
    pub edges: Vec<TourEdge>,
    /// Heading at each waypoint, indexed like the request's waypoints.
    pub headings: Vec<f64>,
    /// Total length of `edges`.
    pub total_cost: f64,
    /// Search bookkeeping.
    pub diagnostics: Diagnostics,
}

/// Oracle bound required to run trials, `Sync` when the `parallel` feature
/// is enabled.
#[cfg(feature = "parallel")]
pub trait TrialOracle: OrderingOracle + Sync {}

#[cfg(feature = "parallel")]
impl<T: OrderingOracle + Sync + ?Sized> TrialOracle for T {}

/// Oracle bound required to run trials, `Sync` when the `parallel` feature
/// is enabled.
#[cfg(not(feature = "parallel"))]
pub trait TrialOracle: OrderingOracle {}

#[cfg(not(feature = "parallel"))]
impl<T: OrderingOracle + ?Sized> TrialOracle for T {}

/// Outcome of one successful trial.
#[derive(Debug, Clone)]
struct Trial {
    index: usize,
    headings: Vec<f64>,
    ordering: Ordering,
    cost: f64,
    cleanup_failures: Vec<ResourceCleanupError>,
}

/// Randomized-restart DTSP solver.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use dubins_tour_core::{
///     BestOfNSearch, NearestNeighbourOracle, SearchConfig, TourRequest, Waypoint,
/// };
///
/// # fn main() -> Result<(), dubins_tour_core::SearchError> {
/// let request = TourRequest::new(
///     vec![
///         Waypoint::new(0, Coord { x: 0.0, y: 0.0 }),
///         Waypoint::new(1, Coord { x: 10.0, y: 0.0 }),
///         Waypoint::new(2, Coord { x: 10.0, y: 10.0 }),
///     ],
///     0.0,
///     1.0,
/// )
/// .returning_to_initial(true);
/// let search = BestOfNSearch::with_config(NearestNeighbourOracle::default(), SearchConfig::seeded(7));
/// let tour = search.run(&request)?;
/// assert_eq!(tour.edges.len(), 3);
/// assert_eq!(tour.ordering.indices()[0], 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BestOfNSearch<O> {
    oracle: O,
    config: SearchConfig,
    sampler: HeadingSampler,
}

impl<O: TrialOracle> BestOfNSearch<O> {
    /// Search with the default configuration.
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, SearchConfig::default())
    }

    /// Search with explicit configuration.
    pub fn with_config(oracle: O, config: SearchConfig) -> Self {
        Self {
            oracle,
            config,
            sampler: HeadingSampler::new(),
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The wrapped oracle.
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Solve `request` with randomized headings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] before any trial when the
    /// request or configuration is invalid, and the first oracle error under
    /// [`FailurePolicy::Abort`]. Under [`FailurePolicy::SkipTrial`] an error
    /// is returned only when every trial fails.
    pub fn run(&self, request: &TourRequest) -> Result<DubinsTour, SearchError> {
        request.validate()?;
        self.config.validate()?;
        let started_at = Instant::now();

        let mut rng = self
            .config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let seeds: Vec<u64> = (0..self.config.trials).map(|_| rng.next_u64()).collect();
        log::debug!(
            "running {} trials over {} waypoints",
            seeds.len(),
            request.waypoints.len()
        );

        let outcomes = self.run_trials(request, &seeds);
        self.finish(request, outcomes, started_at)
    }

    /// Solve `request` with caller-supplied headings, as a single trial.
    ///
    /// `headings[0]` must equal the request's origin heading.
    ///
    /// # Errors
    ///
    /// As for [`run`](Self::run), plus heading validation errors.
    pub fn run_with_headings(
        &self,
        request: &TourRequest,
        headings: &[f64],
    ) -> Result<DubinsTour, SearchError> {
        request.validate()?;
        request.validate_headings(headings)?;
        let started_at = Instant::now();
        let outcome = self.evaluate_trial(request, 0, headings.to_vec());
        self.finish(request, vec![outcome], started_at)
    }

    #[cfg(feature = "parallel")]
    fn run_trials(
        &self,
        request: &TourRequest,
        seeds: &[u64],
    ) -> Vec<Result<Trial, SearchError>> {
        use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

        use rayon::prelude::*;

        if !self.config.parallel {
            return self.run_sequential(request, seeds);
        }
        if self.config.failure_policy == FailurePolicy::SkipTrial {
            return seeds
                .par_iter()
                .enumerate()
                .map(|(index, seed)| self.random_trial(request, index, *seed))
                .collect();
        }

        // Trials above the lowest failed index are skipped. Every trial below
        // it still runs, so the reported failure matches a sequential run.
        let first_failure = AtomicUsize::new(usize::MAX);
        let outcomes: Vec<Option<Result<Trial, SearchError>>> = seeds
            .par_iter()
            .enumerate()
            .map(|(index, seed)| {
                if index > first_failure.load(AtomicOrdering::Acquire) {
                    return None;
                }
                let outcome = self.random_trial(request, index, *seed);
                if outcome.is_err() {
                    first_failure.fetch_min(index, AtomicOrdering::AcqRel);
                }
                Some(outcome)
            })
            .collect();
        let skipped = outcomes.iter().filter(|outcome| outcome.is_none()).count();
        if skipped > 0 {
            log::debug!("skipped {skipped} trials after an aborting failure");
        }
        outcomes.into_iter().flatten().collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run_trials(
        &self,
        request: &TourRequest,
        seeds: &[u64],
    ) -> Vec<Result<Trial, SearchError>> {
        self.run_sequential(request, seeds)
    }

    /// Run trials in order, stopping at the first failure under
    /// [`FailurePolicy::Abort`].
    fn run_sequential(
        &self,
        request: &TourRequest,
        seeds: &[u64],
    ) -> Vec<Result<Trial, SearchError>> {
        let mut outcomes = Vec::with_capacity(seeds.len());
        for (index, seed) in seeds.iter().enumerate() {
            let outcome = self.random_trial(request, index, *seed);
            let abort = outcome.is_err() && self.config.failure_policy == FailurePolicy::Abort;
            outcomes.push(outcome);
            if abort {
                break;
            }
        }
        outcomes
    }

    fn random_trial(
        &self,
        request: &TourRequest,
        index: usize,
        seed: u64,
    ) -> Result<Trial, SearchError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let headings =
            self.sampler
                .sample(&request.waypoints, request.origin_heading, true, &mut rng);
        self.evaluate_trial(request, index, headings)
    }

    fn evaluate_trial(
        &self,
        request: &TourRequest,
        index: usize,
        headings: Vec<f64>,
    ) -> Result<Trial, SearchError> {
        let matrix = CostMatrix::build(&request.waypoints, &headings, request.turning_radius)?;
        let (raw, cleanup_failures) = self.consult_oracle(&matrix, index)?;
        let ordering = Ordering::new(raw, request.waypoints.len())
            .map_err(|source| SearchError::OracleOutput {
                trial: index,
                source,
            })?;
        let cost = TourEvaluator::new(&request.waypoints, request.turning_radius).evaluate(
            &ordering,
            &headings,
            false,
        )?;
        log::debug!("trial {index}: cost {cost:.3}, order {:?}", ordering.indices());
        Ok(Trial {
            index,
            headings,
            ordering,
            cost,
            cleanup_failures,
        })
    }

    /// Acquire scratch, query the oracle, and release scratch whatever the
    /// answer was.
    fn consult_oracle(
        &self,
        matrix: &CostMatrix,
        trial: usize,
    ) -> Result<(Vec<usize>, Vec<ResourceCleanupError>), SearchError> {
        let mut scratch = self
            .oracle
            .acquire_scratch()
            .map_err(|err| SearchError::from_oracle(trial, err))?;
        let answer = self.oracle.solve(matrix, &mut scratch);
        let cleanup_failures = scratch.release().err().unwrap_or_default();
        for failure in &cleanup_failures {
            log::warn!("trial {trial}: {failure}");
        }
        answer
            .map(|raw| (raw, cleanup_failures))
            .map_err(|err| SearchError::from_oracle(trial, err))
    }

    /// Reduce trial outcomes to the best tour and materialise it.
    fn finish(
        &self,
        request: &TourRequest,
        outcomes: Vec<Result<Trial, SearchError>>,
        started_at: Instant,
    ) -> Result<DubinsTour, SearchError> {
        let mut trial_costs = Vec::with_capacity(outcomes.len());
        let mut cleanup_failures = Vec::new();
        let mut best: Option<Trial> = None;
        let mut last_error = None;

        for outcome in outcomes {
            let mut trial = match outcome {
                Ok(trial) => trial,
                Err(err) => {
                    if self.config.failure_policy == FailurePolicy::Abort || !err.is_oracle_failure()
                    {
                        return Err(err);
                    }
                    log::warn!("skipping failed trial: {err}");
                    trial_costs.push(None);
                    last_error = Some(err);
                    continue;
                }
            };
            trial_costs.push(Some(trial.cost));
            cleanup_failures.append(&mut trial.cleanup_failures);
            if best.as_ref().is_none_or(|current| trial.cost < current.cost) {
                if let Some(current) = &best {
                    log::debug!(
                        "trial {} improves on trial {}: {:.3} < {:.3}",
                        trial.index,
                        current.index,
                        trial.cost,
                        current.cost
                    );
                }
                best = Some(trial);
            }
        }

        let Some(best) = best else {
            return Err(last_error.unwrap_or(SearchError::InvalidArgument(
                InvalidArgument::ZeroTrials,
            )));
        };

        let (edges, total_cost) = TourEvaluator::new(&request.waypoints, request.turning_radius)
            .materialize(&best.ordering, &best.headings, request.return_to_initial)?;

        let solve_time = started_at.elapsed();
        log::info!(
            "solved {}-waypoint tour with cost {total_cost:.3} (trial {} of {}) in {solve_time:?}",
            request.waypoints.len(),
            best.index,
            trial_costs.len()
        );
        for (index, heading) in best.headings.iter().enumerate() {
            log::debug!("  waypoint {index}: {heading:.4} rad");
        }

        Ok(DubinsTour {
            ordering: best.ordering,
            edges,
            headings: best.headings,
            total_cost,
            diagnostics: Diagnostics {
                solve_time,
                trial_costs,
                best_trial: best.index,
                cleanup_failures,
            },
        })
    }
}

#[cfg(test)]
mod tests;
