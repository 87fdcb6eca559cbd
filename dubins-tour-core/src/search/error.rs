use thiserror::Error;

use crate::dubins::DubinsError;
use crate::matrix::CostMatrixError;
use crate::oracle::OracleError;
use crate::ordering::OrderingError;
use crate::tour::EvaluationError;

/// Caller mistakes detected before any trial runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidArgument {
    /// The origin heading lies outside `[0, 2π)`.
    #[error("origin heading must be in [0, 2π), got {heading}")]
    OriginHeadingOutOfRange {
        /// Offending heading.
        heading: f64,
    },
    /// A caller-supplied heading lies outside `[0, 2π)`.
    #[error("heading for waypoint {index} must be in [0, 2π), got {heading}")]
    HeadingOutOfRange {
        /// Waypoint index.
        index: usize,
        /// Offending heading.
        heading: f64,
    },
    /// A heading assignment does not cover every waypoint.
    #[error("expected {expected} headings, got {actual}")]
    HeadingCountMismatch {
        /// Number of waypoints.
        expected: usize,
        /// Number of headings supplied.
        actual: usize,
    },
    /// Caller-supplied headings disagree with the origin heading.
    #[error("origin heading is {expected} but the supplied headings start with {actual}")]
    OriginHeadingMismatch {
        /// Origin heading of the request.
        expected: f64,
        /// First supplied heading.
        actual: f64,
    },
    /// An ordering does not cover the waypoint set.
    #[error("ordering covers {actual} waypoints, expected {expected}")]
    OrderingSizeMismatch {
        /// Number of waypoints.
        expected: usize,
        /// Size implied by the ordering.
        actual: usize,
    },
    /// Fewer than two waypoints were supplied.
    #[error("at least two waypoints are required, got {count}")]
    TooFewWaypoints {
        /// Number supplied.
        count: usize,
    },
    /// The turning radius is zero, negative or not finite.
    #[error("turning radius must be positive and finite, got {radius}")]
    InvalidTurningRadius {
        /// Offending radius.
        radius: f64,
    },
    /// A waypoint has a non-finite coordinate.
    #[error("waypoint {index} has a non-finite position")]
    NonFiniteWaypoint {
        /// Waypoint index.
        index: usize,
    },
    /// The search was configured with no trials.
    #[error("at least one trial is required")]
    ZeroTrials,
}

/// Errors returned by [`BestOfNSearch`](super::BestOfNSearch).
///
/// [`InvalidArgument`] is a caller bug and is never worth retrying. The
/// oracle variants describe collaborator failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The request or configuration was rejected before any trial ran.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// The oracle could not be reached or its request could not be built.
    #[error("trial {trial}: oracle unavailable: {message}")]
    OracleIo {
        /// Trial that failed.
        trial: usize,
        /// Description from the oracle.
        message: String,
    },
    /// The oracle ran but reported that it had no usable answer.
    #[error("trial {trial}: oracle produced no usable ordering: {message}")]
    OracleRejected {
        /// Trial that failed.
        trial: usize,
        /// Description from the oracle.
        message: String,
    },
    /// The oracle answered with something other than a tour.
    #[error("trial {trial}: oracle returned an invalid ordering: {source}")]
    OracleOutput {
        /// Trial that failed.
        trial: usize,
        /// What was wrong with the answer.
        source: OrderingError,
    },
    /// A leg had no Dubins path. Validated input never triggers this.
    #[error("leg {from} -> {to} has no Dubins path: {source}")]
    Geometry {
        /// Source waypoint index.
        from: usize,
        /// Target waypoint index.
        to: usize,
        /// Underlying geometry failure.
        source: DubinsError,
    },
}

impl SearchError {
    /// Whether the error came from the ordering oracle.
    #[must_use]
    pub const fn is_oracle_failure(&self) -> bool {
        matches!(
            self,
            Self::OracleIo { .. } | Self::OracleRejected { .. } | Self::OracleOutput { .. }
        )
    }

    pub(super) fn from_oracle(trial: usize, err: OracleError) -> Self {
        match err {
            OracleError::Io { message } => Self::OracleIo { trial, message },
            OracleError::Output { message } => Self::OracleRejected { trial, message },
        }
    }
}

impl From<CostMatrixError> for SearchError {
    fn from(err: CostMatrixError) -> Self {
        match err {
            CostMatrixError::HeadingCountMismatch { expected, actual } => {
                InvalidArgument::HeadingCountMismatch { expected, actual }.into()
            }
            CostMatrixError::Geometry { from, to, source } => Self::Geometry { from, to, source },
        }
    }
}

impl From<EvaluationError> for SearchError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::InvalidArgument(invalid) => invalid.into(),
            EvaluationError::Geometry { from, to, source } => Self::Geometry { from, to, source },
        }
    }
}
