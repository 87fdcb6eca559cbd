//! Core types and search for the Dubins travelling salesman problem.
//!
//! A vehicle with a minimum turning radius must visit a set of planar
//! waypoints, starting at the first one with a fixed heading. Choosing the
//! order and the heading at every waypoint is hard, so the search fixes the
//! headings at random, hands the resulting asymmetric cost matrix to an
//! [`OrderingOracle`] and keeps the cheapest of several such trials.
//!
//! The Dubins path primitives ([`DubinsPath`], [`dubins_length`]) are usable
//! on their own.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod dubins;
mod heading;
mod matrix;
mod oracle;
mod ordering;
mod scratch;
mod search;
mod tour;
mod waypoint;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use dubins::{DubinsError, DubinsPath, PathFamily, Segment, SegmentKind, dubins_length};
pub use heading::HeadingSampler;
pub use matrix::{CostMatrix, CostMatrixError, MatrixShapeError};
pub use oracle::{
    NearestNeighbourConfig, NearestNeighbourOracle, OracleError, OrderingOracle,
};
pub use ordering::{Ordering, OrderingError};
pub use scratch::{ResourceCleanupError, ScratchResource, release_all};
pub use search::{
    BestOfNSearch, DEFAULT_TRIALS, Diagnostics, DubinsTour, FailurePolicy, InvalidArgument,
    SearchConfig, SearchError, TourRequest, TrialOracle,
};
pub use tour::{EvaluationError, TourEdge, TourEvaluator};
pub use waypoint::{Pose, Waypoint, is_valid_heading, normalize_heading};
