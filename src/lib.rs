//! Facade crate for the Dubins tour planner.
//!
//! Re-exports the core search and geometry, plus the optional `vrp-core`
//! oracle and filesystem scratch helpers behind feature flags.

#![forbid(unsafe_code)]

pub use dubins_tour_core::{
    BestOfNSearch, CostMatrix, CostMatrixError, DEFAULT_TRIALS, Diagnostics, DubinsError,
    DubinsPath, DubinsTour, EvaluationError, FailurePolicy, HeadingSampler, InvalidArgument,
    MatrixShapeError, NearestNeighbourConfig, NearestNeighbourOracle, OracleError, Ordering,
    OrderingError, OrderingOracle, PathFamily, Pose, ResourceCleanupError, ScratchResource,
    SearchConfig, SearchError, Segment, SegmentKind, TourEdge, TourEvaluator, TourRequest,
    TrialOracle, Waypoint, dubins_length, is_valid_heading, normalize_heading, release_all,
};

#[cfg(feature = "test-support")]
pub use dubins_tour_core::test_support;

#[cfg(feature = "scratch-fs")]
pub use dubins_tour_fs::ScratchFiles;

#[cfg(feature = "oracle-vrp")]
pub use dubins_tour_oracle_vrp::{VrpOracle, VrpOracleConfig};
