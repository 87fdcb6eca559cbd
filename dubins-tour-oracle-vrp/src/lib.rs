//! Ordering oracle backed by the `vrp-core` metaheuristic solver.
//!
//! [`VrpOracle`] models each trial's cost matrix as a single-vehicle routing
//! problem: every waypoint except the origin is a required job, the vehicle
//! starts at the origin and optionally returns there, and travel costs are
//! read straight from the matrix. The visiting order of the best route found
//! becomes the oracle's answer.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod oracle;
mod vrp;

pub use oracle::{VrpOracle, VrpOracleConfig};
