//! Waypoints, poses and heading normalisation.

#![expect(
    clippy::float_arithmetic,
    reason = "heading normalisation wraps floating-point angles"
)]

use std::f64::consts::TAU;

use geo::Coord;

/// A location the vehicle must visit.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use dubins_tour_core::Waypoint;
///
/// let waypoint = Waypoint::new(7, Coord { x: 1.0, y: 2.0 });
/// assert_eq!(waypoint.id, 7);
/// assert!(waypoint.is_finite());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    /// Caller-assigned identifier.
    pub id: u64,
    /// Planar position.
    pub position: Coord<f64>,
}

impl Waypoint {
    /// Construct a waypoint.
    #[must_use]
    pub const fn new(id: u64, position: Coord<f64>) -> Self {
        Self { id, position }
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite()
    }
}

/// A position paired with a heading in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// Planar position.
    pub position: Coord<f64>,
    /// Heading in radians, measured anticlockwise from the positive x-axis.
    pub heading: f64,
}

impl Pose {
    /// Construct a pose, wrapping the heading into `[0, 2π)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::f64::consts::PI;
    /// use dubins_tour_core::Pose;
    ///
    /// let pose = Pose::new(0.0, 0.0, -PI / 2.0);
    /// assert!((pose.heading - 1.5 * PI).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Coord { x, y },
            heading: normalize_heading(heading),
        }
    }

    /// Pose of `waypoint` facing `heading`.
    #[must_use]
    pub fn at(waypoint: &Waypoint, heading: f64) -> Self {
        Self {
            position: waypoint.position,
            heading: normalize_heading(heading),
        }
    }

    /// Euclidean distance between the positions of two poses.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (other.position.x - self.position.x).hypot(other.position.y - self.position.y)
    }
}

/// Whether `heading` lies in the half-open interval `[0, 2π)`.
#[must_use]
pub fn is_valid_heading(heading: f64) -> bool {
    (0.0..TAU).contains(&heading)
}

/// Wrap an angle into `[0, 2π)`.
///
/// `rem_euclid` can round up to exactly `2π` for tiny negative inputs, so that
/// case folds back to zero.
///
/// # Examples
///
/// ```
/// use std::f64::consts::{PI, TAU};
/// use dubins_tour_core::normalize_heading;
///
/// assert_eq!(normalize_heading(TAU), 0.0);
/// assert!((normalize_heading(3.0 * PI) - PI).abs() < 1e-12);
/// ```
#[must_use]
pub fn normalize_heading(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}
