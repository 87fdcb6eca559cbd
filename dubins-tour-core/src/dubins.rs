//! Shortest paths for a forward-only vehicle with a minimum turning radius.
//!
//! A Dubins path joins two poses with at most three segments, each either a
//! circular arc of radius `r` turning left or right, or a straight line. Six
//! families cover every optimal path: four curve-straight-curve words (LSL,
//! LSR, RSL, RSR) and two curve-curve-curve words (RLR, LRL).
//!
//! Each family is solved in normalised coordinates where the start sits at
//! the origin, the end lies on the positive x-axis at distance `d = D / r`,
//! and both headings are measured relative to the line joining the two
//! positions. A family yields three non-negative segment parameters; the path
//! length is their sum scaled by `r`.

#![expect(
    clippy::float_arithmetic,
    reason = "Dubins geometry is closed-form trigonometry over f64"
)]

use std::f64::consts::TAU;

use geo::Coord;
use thiserror::Error;

use crate::waypoint::{Pose, Waypoint, normalize_heading};

/// Errors returned when building a [`DubinsPath`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DubinsError {
    /// The turning radius was zero, negative or not finite.
    #[error("turning radius must be positive and finite, got {radius}")]
    InvalidTurningRadius {
        /// Offending radius.
        radius: f64,
    },
    /// A pose contained a non-finite coordinate or heading.
    #[error("poses must have finite coordinates and headings")]
    NonFinitePose,
    /// The requested family has no geometric solution for these poses.
    #[error("{family:?} has no solution for the given poses")]
    PathFamilyInfeasible {
        /// Family that was requested.
        family: PathFamily,
    },
    /// None of the six families admits a solution.
    #[error("no Dubins path family admits a solution")]
    NoFeasiblePath,
}

/// Direction of travel along one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentKind {
    /// Anticlockwise arc.
    Left,
    /// Straight line.
    Straight,
    /// Clockwise arc.
    Right,
}

/// The six Dubins path words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathFamily {
    /// Left, straight, left.
    Lsl,
    /// Left, straight, right.
    Lsr,
    /// Right, straight, left.
    Rsl,
    /// Right, straight, right.
    Rsr,
    /// Right, left, right.
    Rlr,
    /// Left, right, left.
    Lrl,
}

impl PathFamily {
    /// Every family, in evaluation order.
    pub const ALL: [Self; 6] = [
        Self::Lsl,
        Self::Lsr,
        Self::Rsl,
        Self::Rsr,
        Self::Rlr,
        Self::Lrl,
    ];

    /// Segment kinds making up this family.
    #[must_use]
    pub const fn kinds(self) -> [SegmentKind; 3] {
        use SegmentKind::{Left, Right, Straight};
        match self {
            Self::Lsl => [Left, Straight, Left],
            Self::Lsr => [Left, Straight, Right],
            Self::Rsl => [Right, Straight, Left],
            Self::Rsr => [Right, Straight, Right],
            Self::Rlr => [Right, Left, Right],
            Self::Lrl => [Left, Right, Left],
        }
    }
}

/// One materialised segment of a [`DubinsPath`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Arc direction or straight.
    pub kind: SegmentKind,
    /// Length in world units.
    pub length: f64,
    /// Pose at the start of the segment.
    pub start: Pose,
    /// Pose at the end of the segment.
    pub end: Pose,
}

/// Shortest path between two poses for a given family and turning radius.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::{DubinsPath, PathFamily, Pose};
///
/// # fn main() -> Result<(), dubins_tour_core::DubinsError> {
/// let path = DubinsPath::shortest(Pose::new(0.0, 0.0, 0.0), Pose::new(10.0, 0.0, 0.0), 1.0)?;
/// assert!((path.length() - 10.0).abs() < 1e-9);
/// assert_eq!(path.family(), PathFamily::Lsl);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DubinsPath {
    start: Pose,
    radius: f64,
    family: PathFamily,
    /// Normalised segment parameters: arc angles in radians, straight length
    /// in multiples of the radius.
    params: [f64; 3],
}

/// Slack for square roots and arc cosines of quantities that are zero or one
/// in exact arithmetic, such as tangent circles.
const FEASIBILITY_SLACK: f64 = 1e-10;

/// Quantities shared by every family for a given pose pair.
struct Normalised {
    alpha: f64,
    beta: f64,
    d: f64,
    sa: f64,
    sb: f64,
    ca: f64,
    cb: f64,
    c_ab: f64,
    d_sq: f64,
}

impl Normalised {
    fn new(start: &Pose, end: &Pose, radius: f64) -> Self {
        let dx = end.position.x - start.position.x;
        let dy = end.position.y - start.position.y;
        let d = dx.hypot(dy) / radius;
        let theta = if d > 0.0 {
            normalize_heading(dy.atan2(dx))
        } else {
            0.0
        };
        let alpha = normalize_heading(start.heading - theta);
        let beta = normalize_heading(end.heading - theta);
        let (sa, ca) = alpha.sin_cos();
        let (sb, cb) = beta.sin_cos();
        Self {
            alpha,
            beta,
            d,
            sa,
            sb,
            ca,
            cb,
            c_ab: (alpha - beta).cos(),
            d_sq: d * d,
        }
    }

    fn solve(&self, family: PathFamily) -> Option<[f64; 3]> {
        match family {
            PathFamily::Lsl => self.lsl(),
            PathFamily::Lsr => self.lsr(),
            PathFamily::Rsl => self.rsl(),
            PathFamily::Rsr => self.rsr(),
            PathFamily::Rlr => self.rlr(),
            PathFamily::Lrl => self.lrl(),
        }
    }

    fn lsl(&self) -> Option<[f64; 3]> {
        let tmp0 = self.d + self.sa - self.sb;
        let p_sq = 2.0 + self.d_sq - 2.0 * self.c_ab + 2.0 * self.d * (self.sa - self.sb);
        if p_sq < -FEASIBILITY_SLACK {
            return None;
        }
        let tmp1 = (self.cb - self.ca).atan2(tmp0);
        Some([
            normalize_heading(tmp1 - self.alpha),
            p_sq.max(0.0).sqrt(),
            normalize_heading(self.beta - tmp1),
        ])
    }

    fn rsr(&self) -> Option<[f64; 3]> {
        let tmp0 = self.d - self.sa + self.sb;
        let p_sq = 2.0 + self.d_sq - 2.0 * self.c_ab + 2.0 * self.d * (self.sb - self.sa);
        if p_sq < -FEASIBILITY_SLACK {
            return None;
        }
        let tmp1 = (self.ca - self.cb).atan2(tmp0);
        Some([
            normalize_heading(self.alpha - tmp1),
            p_sq.max(0.0).sqrt(),
            normalize_heading(tmp1 - self.beta),
        ])
    }

    fn lsr(&self) -> Option<[f64; 3]> {
        let p_sq = -2.0 + self.d_sq + 2.0 * self.c_ab + 2.0 * self.d * (self.sa + self.sb);
        if p_sq < -FEASIBILITY_SLACK {
            return None;
        }
        let p = p_sq.max(0.0).sqrt();
        let tmp0 = (-self.ca - self.cb).atan2(self.d + self.sa + self.sb) - (-2.0_f64).atan2(p);
        Some([
            normalize_heading(tmp0 - self.alpha),
            p,
            normalize_heading(tmp0 - self.beta),
        ])
    }

    fn rsl(&self) -> Option<[f64; 3]> {
        let p_sq = -2.0 + self.d_sq + 2.0 * self.c_ab - 2.0 * self.d * (self.sa + self.sb);
        if p_sq < -FEASIBILITY_SLACK {
            return None;
        }
        let p = p_sq.max(0.0).sqrt();
        let tmp0 = (self.ca + self.cb).atan2(self.d - self.sa - self.sb) - 2.0_f64.atan2(p);
        Some([
            normalize_heading(self.alpha - tmp0),
            p,
            normalize_heading(self.beta - tmp0),
        ])
    }

    fn rlr(&self) -> Option<[f64; 3]> {
        let tmp0 =
            (6.0 - self.d_sq + 2.0 * self.c_ab + 2.0 * self.d * (self.sa - self.sb)) / 8.0;
        if tmp0.abs() > 1.0 + FEASIBILITY_SLACK {
            return None;
        }
        let phi = (self.ca - self.cb).atan2(self.d - self.sa + self.sb);
        let p = normalize_heading(TAU - tmp0.clamp(-1.0, 1.0).acos());
        let t = normalize_heading(self.alpha - phi + normalize_heading(p / 2.0));
        Some([t, p, normalize_heading(self.alpha - self.beta - t + p)])
    }

    fn lrl(&self) -> Option<[f64; 3]> {
        let tmp0 =
            (6.0 - self.d_sq + 2.0 * self.c_ab + 2.0 * self.d * (self.sb - self.sa)) / 8.0;
        if tmp0.abs() > 1.0 + FEASIBILITY_SLACK {
            return None;
        }
        let phi = (self.ca - self.cb).atan2(self.d + self.sa - self.sb);
        let p = normalize_heading(TAU - tmp0.clamp(-1.0, 1.0).acos());
        let t = normalize_heading(-self.alpha - phi + p / 2.0);
        Some([t, p, normalize_heading(self.beta - self.alpha - t + p)])
    }
}

fn validate_inputs(start: &Pose, end: &Pose, radius: f64) -> Result<(), DubinsError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(DubinsError::InvalidTurningRadius { radius });
    }
    let finite = [
        start.position.x,
        start.position.y,
        start.heading,
        end.position.x,
        end.position.y,
        end.heading,
    ]
    .iter()
    .all(|value| value.is_finite());
    if !finite {
        return Err(DubinsError::NonFinitePose);
    }
    Ok(())
}

impl DubinsPath {
    /// Shortest path over all six families.
    ///
    /// Ties keep the earliest family in [`PathFamily::ALL`].
    ///
    /// # Errors
    ///
    /// Returns [`DubinsError::InvalidTurningRadius`] or
    /// [`DubinsError::NonFinitePose`] for invalid input, and
    /// [`DubinsError::NoFeasiblePath`] if no family has a solution.
    pub fn shortest(start: Pose, end: Pose, radius: f64) -> Result<Self, DubinsError> {
        validate_inputs(&start, &end, radius)?;
        let normalised = Normalised::new(&start, &end, radius);
        let mut best: Option<(PathFamily, [f64; 3], f64)> = None;
        for family in PathFamily::ALL {
            let Some(params) = normalised.solve(family) else {
                continue;
            };
            let cost = params.iter().sum::<f64>();
            if best.is_none_or(|(_, _, best_cost)| cost < best_cost) {
                best = Some((family, params, cost));
            }
        }
        let (family, params, _) = best.ok_or(DubinsError::NoFeasiblePath)?;
        Ok(Self {
            start,
            radius,
            family,
            params,
        })
    }

    /// Path of a specific family.
    ///
    /// # Errors
    ///
    /// Returns [`DubinsError::PathFamilyInfeasible`] when the family has no
    /// solution, or an input validation error as for [`Self::shortest`].
    pub fn from_family(
        start: Pose,
        end: Pose,
        radius: f64,
        family: PathFamily,
    ) -> Result<Self, DubinsError> {
        validate_inputs(&start, &end, radius)?;
        let params = Normalised::new(&start, &end, radius)
            .solve(family)
            .ok_or(DubinsError::PathFamilyInfeasible { family })?;
        Ok(Self {
            start,
            radius,
            family,
            params,
        })
    }

    /// Total path length in world units.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.params.iter().sum::<f64>() * self.radius
    }

    /// Family of this path.
    #[must_use]
    pub const fn family(&self) -> PathFamily {
        self.family
    }

    /// Turning radius used to build the path.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Start pose.
    #[must_use]
    pub const fn start(&self) -> Pose {
        self.start
    }

    /// Pose reached after travelling the whole path.
    #[must_use]
    pub fn end_pose(&self) -> Pose {
        let [_, _, last] = self.segments();
        last.end
    }

    /// The three segments with their world-space endpoints.
    ///
    /// Zero-length segments are kept so the family word stays intact.
    #[must_use]
    pub fn segments(&self) -> [Segment; 3] {
        let kinds = self.family.kinds();
        let mut pose = self.start;
        let mut out = [Segment {
            kind: SegmentKind::Straight,
            length: 0.0,
            start: pose,
            end: pose,
        }; 3];
        for ((slot, kind), param) in out.iter_mut().zip(kinds).zip(self.params) {
            let end = advance(pose, kind, param, self.radius);
            *slot = Segment {
                kind,
                length: param * self.radius,
                start: pose,
                end,
            };
            pose = end;
        }
        out
    }

    /// Pose after travelling `distance` along the path.
    ///
    /// `distance` is clamped to `[0, length]`.
    #[must_use]
    pub fn sample(&self, distance: f64) -> Pose {
        let mut remaining = (distance / self.radius).clamp(0.0, self.params.iter().sum::<f64>());
        let mut pose = self.start;
        for (kind, param) in self.family.kinds().into_iter().zip(self.params) {
            let step = remaining.min(param);
            pose = advance(pose, kind, step, self.radius);
            remaining -= step;
            if remaining <= 0.0 {
                break;
            }
        }
        pose
    }

    /// Poses every `step` world units from the start, ending with the final
    /// pose.
    ///
    /// Returns only the start and end poses when `step` is not positive.
    #[must_use]
    pub fn sample_many(&self, step: f64) -> Vec<Pose> {
        let length = self.length();
        let mut poses = vec![self.start];
        if step.is_finite() && step > 0.0 {
            let mut travelled = step;
            while travelled < length {
                poses.push(self.sample(travelled));
                travelled += step;
            }
        }
        if length > 0.0 {
            poses.push(self.end_pose());
        }
        poses
    }
}

/// Move `param` normalised units from `pose` along a segment of `kind`.
fn advance(pose: Pose, kind: SegmentKind, param: f64, radius: f64) -> Pose {
    let Coord { x, y } = pose.position;
    let heading = pose.heading;
    let (position, next_heading) = match kind {
        SegmentKind::Left => (
            Coord {
                x: x + radius * ((heading + param).sin() - heading.sin()),
                y: y + radius * (heading.cos() - (heading + param).cos()),
            },
            heading + param,
        ),
        SegmentKind::Right => (
            Coord {
                x: x + radius * (heading.sin() - (heading - param).sin()),
                y: y + radius * ((heading - param).cos() - heading.cos()),
            },
            heading - param,
        ),
        SegmentKind::Straight => (
            Coord {
                x: x + radius * param * heading.cos(),
                y: y + radius * param * heading.sin(),
            },
            heading,
        ),
    };
    Pose {
        position,
        heading: normalize_heading(next_heading),
    }
}

/// Length of the shortest Dubins path between two oriented waypoints.
///
/// # Errors
///
/// Propagates [`DubinsError`] from [`DubinsPath::shortest`].
///
/// # Examples
///
/// ```
/// use std::f64::consts::PI;
/// use geo::Coord;
/// use dubins_tour_core::{Waypoint, dubins_length};
///
/// # fn main() -> Result<(), dubins_tour_core::DubinsError> {
/// let a = Waypoint::new(0, Coord { x: 0.0, y: 0.0 });
/// let b = Waypoint::new(1, Coord { x: 0.0, y: 2.0 });
/// let length = dubins_length(&a, 0.0, &b, PI, 1.0)?;
/// assert!((length - PI).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
pub fn dubins_length(
    from: &Waypoint,
    from_heading: f64,
    to: &Waypoint,
    to_heading: f64,
    radius: f64,
) -> Result<f64, DubinsError> {
    DubinsPath::shortest(Pose::at(from, from_heading), Pose::at(to, to_heading), radius)
        .map(|path| path.length())
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    reason = "tests index fixed three-segment paths"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[rstest]
    fn straight_line_is_lsl_with_zero_arcs() {
        let path = DubinsPath::shortest(Pose::new(0.0, 0.0, 0.0), Pose::new(10.0, 0.0, 0.0), 1.0)
            .expect("straight path exists");
        assert_close(path.length(), 10.0);
        let segments = path.segments();
        assert_close(segments[0].length, 0.0);
        assert_close(segments[1].length, 10.0);
        assert_close(segments[2].length, 0.0);
    }

    #[rstest]
    fn half_circle_to_the_left() {
        let start = Pose::new(0.0, 0.0, 0.0);
        let end = Pose::new(0.0, 2.0, PI);
        let path = DubinsPath::shortest(start, end, 1.0).expect("half circle exists");
        assert_close(path.length(), PI);
        let reached = path.end_pose();
        assert_close(reached.position.x, 0.0);
        assert_close(reached.position.y, 2.0);
        assert_close(reached.heading, PI);
    }

    #[rstest]
    #[case(0.5)]
    #[case(1.0)]
    #[case(3.0)]
    fn radius_scales_turning_paths(#[case] radius: f64) {
        let start = Pose::new(0.0, 0.0, 0.0);
        let end = Pose::new(0.0, 2.0 * radius, PI);
        let path = DubinsPath::shortest(start, end, radius).expect("path exists");
        assert_close(path.length(), PI * radius);
    }

    #[rstest]
    #[case(Pose::new(0.0, 0.0, 0.0), Pose::new(4.0, 3.0, FRAC_PI_2))]
    #[case(Pose::new(1.0, -2.0, 2.5), Pose::new(-3.0, 5.0, 0.3))]
    #[case(Pose::new(0.0, 0.0, 1.0), Pose::new(0.5, 0.2, 4.0))]
    #[case(Pose::new(2.0, 2.0, 6.0), Pose::new(2.0, 2.0, 3.0))]
    fn every_family_ends_at_the_target(#[case] start: Pose, #[case] end: Pose) {
        for family in PathFamily::ALL {
            let Ok(path) = DubinsPath::from_family(start, end, 1.0, family) else {
                continue;
            };
            let reached = path.end_pose();
            assert!(
                (reached.position.x - end.position.x).abs() < 1e-6
                    && (reached.position.y - end.position.y).abs() < 1e-6,
                "{family:?} ended at {reached:?}, expected {end:?}"
            );
            let heading_gap = normalize_heading(reached.heading - end.heading);
            assert!(heading_gap < 1e-6 || TAU - heading_gap < 1e-6);
        }
    }

    #[rstest]
    fn shortest_is_no_longer_than_any_family() {
        let start = Pose::new(0.0, 0.0, 1.2);
        let end = Pose::new(3.0, -1.0, 5.1);
        let best = DubinsPath::shortest(start, end, 1.5).expect("path exists");
        for family in PathFamily::ALL {
            if let Ok(path) = DubinsPath::from_family(start, end, 1.5, family) {
                assert!(best.length() <= path.length() + EPS);
            }
        }
    }

    #[rstest]
    fn curve_curve_curve_is_infeasible_for_distant_poses() {
        let err = DubinsPath::from_family(
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(100.0, 0.0, 0.0),
            1.0,
            PathFamily::Rlr,
        )
        .expect_err("RLR cannot span 100 radii");
        assert_eq!(
            err,
            DubinsError::PathFamilyInfeasible {
                family: PathFamily::Rlr
            }
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_radius(#[case] radius: f64) {
        let err = DubinsPath::shortest(Pose::new(0.0, 0.0, 0.0), Pose::new(1.0, 0.0, 0.0), radius)
            .expect_err("radius must be rejected");
        assert!(matches!(err, DubinsError::InvalidTurningRadius { .. }));
    }

    #[rstest]
    fn rejects_non_finite_pose() {
        let start = Pose {
            position: Coord {
                x: f64::INFINITY,
                y: 0.0,
            },
            heading: 0.0,
        };
        let err = DubinsPath::shortest(start, Pose::new(1.0, 0.0, 0.0), 1.0)
            .expect_err("infinite pose must be rejected");
        assert_eq!(err, DubinsError::NonFinitePose);
    }

    #[rstest]
    fn sampling_walks_the_path() {
        let path = DubinsPath::shortest(Pose::new(0.0, 0.0, 0.0), Pose::new(10.0, 0.0, 0.0), 1.0)
            .expect("path exists");
        let midpoint = path.sample(5.0);
        assert_close(midpoint.position.x, 5.0);
        assert_close(midpoint.position.y, 0.0);

        let poses = path.sample_many(2.5);
        assert_eq!(poses.len(), 5);
        let last = poses.last().expect("end pose");
        assert_close(last.position.x, 10.0);
    }

    #[rstest]
    fn sample_clamps_beyond_the_end() {
        let path = DubinsPath::shortest(Pose::new(0.0, 0.0, 0.0), Pose::new(0.0, 2.0, PI), 1.0)
            .expect("path exists");
        let beyond = path.sample(100.0);
        assert_close(beyond.position.y, 2.0);
    }
}
