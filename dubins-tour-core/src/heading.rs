//! Random heading assignment.
//!
//! Every trial of the search draws a fresh heading for each waypoint except
//! the origin, whose heading is fixed by the caller. The generator is always
//! supplied by the caller so a search can be replayed from its seed.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::waypoint::{Waypoint, normalize_heading};

/// Draws independent headings uniformly from `[0, 2π)`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use dubins_tour_core::{HeadingSampler, Waypoint};
///
/// let waypoints = [
///     Waypoint::new(0, Coord { x: 0.0, y: 0.0 }),
///     Waypoint::new(1, Coord { x: 5.0, y: 0.0 }),
/// ];
/// let mut rng = ChaCha8Rng::seed_from_u64(3);
/// let headings = HeadingSampler::new().sample(&waypoints, 1.0, true, &mut rng);
/// assert_eq!(headings.len(), 2);
/// assert_eq!(headings[0], 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HeadingSampler {
    distribution: Uniform<f64>,
}

impl Default for HeadingSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingSampler {
    /// Sampler over the full circle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            distribution: Uniform::new(0.0, TAU),
        }
    }

    /// Draw a single heading.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        normalize_heading(self.distribution.sample(rng))
    }

    /// Assign a heading to every waypoint.
    ///
    /// The first waypoint is the origin. When `skip_origin` is set it keeps
    /// `origin_heading`; otherwise it is drawn like the rest. An empty slice
    /// yields an empty assignment.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        waypoints: &[Waypoint],
        origin_heading: f64,
        skip_origin: bool,
        rng: &mut R,
    ) -> Vec<f64> {
        waypoints
            .iter()
            .enumerate()
            .map(|(index, _)| {
                if skip_origin && index == 0 {
                    origin_heading
                } else {
                    self.draw(rng)
                }
            })
            .collect()
    }
}
