//! Validated visiting orders.

use thiserror::Error;

/// Ways in which a candidate visiting order fails to be a tour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    /// The order does not list every waypoint exactly once.
    #[error("ordering has {actual} entries, expected {expected}")]
    WrongLength {
        /// Number of waypoints.
        expected: usize,
        /// Number of entries returned.
        actual: usize,
    },
    /// An index does not name a waypoint.
    #[error("index {index} is out of range for {len} waypoints")]
    OutOfRange {
        /// Offending index.
        index: usize,
        /// Number of waypoints.
        len: usize,
    },
    /// An index appears more than once.
    #[error("waypoint {index} is visited more than once")]
    Duplicate {
        /// Repeated index.
        index: usize,
    },
    /// The order does not begin at the origin.
    #[error("ordering starts at {first:?}, expected the origin {origin}")]
    MissingOrigin {
        /// First entry, if any.
        first: Option<usize>,
        /// Required first entry.
        origin: usize,
    },
}

/// A permutation of waypoint indices beginning at the origin.
///
/// # Examples
///
/// ```
/// use dubins_tour_core::{Ordering, OrderingError};
///
/// let tour = Ordering::new(vec![0, 2, 1], 3).expect("valid tour");
/// assert_eq!(tour.indices(), &[0, 2, 1]);
///
/// let err = Ordering::new(vec![0, 2, 2], 3).unwrap_err();
/// assert_eq!(err, OrderingError::Duplicate { index: 2 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ordering {
    indices: Vec<usize>,
}

impl Ordering {
    /// Index every tour starts from.
    pub const ORIGIN: usize = 0;

    /// Validate `indices` as a tour over `len` waypoints.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderingError`] found, checking length, range and
    /// duplicates before the starting index.
    pub fn new(indices: Vec<usize>, len: usize) -> Result<Self, OrderingError> {
        if indices.len() != len {
            return Err(OrderingError::WrongLength {
                expected: len,
                actual: indices.len(),
            });
        }
        let mut seen = vec![false; len];
        for &index in &indices {
            let slot = seen
                .get_mut(index)
                .ok_or(OrderingError::OutOfRange { index, len })?;
            if *slot {
                return Err(OrderingError::Duplicate { index });
            }
            *slot = true;
        }
        let first = indices.first().copied();
        if first != Some(Self::ORIGIN) {
            return Err(OrderingError::MissingOrigin {
                first,
                origin: Self::ORIGIN,
            });
        }
        Ok(Self { indices })
    }

    /// The order `0, 1, …, len - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::MissingOrigin`] when `len` is zero.
    pub fn identity(len: usize) -> Result<Self, OrderingError> {
        Self::new((0..len).collect(), len)
    }

    /// Waypoint indices in visiting order.
    #[must_use]
    pub const fn indices(&self) -> &[usize] {
        self.indices.as_slice()
    }

    /// Number of waypoints visited.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always `false`; a valid ordering contains the origin.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Last waypoint visited before any closing leg.
    #[must_use]
    pub fn last(&self) -> usize {
        self.indices.last().copied().unwrap_or(Self::ORIGIN)
    }

    /// Consecutive `(from, to)` legs, followed by the closing leg back to the
    /// origin when `close_loop` is set.
    pub fn legs(&self, close_loop: bool) -> impl Iterator<Item = (usize, usize)> + '_ {
        let closing = close_loop
            .then(|| (self.last(), Self::ORIGIN))
            .filter(|(from, to)| from != to);
        self.indices
            .windows(2)
            .filter_map(|pair| match pair {
                [from, to] => Some((*from, *to)),
                _ => None,
            })
            .chain(closing)
    }

    /// Consume the ordering, returning its indices.
    #[must_use]
    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }
}

impl AsRef<[usize]> for Ordering {
    fn as_ref(&self) -> &[usize] {
        &self.indices
    }
}
