//! Validated key ranges for sorted views.

use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use crate::error::{Error, Result};
use crate::failure;

/// A lower and an upper bound over an ordered type.
///
/// Ranges built through [`KeyRange::new`] (or narrowed through
/// [`KeyRange::narrow`]) never have their lower bound above their upper
/// bound. Ranges built by [`KeyRange::intersect`] may be degenerate; those
/// simply contain nothing.
///
/// # Examples
///
/// ```rust
/// use guarded::collection::KeyRange;
/// use std::ops::Bound;
///
/// let range = KeyRange::from_range(10..20).unwrap();
/// assert!(range.contains(&10));
/// assert!(!range.contains(&20));
///
/// // A nested range must stay inside its parent.
/// assert!(range.narrow(Bound::Included(12), Bound::Unbounded).is_ok());
/// assert!(range.narrow(Bound::Included(25), Bound::Unbounded).is_err());
///
/// // Inverted bounds are rejected.
/// assert!(KeyRange::new(Bound::Included(5), Bound::Included(1)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRange<T> {
    lower: Bound<T>,
    upper: Bound<T>,
}

impl<T> KeyRange<T> {
    /// The range containing every value.
    pub const fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Values `<= value`.
    pub const fn at_most(value: T) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(value),
        }
    }

    /// Values `< value`.
    pub const fn less_than(value: T) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(value),
        }
    }

    /// Values `>= value`.
    pub const fn at_least(value: T) -> Self {
        Self {
            lower: Bound::Included(value),
            upper: Bound::Unbounded,
        }
    }

    /// Values `> value`.
    pub const fn greater_than(value: T) -> Self {
        Self {
            lower: Bound::Excluded(value),
            upper: Bound::Unbounded,
        }
    }

    /// Returns the lower bound.
    pub const fn lower(&self) -> Bound<&T> {
        as_ref(&self.lower)
    }

    /// Returns the upper bound.
    pub const fn upper(&self) -> Bound<&T> {
        as_ref(&self.upper)
    }

    /// Returns both bounds, ready to pass to `BTreeMap::range`.
    pub const fn as_bounds(&self) -> (Bound<&T>, Bound<&T>) {
        (self.lower(), self.upper())
    }

    /// Returns `true` if neither side is bounded.
    pub const fn is_full(&self) -> bool {
        matches!(
            (&self.lower, &self.upper),
            (Bound::Unbounded, Bound::Unbounded)
        )
    }
}

impl<T> Default for KeyRange<T> {
    fn default() -> Self {
        Self::full()
    }
}

impl<T: Ord> KeyRange<T> {
    /// Creates a range, rejecting a lower bound above the upper bound.
    ///
    /// Equal bounds are accepted even when one side is excluded; such a range
    /// is simply empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `lower > upper`.
    pub fn new(lower: Bound<T>, upper: Bound<T>) -> Result<Self> {
        if let (Some(low), Some(high)) = (bound_value(&lower), bound_value(&upper))
            && low > high
        {
            return Err(failure::raise(Error::invalid_argument(
                "KeyRange::new",
                "lower bound is greater than upper bound",
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Creates a range from any standard range expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the start is above the end.
    pub fn from_range<R>(range: R) -> Result<Self>
    where
        R: RangeBounds<T>,
        T: Clone,
    {
        Self::new(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// Returns `true` if `value` lies within the range.
    pub fn contains(&self, value: &T) -> bool {
        let above_lower = match &self.lower {
            Bound::Included(low) => value >= low,
            Bound::Excluded(low) => value > low,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(high) => value <= high,
            Bound::Excluded(high) => value < high,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    /// Returns `true` if `value` lies within the range with both bounds
    /// treated as inclusive.
    fn contains_closed(&self, value: &T) -> bool {
        bound_value(&self.lower).is_none_or(|low| value >= low)
            && bound_value(&self.upper).is_none_or(|high| value <= high)
    }

    /// Returns `true` if no value can lie within the range.
    pub fn is_degenerate(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(low), Bound::Included(high)) => low > high,
            (
                Bound::Included(low) | Bound::Excluded(low),
                Bound::Included(high) | Bound::Excluded(high),
            ) => low >= high,
            _ => false,
        }
    }

    /// Derives a nested range.
    ///
    /// An unbounded side inherits this range's bound. A bounded side must lie
    /// inside this range; an excluded bound may also sit exactly on this
    /// range's own boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a bound falls outside this range
    /// or the resulting bounds are inverted.
    pub fn narrow(&self, lower: Bound<T>, upper: Bound<T>) -> Result<Self>
    where
        T: Clone,
    {
        let lower = self.inherit(lower, &self.lower, "lower bound out of range")?;
        let upper = self.inherit(upper, &self.upper, "upper bound out of range")?;
        Self::new(lower, upper)
    }

    fn inherit(&self, bound: Bound<T>, parent: &Bound<T>, message: &'static str) -> Result<Bound<T>>
    where
        T: Clone,
    {
        let admitted = match &bound {
            Bound::Unbounded => return Ok(parent.clone()),
            Bound::Included(value) => self.contains(value),
            Bound::Excluded(value) => self.contains_closed(value),
        };
        if admitted {
            Ok(bound)
        } else {
            Err(failure::raise(Error::invalid_argument(
                "KeyRange::narrow",
                message,
            )))
        }
    }

    /// Returns the tightest range contained in both `self` and `other`.
    ///
    /// The result may be degenerate.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        Self {
            lower: tighter(&self.lower, &other.lower, Ordering::Greater),
            upper: tighter(&self.upper, &other.upper, Ordering::Less),
        }
    }
}

const fn as_ref<T>(bound: &Bound<T>) -> Bound<&T> {
    match bound {
        Bound::Included(value) => Bound::Included(value),
        Bound::Excluded(value) => Bound::Excluded(value),
        Bound::Unbounded => Bound::Unbounded,
    }
}

const fn bound_value<T>(bound: &Bound<T>) -> Option<&T> {
    match bound {
        Bound::Included(value) | Bound::Excluded(value) => Some(value),
        Bound::Unbounded => None,
    }
}

/// Picks the more restrictive of two bounds on the same side. `preferred` is
/// the ordering a value must have relative to the other to win: `Greater`
/// for lower bounds, `Less` for upper bounds. On a tie the excluded bound
/// wins.
fn tighter<T: Ord + Clone>(left: &Bound<T>, right: &Bound<T>, preferred: Ordering) -> Bound<T> {
    match (left, right) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (
            Bound::Included(left_value) | Bound::Excluded(left_value),
            Bound::Included(right_value) | Bound::Excluded(right_value),
        ) => match left_value.cmp(right_value) {
            Ordering::Equal => {
                if matches!(left, Bound::Excluded(_)) {
                    left.clone()
                } else {
                    right.clone()
                }
            }
            ordering if ordering == preferred => left.clone(),
            _ => right.clone(),
        },
    }
}
