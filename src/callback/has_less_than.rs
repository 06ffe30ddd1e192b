//! Bounded counting.

use super::{IterativeCallback, Phase, Shortcut, Step, Visit, Visitor};
use crate::collection::FilterableCollection;
use crate::error::Result;

/// Counts elements up to a bound and stops there.
#[derive(Debug, Clone, Copy)]
pub struct BoundedCounting {
    bound: usize,
}

impl Visitor for BoundedCounting {
    type Output = usize;
    const NAME: &'static str = "HasLessThan";
}

impl<T> Visit<T> for BoundedCounting {
    fn visit(&mut self, count: usize, _: &T) -> Step<usize> {
        let count = count + 1;
        if count >= self.bound {
            Step::Stop(count)
        } else {
            Step::Continue(count)
        }
    }

    fn shortcut<C>(&mut self, count: usize, _: &C) -> Shortcut<usize>
    where
        C: FilterableCollection<Item = T> + ?Sized,
    {
        if self.bound == 0 {
            Shortcut::Answered(Step::Stop(count))
        } else {
            Shortcut::Traverse(count)
        }
    }
}

/// Answers "does this collection have fewer than `bound` elements" while
/// visiting at most `bound` of them.
///
/// Unlike the other callbacks, `iterate` consumes the instance. Iterating an
/// instance that was already used starts a fresh one whose bound is what
/// remained: `bound - count`. That lets one bound be spread over several
/// collections.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let fewer = HasLessThan::new(3).iterate(&vec![1, 2]).unwrap();
/// assert_eq!(fewer.has_less(), Ok(true));
///
/// // Two elements are used up by the first vector, one remains.
/// let spread = HasLessThan::new(3)
///     .iterate(&vec!['a', 'b'])
///     .and_then(|first| first.iterate(&vec!['c']))
///     .unwrap();
/// assert_eq!(spread.bound(), 1);
/// assert_eq!(spread.has_less(), Ok(false));
/// ```
#[derive(Debug)]
pub struct HasLessThan {
    callback: IterativeCallback<BoundedCounting>,
}

impl HasLessThan {
    /// Creates a check against `bound`. A bound of zero is never satisfied.
    pub const fn new(bound: usize) -> Self {
        Self {
            callback: IterativeCallback::with_visitor(BoundedCounting { bound }, 0),
        }
    }

    /// Returns the bound this instance checks against.
    pub const fn bound(&self) -> usize {
        self.callback.visitor().bound
    }

    /// Returns the current phase.
    pub const fn phase(&self) -> Phase {
        self.callback.phase()
    }

    /// Counts up to the bound over `collection`.
    ///
    /// A used instance is replaced by a fresh one with the residual bound
    /// before counting.
    ///
    /// # Errors
    ///
    /// Propagates state errors from the underlying callback; a fresh instance
    /// never produces one.
    pub fn iterate<C>(self, collection: &C) -> Result<Self>
    where
        C: FilterableCollection + ?Sized,
    {
        let mut next = if self.callback.is_used() {
            let counted = *self.callback.result()?;
            Self::new(self.bound().saturating_sub(counted))
        } else {
            self
        };
        next.callback.iterate(collection)?;
        Ok(next)
    }

    /// Returns `true` if fewer than `bound` elements were counted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`](crate::Error::InvalidState) before
    /// [`iterate`](Self::iterate).
    pub fn has_less(&self) -> Result<bool> {
        let bound = self.bound();
        self.count().map(|count| count < bound)
    }

    /// Returns how many elements were counted, at most `bound`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`](crate::Error::InvalidState) before
    /// [`iterate`](Self::iterate).
    pub fn count(&self) -> Result<usize> {
        self.callback.result().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter::comparison;
    use rstest::rstest;
    use std::collections::BTreeSet;

    #[rstest]
    #[case::fewer(3, vec![1, 2], true, 2)]
    #[case::equal(2, vec![1, 2], false, 2)]
    #[case::more_stops_at_bound(2, vec![1, 2, 3], false, 2)]
    #[case::zero_bound(0, vec![1], false, 0)]
    #[case::zero_bound_empty(0, vec![], false, 0)]
    #[case::empty(1, vec![], true, 0)]
    fn has_less(
        #[case] bound: usize,
        #[case] elements: Vec<i32>,
        #[case] expected: bool,
        #[case] counted: usize,
    ) {
        let checked = HasLessThan::new(bound).iterate(&elements).unwrap();
        assert_eq!(checked.has_less(), Ok(expected));
        assert_eq!(checked.count(), Ok(counted));
    }

    #[rstest]
    fn reading_before_iterate_is_invalid_state() {
        let unused = HasLessThan::new(4);
        assert_eq!(
            unused.has_less(),
            Err(Error::invalid_state(
                "HasLessThan",
                "result",
                "callback has not been iterated"
            ))
        );
        assert!(unused.count().unwrap_err().is_invalid_state());
    }

    #[rstest]
    fn reuse_carries_the_residual_bound() {
        let first = HasLessThan::new(5).iterate(&vec![1, 2]).unwrap();
        assert_eq!(first.phase(), Phase::Completed);
        let second = first.iterate(&BTreeSet::from([7, 8])).unwrap();
        assert_eq!(second.bound(), 3);
        assert_eq!(second.has_less(), Ok(true));
    }

    #[rstest]
    fn works_with_filtered_collections() {
        let large = vec![1, 5, 9, 12].filter(&comparison::greater_than(4));
        let checked = HasLessThan::new(4).iterate(&large).unwrap();
        assert_eq!(checked.count(), Ok(3));
        assert_eq!(checked.has_less(), Ok(true));
    }
}
