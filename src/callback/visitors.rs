//! The stock visitor strategies and their callback aliases.
//!
//! Each strategy is a small type implementing [`Visit`]; the public names
//! users construct (`Count`, `Detector`, ...) are [`IterativeCallback`]
//! aliases with a `new` constructor.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use super::{IterativeCallback, Shortcut, Step, Visit, Visitor};
use crate::collection::FilterableCollection;
use crate::filter::comparison::NaturalOrder;

// =============================================================================
// Count
// =============================================================================

/// Counts elements. Answers from `len` without traversing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counting;

impl Visitor for Counting {
    type Output = usize;
    const NAME: &'static str = "Count";
}

impl<T> Visit<T> for Counting {
    fn visit(&mut self, count: usize, _: &T) -> Step<usize> {
        Step::Continue(count + 1)
    }

    fn shortcut<C>(&mut self, count: usize, collection: &C) -> Shortcut<usize>
    where
        C: FilterableCollection<Item = T> + ?Sized,
    {
        Shortcut::Answered(Step::Continue(count + collection.len()))
    }
}

/// Counts the elements of a collection.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let mut count = Count::new();
/// assert_eq!(count.iterate(&vec!["a", "b", "c"]), Ok(&3));
/// ```
pub type Count = IterativeCallback<Counting>;

impl Count {
    /// Creates a count starting at zero.
    pub const fn new() -> Self {
        Self::with_visitor(Counting, 0)
    }
}

impl Default for Count {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Detector
// =============================================================================

/// Stops at the first element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detecting;

impl Visitor for Detecting {
    type Output = bool;
    const NAME: &'static str = "Detector";
}

impl<T> Visit<T> for Detecting {
    fn visit(&mut self, _: bool, _: &T) -> Step<bool> {
        Step::Stop(true)
    }
}

/// Reports whether a collection has at least one element, visiting at most
/// one.
///
/// Combined with [`IterativeCallback::iterate_filtered`] this answers "does
/// any element match".
pub type Detector = IterativeCallback<Detecting>;

impl Detector {
    /// Creates a detector that has found nothing yet.
    pub const fn new() -> Self {
        Self::with_visitor(Detecting, false)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// IsEmpty
// =============================================================================

/// Reports emptiness. Answers from `is_empty` without traversing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptinessProbe;

impl Visitor for EmptinessProbe {
    type Output = bool;
    const NAME: &'static str = "IsEmpty";
}

impl<T> Visit<T> for EmptinessProbe {
    fn visit(&mut self, _: bool, _: &T) -> Step<bool> {
        Step::Stop(false)
    }

    fn shortcut<C>(&mut self, _: bool, collection: &C) -> Shortcut<bool>
    where
        C: FilterableCollection<Item = T> + ?Sized,
    {
        Shortcut::Answered(Step::Continue(collection.is_empty()))
    }
}

/// Reports whether a collection is empty.
pub type IsEmpty = IterativeCallback<EmptinessProbe>;

impl IsEmpty {
    /// Creates an emptiness check.
    pub const fn new() -> Self {
        Self::with_visitor(EmptinessProbe, true)
    }
}

impl Default for IsEmpty {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Selector and Collector
// =============================================================================

/// Clones every element into a vector.
pub struct Selecting<T>(PhantomData<fn(&T)>);

impl<T> Visitor for Selecting<T> {
    type Output = Vec<T>;
    const NAME: &'static str = "Selector";
}

impl<T: Clone> Visit<T> for Selecting<T> {
    fn visit(&mut self, mut selected: Vec<T>, element: &T) -> Step<Vec<T>> {
        selected.push(element.clone());
        Step::Continue(selected)
    }
}

impl<T> fmt::Debug for Selecting<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Selecting")
    }
}

/// Collects clones of every element in encounter order.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let mut evens = Selector::new();
/// let result = evens.iterate_filtered(&vec![1, 2, 3, 4], &|value: &i32| value % 2 == 0);
/// assert_eq!(result, Ok(&vec![2, 4]));
/// ```
pub type Selector<T> = IterativeCallback<Selecting<T>>;

impl<T> Selector<T> {
    /// Creates a selector with an empty result.
    pub const fn new() -> Self {
        Self::with_visitor(Selecting(PhantomData), Vec::new())
    }
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps every element and appends the result.
pub struct Collecting<T, F> {
    mapper: F,
    marker: PhantomData<fn() -> T>,
}

impl<T, F> Visitor for Collecting<T, F> {
    type Output = Vec<T>;
    const NAME: &'static str = "Collector";
}

impl<S, T, F> Visit<S> for Collecting<T, F>
where
    F: FnMut(&S) -> T,
{
    fn visit(&mut self, mut collected: Vec<T>, element: &S) -> Step<Vec<T>> {
        collected.push((self.mapper)(element));
        Step::Continue(collected)
    }
}

impl<T, F> fmt::Debug for Collecting<T, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Collecting").finish_non_exhaustive()
    }
}

/// Maps every element and appends the results to a vector, which may be
/// seeded.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let mut shifted = Collector::with_accumulator(vec![0], |value: &i32| value + 1);
/// assert_eq!(shifted.iterate(&vec![1, 2]), Ok(&vec![0, 2, 3]));
/// ```
pub type Collector<T, F> = IterativeCallback<Collecting<T, F>>;

impl<T, F> Collector<T, F> {
    /// Creates a collector with an empty result.
    pub const fn new(mapper: F) -> Self {
        Self::with_accumulator(Vec::new(), mapper)
    }

    /// Creates a collector that appends to `seed`.
    pub const fn with_accumulator(seed: Vec<T>, mapper: F) -> Self {
        Self::with_visitor(
            Collecting {
                mapper,
                marker: PhantomData,
            },
            seed,
        )
    }
}

// =============================================================================
// Extremes
// =============================================================================

macro_rules! extreme_retriever {
    ($(#[$attribute:meta])* $alias:ident, $strategy:ident, $name:literal, $replace:ident) => {
        #[doc = concat!("Keeps the ", $name, " element seen so far.")]
        pub struct $strategy<T, C> {
            comparator: C,
            marker: PhantomData<fn(&T)>,
        }

        impl<T, C> Visitor for $strategy<T, C> {
            type Output = Option<T>;
            const NAME: &'static str = stringify!($alias);
        }

        impl<T, C> Visit<T> for $strategy<T, C>
        where
            T: Clone,
            C: FnMut(&T, &T) -> Ordering,
        {
            fn visit(&mut self, current: Option<T>, element: &T) -> Step<Option<T>> {
                match current {
                    Some(current) if !(self.comparator)(element, &current).$replace() => {
                        Step::Continue(Some(current))
                    }
                    _ => Step::Continue(Some(element.clone())),
                }
            }
        }

        impl<T, C> fmt::Debug for $strategy<T, C> {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(stringify!($strategy))
            }
        }

        $(#[$attribute])*
        pub type $alias<T, C = NaturalOrder<T>> = IterativeCallback<$strategy<T, C>>;

        impl<T: Ord + Clone> $alias<T> {
            #[doc = concat!("Finds the ", $name, " element in natural order.")]
            pub fn new() -> Self {
                Self::by(T::cmp)
            }
        }

        impl<T: Ord + Clone> Default for $alias<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: Clone, C: FnMut(&T, &T) -> Ordering> $alias<T, C> {
            #[doc = concat!("Finds the ", $name, " element according to `comparator`.")]
            pub const fn by(comparator: C) -> Self {
                Self::with_visitor(
                    $strategy {
                        comparator,
                        marker: PhantomData,
                    },
                    None,
                )
            }
        }
    };
}

extreme_retriever!(
    /// Retrieves the largest element; the first of equal maxima wins.
    ///
    /// The result is `None` for an empty collection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use guarded::prelude::*;
    ///
    /// let mut maximum = MaximumRetriever::new();
    /// assert_eq!(maximum.iterate(&vec![3, 9, 4]), Ok(&Some(9)));
    /// ```
    MaximumRetriever, Maximum, "largest", is_gt
);

extreme_retriever!(
    /// Retrieves the smallest element; the first of equal minima wins.
    ///
    /// The result is `None` for an empty collection.
    MinimumRetriever, Minimum, "smallest", is_lt
);

// =============================================================================
// FromFn
// =============================================================================

/// Delegates each step to a closure.
pub struct VisitFn<A, F> {
    step: F,
    marker: PhantomData<fn() -> A>,
}

impl<A, F> Visitor for VisitFn<A, F> {
    type Output = A;
    const NAME: &'static str = "FromFn";
}

impl<T, A, F> Visit<T> for VisitFn<A, F>
where
    F: FnMut(A, &T) -> Step<A>,
{
    fn visit(&mut self, accumulator: A, element: &T) -> Step<A> {
        (self.step)(accumulator, element)
    }
}

impl<A, F> fmt::Debug for VisitFn<A, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("VisitFn")
    }
}

/// A callback whose strategy is a closure.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// // Index of the first negative number.
/// let mut position = FromFn::from_fn((0, None), |(index, found): (usize, Option<usize>), value: &i32| {
///     if *value < 0 {
///         Step::Stop((index, Some(index)))
///     } else {
///         Step::Continue((index + 1, found))
///     }
/// });
/// assert_eq!(position.iterate(&vec![4, 0, -2, 7]).unwrap().1, Some(2));
/// ```
pub type FromFn<A, F> = IterativeCallback<VisitFn<A, F>>;

impl<A, F> FromFn<A, F> {
    /// Creates a callback starting from `initial` and advanced by `step`.
    pub const fn from_fn(initial: A, step: F) -> Self {
        Self::with_visitor(
            VisitFn {
                step,
                marker: PhantomData,
            },
            initial,
        )
    }
}
