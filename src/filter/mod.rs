//! Composable element predicates.
//!
//! A [`Filter`] decides whether an element belongs to a filtered view. Filters
//! are immutable and stateless from the caller's point of view, so one filter
//! can be shared by any number of views and threads.
//!
//! - [`Not`]: negation
//! - [`And`]: n-ary conjunction, vacuously `true` when empty
//! - [`Or`]: n-ary disjunction, vacuously `false` when empty
//! - [`comparison`]: factories comparing elements against a target value
//!
//! Both [`And`] and [`Or`] evaluate their operands in the order they were
//! added and stop at the first operand that decides the outcome.
//!
//! # Examples
//!
//! ```rust
//! use guarded::filter::{comparison, And, Filter, FilterExt, Or};
//!
//! let small_or_large = Or::new()
//!     .with(comparison::less_than(10))
//!     .with(comparison::greater_than(100));
//! assert!(small_or_large.accept(&5));
//! assert!(!small_or_large.accept(&50));
//!
//! let even_and_positive = (|value: &i32| value % 2 == 0).and(comparison::greater_than(0));
//! assert!(even_and_positive.accept(&4));
//! assert!(!even_and_positive.accept(&-4));
//!
//! // Vacuous truth.
//! assert!(And::<i32>::new().accept(&42));
//! ```

pub mod comparison;

use smallvec::SmallVec;
use std::fmt;

/// A predicate over elements of type `T`.
///
/// Implemented for every `Fn(&T) -> bool`.
pub trait Filter<T: ?Sized> {
    /// Returns `true` if `element` passes the filter.
    fn accept(&self, element: &T) -> bool;
}

impl<T, F> Filter<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> bool,
{
    #[inline]
    fn accept(&self, element: &T) -> bool {
        self(element)
    }
}

/// A filter that can be stored in [`And`] / [`Or`] and shared across threads.
pub type BoxedFilter<T> = Box<dyn Filter<T> + Send + Sync>;

// =============================================================================
// Not
// =============================================================================

/// Negates another filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Not<F> {
    inner: F,
}

impl<F> Not<F> {
    /// Wraps `inner`.
    pub const fn new(inner: F) -> Self {
        Self { inner }
    }

    /// Returns the negated filter.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<T: ?Sized, F: Filter<T>> Filter<T> for Not<F> {
    #[inline]
    fn accept(&self, element: &T) -> bool {
        !self.inner.accept(element)
    }
}

// =============================================================================
// And / Or
// =============================================================================

/// Inline capacity before an n-ary combinator spills to the heap.
const INLINE_OPERANDS: usize = 4;

/// Accepts an element when every operand accepts it.
///
/// An empty `And` accepts everything. Operands run in insertion order and
/// evaluation stops at the first rejection.
pub struct And<T: ?Sized> {
    operands: SmallVec<[BoxedFilter<T>; INLINE_OPERANDS]>,
}

impl<T: ?Sized> And<T> {
    /// Creates an empty conjunction.
    pub fn new() -> Self {
        Self {
            operands: SmallVec::new(),
        }
    }

    /// Appends an operand.
    #[must_use]
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: Filter<T> + Send + Sync + 'static,
    {
        self.operands.push(Box::new(filter));
        self
    }

    /// Appends an already boxed operand.
    pub fn push(&mut self, filter: BoxedFilter<T>) {
        self.operands.push(filter);
    }

    /// Returns the number of operands.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Returns `true` if there are no operands.
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }
}

impl<T: ?Sized> Default for And<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> FromIterator<BoxedFilter<T>> for And<T> {
    fn from_iter<I: IntoIterator<Item = BoxedFilter<T>>>(iter: I) -> Self {
        Self {
            operands: iter.into_iter().collect(),
        }
    }
}

impl<T: ?Sized> Filter<T> for And<T> {
    fn accept(&self, element: &T) -> bool {
        self.operands.iter().all(|operand| operand.accept(element))
    }
}

impl<T: ?Sized> fmt::Debug for And<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("And")
            .field("operands", &self.operands.len())
            .finish()
    }
}

/// Accepts an element when any operand accepts it.
///
/// An empty `Or` rejects everything. Operands run in insertion order and
/// evaluation stops at the first acceptance.
pub struct Or<T: ?Sized> {
    operands: SmallVec<[BoxedFilter<T>; INLINE_OPERANDS]>,
}

impl<T: ?Sized> Or<T> {
    /// Creates an empty disjunction.
    pub fn new() -> Self {
        Self {
            operands: SmallVec::new(),
        }
    }

    /// Appends an operand.
    #[must_use]
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: Filter<T> + Send + Sync + 'static,
    {
        self.operands.push(Box::new(filter));
        self
    }

    /// Appends an already boxed operand.
    pub fn push(&mut self, filter: BoxedFilter<T>) {
        self.operands.push(filter);
    }

    /// Returns the number of operands.
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Returns `true` if there are no operands.
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }
}

impl<T: ?Sized> Default for Or<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> FromIterator<BoxedFilter<T>> for Or<T> {
    fn from_iter<I: IntoIterator<Item = BoxedFilter<T>>>(iter: I) -> Self {
        Self {
            operands: iter.into_iter().collect(),
        }
    }
}

impl<T: ?Sized> Filter<T> for Or<T> {
    fn accept(&self, element: &T) -> bool {
        self.operands.iter().any(|operand| operand.accept(element))
    }
}

impl<T: ?Sized> fmt::Debug for Or<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Or")
            .field("operands", &self.operands.len())
            .finish()
    }
}

// =============================================================================
// Binary combinators
// =============================================================================

/// Conjunction of exactly two filters, built by [`FilterExt::and`].
#[derive(Debug, Clone, Copy)]
pub struct Both<A, B> {
    first: A,
    second: B,
}

impl<T: ?Sized, A: Filter<T>, B: Filter<T>> Filter<T> for Both<A, B> {
    #[inline]
    fn accept(&self, element: &T) -> bool {
        self.first.accept(element) && self.second.accept(element)
    }
}

/// Disjunction of exactly two filters, built by [`FilterExt::or`].
#[derive(Debug, Clone, Copy)]
pub struct EitherOf<A, B> {
    first: A,
    second: B,
}

impl<T: ?Sized, A: Filter<T>, B: Filter<T>> Filter<T> for EitherOf<A, B> {
    #[inline]
    fn accept(&self, element: &T) -> bool {
        self.first.accept(element) || self.second.accept(element)
    }
}

/// Builder methods available on every filter.
pub trait FilterExt<T: ?Sized>: Filter<T> + Sized {
    /// Accepts elements accepted by both `self` and `other`; `other` only runs
    /// when `self` accepts.
    fn and<B: Filter<T>>(self, other: B) -> Both<Self, B> {
        Both {
            first: self,
            second: other,
        }
    }

    /// Accepts elements accepted by `self` or `other`; `other` only runs when
    /// `self` rejects.
    fn or<B: Filter<T>>(self, other: B) -> EitherOf<Self, B> {
        EitherOf {
            first: self,
            second: other,
        }
    }

    /// Inverts `self`.
    fn negate(self) -> Not<Self> {
        Not::new(self)
    }

    /// Boxes `self` for storage in [`And`] or [`Or`].
    fn boxed(self) -> BoxedFilter<T>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<T: ?Sized, F: Filter<T>> FilterExt<T> for F {}
