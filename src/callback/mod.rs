//! Single-use visitors driven by one fold-with-early-exit engine.
//!
//! A visitor strategy ([`Visit`]) receives the accumulator and one element
//! at a time, and answers with a [`Step`]: `Continue` with the new
//! accumulator, or `Stop` with the final one. [`fold_until`] drives any
//! strategy over any [`FilterableCollection`]; [`IterativeCallback`] wraps a
//! strategy with its accumulator and a single-use lifecycle.
//!
//! Ready-made callbacks:
//!
//! | Callback | Result | Stops early |
//! |----------|--------|-------------|
//! | [`Count`] | number of elements (answered from `len`) | no |
//! | [`Detector`] | whether any element exists | after the first |
//! | [`Selector`] | clones of every element, in encounter order | no |
//! | [`Collector`] | a mapped value per element, appended to a seed | no |
//! | [`MaximumRetriever`] / [`MinimumRetriever`] | the extreme element | no |
//! | [`IsEmpty`] | whether the collection is empty (answered from `is_empty`) | n/a |
//! | [`FromFn`] | whatever the closure accumulates | when the closure says so |
//! | [`HasLessThan`] | whether there are fewer than `n` elements | once `n` are seen |
//!
//! # Examples
//!
//! ```rust
//! use guarded::prelude::*;
//!
//! let words = vec!["pear", "fig", "banana"];
//!
//! let mut longest = MaximumRetriever::by(|left: &&str, right: &&str| left.len().cmp(&right.len()));
//! assert_eq!(longest.iterate(&words).unwrap(), &Some("banana"));
//!
//! let mut lengths = Collector::new(|word: &&str| word.len());
//! assert_eq!(lengths.iterate(&words).unwrap(), &vec![4, 3, 6]);
//!
//! // Callbacks are single-use.
//! assert!(lengths.iterate(&words).unwrap_err().is_invalid_state());
//! ```

mod has_less_than;
mod iterative;
mod visitors;

pub use has_less_than::{BoundedCounting, HasLessThan};
pub use iterative::{IterativeCallback, Phase};
pub use visitors::{
    Collecting, Collector, Count, Counting, Detecting, Detector, EmptinessProbe, FromFn, IsEmpty,
    Maximum, MaximumRetriever, Minimum, MinimumRetriever, Selecting, Selector, VisitFn,
};

use std::ops::ControlFlow;

use crate::collection::FilterableCollection;

/// The outcome of visiting one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step<A> {
    /// Keep going with this accumulator.
    Continue(A),
    /// Stop; this is the final accumulator.
    Stop(A),
}

impl<A> Step<A> {
    /// Returns the accumulator, whichever way the step went.
    pub fn into_inner(self) -> A {
        match self {
            Self::Continue(accumulator) | Self::Stop(accumulator) => accumulator,
        }
    }

    /// Returns `true` for [`Step::Stop`].
    pub const fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }

    /// Transforms the accumulator, keeping the direction.
    pub fn map<B>(self, function: impl FnOnce(A) -> B) -> Step<B> {
        match self {
            Self::Continue(accumulator) => Step::Continue(function(accumulator)),
            Self::Stop(accumulator) => Step::Stop(function(accumulator)),
        }
    }
}

/// Folds `collection` in encounter order until `step` stops.
///
/// Returns [`Step::Continue`] with the final accumulator if every element was
/// visited, or [`Step::Stop`] if `step` cut the traversal short.
///
/// # Examples
///
/// ```rust
/// use guarded::callback::{fold_until, Step};
///
/// // Sum until the running total exceeds 5.
/// let outcome = fold_until(&vec![1, 2, 3, 4], 0, |sum, value| {
///     let sum = sum + value;
///     if sum > 5 { Step::Stop(sum) } else { Step::Continue(sum) }
/// });
/// assert_eq!(outcome, Step::Stop(6));
/// ```
pub fn fold_until<C, A, F>(collection: &C, initial: A, mut step: F) -> Step<A>
where
    C: FilterableCollection + ?Sized,
    F: FnMut(A, &C::Item) -> Step<A>,
{
    let flow = collection.fold_elements(initial, &mut |accumulator, element| {
        match step(accumulator, element) {
            Step::Continue(next) => ControlFlow::Continue(next),
            Step::Stop(last) => ControlFlow::Break(last),
        }
    });
    match flow {
        ControlFlow::Continue(accumulator) => Step::Continue(accumulator),
        ControlFlow::Break(accumulator) => Step::Stop(accumulator),
    }
}

// =============================================================================
// Strategy traits
// =============================================================================

/// Describes a visitor strategy: what it accumulates and what it is called
/// in error messages.
pub trait Visitor {
    /// The accumulator type, which is also the callback's result.
    type Output;

    /// The name reported in state errors.
    const NAME: &'static str;
}

/// A strategy answered before any element is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut<A> {
    /// The strategy answered on its own.
    Answered(Step<A>),
    /// The strategy needs to see the elements.
    Traverse(A),
}

/// Per-element behavior of a visitor strategy over elements of type `T`.
pub trait Visit<T>: Visitor {
    /// Folds one element into the accumulator.
    fn visit(&mut self, accumulator: Self::Output, element: &T) -> Step<Self::Output>;

    /// Lets the strategy answer from the collection as a whole.
    ///
    /// The default always traverses.
    fn shortcut<C>(&mut self, accumulator: Self::Output, _collection: &C) -> Shortcut<Self::Output>
    where
        C: FilterableCollection<Item = T> + ?Sized,
    {
        Shortcut::Traverse(accumulator)
    }
}
