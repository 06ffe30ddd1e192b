//! The single-use callback lifecycle.

use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};

use super::{Shortcut, Step, Visit, Visitor, fold_until};
use crate::collection::FilterableCollection;
use crate::error::{Error, Result};
use crate::failure;
use crate::filter::Filter;

/// Where a callback is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not iterated yet.
    Fresh,
    /// A traversal started and did not finish, which only happens when a
    /// strategy panicked.
    Iterating,
    /// The traversal visited every element.
    Completed,
    /// The strategy stopped the traversal early.
    Broken,
}

enum State<A> {
    Fresh(A),
    Iterating,
    Completed(A),
    Broken(A),
}

/// A visitor strategy bound to its accumulator, usable for exactly one
/// traversal.
///
/// Reading the result before iterating, or iterating twice, fails with
/// [`Error::InvalidState`].
///
/// # Panics
///
/// A panic raised by the strategy is reported to the registered
/// [failure handlers](crate::failure) and then resumed. The callback is left
/// in [`Phase::Iterating`].
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let mut detector = Detector::new();
/// assert!(detector.result().is_err());
///
/// assert_eq!(detector.iterate(&vec!['a', 'b']), Ok(&true));
/// assert!(detector.was_broken());
/// ```
pub struct IterativeCallback<V: Visitor> {
    visitor: V,
    state: State<V::Output>,
}

impl<V: Visitor> IterativeCallback<V> {
    /// Binds `visitor` to its starting accumulator.
    pub const fn with_visitor(visitor: V, initial: V::Output) -> Self {
        Self {
            visitor,
            state: State::Fresh(initial),
        }
    }

    /// Returns the strategy.
    pub const fn visitor(&self) -> &V {
        &self.visitor
    }

    /// Returns the current phase.
    pub const fn phase(&self) -> Phase {
        match self.state {
            State::Fresh(_) => Phase::Fresh,
            State::Iterating => Phase::Iterating,
            State::Completed(_) => Phase::Completed,
            State::Broken(_) => Phase::Broken,
        }
    }

    /// Returns `true` once an iteration has started.
    pub const fn is_used(&self) -> bool {
        !matches!(self.state, State::Fresh(_))
    }

    /// Returns `true` if the strategy stopped its traversal early.
    pub const fn was_broken(&self) -> bool {
        matches!(self.state, State::Broken(_))
    }

    /// Returns the accumulated result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless an iteration has finished.
    pub fn result(&self) -> Result<&V::Output> {
        match &self.state {
            State::Completed(result) | State::Broken(result) => Ok(result),
            State::Fresh(_) => Err(Self::not_finished("result")),
            State::Iterating => Err(Self::interrupted("result")),
        }
    }

    /// Consumes the callback and returns the accumulated result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless an iteration has finished.
    pub fn into_result(self) -> Result<V::Output> {
        match self.state {
            State::Completed(result) | State::Broken(result) => Ok(result),
            State::Fresh(_) => Err(Self::not_finished("into_result")),
            State::Iterating => Err(Self::interrupted("into_result")),
        }
    }

    /// Runs the strategy over `collection` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the callback was already used.
    pub fn iterate<C>(&mut self, collection: &C) -> Result<&V::Output>
    where
        C: FilterableCollection + ?Sized,
        V: Visit<C::Item>,
    {
        let initial = match mem::replace(&mut self.state, State::Iterating) {
            State::Fresh(initial) => initial,
            used => {
                self.state = used;
                return Err(Self::already_used("iterate"));
            }
        };
        tracing::trace!(visitor = V::NAME, "iteration started");

        let visitor = &mut self.visitor;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            match visitor.shortcut(initial, collection) {
                Shortcut::Answered(step) => step,
                Shortcut::Traverse(accumulator) => {
                    fold_until(collection, accumulator, |accumulator, element| {
                        visitor.visit(accumulator, element)
                    })
                }
            }
        }));

        match outcome {
            Ok(Step::Continue(result)) => self.state = State::Completed(result),
            Ok(Step::Stop(result)) => self.state = State::Broken(result),
            Err(payload) => {
                failure::report_panic(V::NAME, &*payload);
                panic::resume_unwind(payload);
            }
        }
        tracing::trace!(visitor = V::NAME, phase = ?self.phase(), "iteration finished");
        self.result()
    }

    /// Runs the strategy over the elements of `collection` that satisfy
    /// `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the callback was already used. The
    /// filter is not evaluated in that case.
    pub fn iterate_filtered<C, F>(&mut self, collection: &C, filter: &F) -> Result<&V::Output>
    where
        C: FilterableCollection + ?Sized,
        F: Filter<C::Item> + ?Sized,
        V: Visit<C::Item>,
    {
        if self.is_used() {
            return Err(Self::already_used("iterate_filtered"));
        }
        let filtered = collection.filter(filter);
        self.iterate(&filtered)
    }

    fn already_used(method: &'static str) -> Error {
        failure::raise(Error::invalid_state(
            V::NAME,
            method,
            "callback has already been used",
        ))
    }

    fn not_finished(method: &'static str) -> Error {
        failure::raise(Error::invalid_state(
            V::NAME,
            method,
            "callback has not been iterated",
        ))
    }

    fn interrupted(method: &'static str) -> Error {
        failure::raise(Error::invalid_state(
            V::NAME,
            method,
            "iteration was interrupted by a panic",
        ))
    }
}

impl<V: Visitor> fmt::Debug for IterativeCallback<V>
where
    V::Output: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct(V::NAME);
        match &self.state {
            State::Fresh(accumulator) => debug.field("fresh", accumulator),
            State::Iterating => debug.field("phase", &Phase::Iterating),
            State::Completed(result) => debug.field("completed", result),
            State::Broken(result) => debug.field("broken", result),
        };
        debug.finish()
    }
}
