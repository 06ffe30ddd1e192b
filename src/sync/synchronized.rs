//! The root decorator.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{GuardedView, Lock};
use crate::collection::{Container, FilterableCollection};
use crate::filter::Filter;

/// A container whose every operation runs under a [`Lock`].
///
/// `Synchronized` is a handle: cloning it yields another handle to the same
/// container and the same guard, like cloning an `Arc`. Which operations are
/// available depends on what the wrapped container can do:
///
/// | Container implements | Operations come from |
/// |----------------------|----------------------|
/// | [`MutableCollection`](crate::collection::MutableCollection) | [`GuardedCollection`](super::GuardedCollection) |
/// | [`SortedSet`](crate::collection::SortedSet) | [`GuardedSortedSet`](super::GuardedSortedSet) |
/// | [`MapCollection`](crate::collection::MapCollection) | [`GuardedMap`](super::GuardedMap) |
/// | [`SortedMap`](crate::collection::SortedMap) | [`GuardedSortedMap`](super::GuardedSortedMap) |
/// | [`BidiMap`](crate::collection::BidiMap) | [`GuardedBidiMap`](super::GuardedBidiMap) |
/// | [`SortedBidiMap`](crate::collection::SortedBidiMap) | [`GuardedSortedBidiMap`](super::GuardedSortedBidiMap) |
/// | [`Transactional`](crate::collection::Transactional) | [`GuardedTransactional`](super::GuardedTransactional) |
///
/// Results are returned by value (cloned out of the container) so that no
/// borrow outlives the guard. Iteration works on a point-in-time copy; hold
/// [`Lock::acquire`] for the whole traversal if it must not interleave with
/// other threads.
///
/// # Deadlocks
///
/// The guard is re-entrant, but the closures passed to
/// [`with_read`](Self::with_read) and [`with_write`](Self::with_write) (and
/// filters, predicates passed to `retain`) run while the container itself is
/// borrowed. They must not call back into a view of the same container.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
/// use std::thread;
///
/// let shared = Synchronized::new(Vec::new());
/// let handles: Vec<_> = (0..4)
///     .map(|worker| {
///         let shared = shared.clone();
///         thread::spawn(move || shared.insert(worker).unwrap())
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(shared.len(), 4);
/// ```
pub struct Synchronized<C> {
    container: Arc<Mutex<C>>,
    lock: Lock,
}

impl<C> Synchronized<C> {
    /// Wraps `container` under a fresh guard.
    pub fn new(container: C) -> Self {
        Self::with_lock(container, Lock::new())
    }

    /// Wraps `container` under an existing guard, so that it is excluded
    /// together with every other view holding `lock`.
    pub fn with_lock(container: C, lock: Lock) -> Self {
        Self {
            container: Arc::new(Mutex::new(container)),
            lock,
        }
    }

    /// Runs `read` against the container while holding the guard.
    pub fn with_read<R>(&self, read: impl FnOnce(&C) -> R) -> R {
        let _guard = self.lock.read();
        let container = self.container.lock();
        read(&container)
    }

    /// Runs `write` against the container while holding the guard.
    pub fn with_write<R>(&self, write: impl FnOnce(&mut C) -> R) -> R {
        let _guard = self.lock.write();
        let mut container = self.container.lock();
        write(&mut container)
    }

    /// Runs `access` against the container without taking the guard.
    ///
    /// Only for operations that describe the container rather than its
    /// contents (session binding).
    pub(crate) fn with_unguarded<R>(&self, access: impl FnOnce(&mut C) -> R) -> R {
        access(&mut self.container.lock())
    }

    /// Wraps another container under this view's guard.
    pub(crate) fn derive<D>(&self, container: D) -> Synchronized<D> {
        Synchronized::with_lock(container, self.lock.clone())
    }

    /// Returns `true` if both handles wrap the same container.
    pub fn shares_container_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.container, &other.container)
    }

    /// Unwraps the container if this is its last handle.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if other handles (or views) still exist.
    pub fn try_into_inner(self) -> Result<C, Self> {
        let Self { container, lock } = self;
        Arc::try_unwrap(container)
            .map(Mutex::into_inner)
            .map_err(|container| Self { container, lock })
    }
}

impl<C> GuardedView for Synchronized<C> {
    fn lock(&self) -> &Lock {
        &self.lock
    }
}

impl<C> Clone for Synchronized<C> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
            lock: self.lock.clone(),
        }
    }
}

impl<C: Default> Default for Synchronized<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> From<C> for Synchronized<C> {
    fn from(container: C) -> Self {
        Self::new(container)
    }
}

impl<C: fmt::Debug> fmt::Debug for Synchronized<C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_read(|container| {
            formatter
                .debug_tuple("Synchronized")
                .field(container)
                .finish()
        })
    }
}

impl<C: Container> Container for Synchronized<C> {
    fn len(&self) -> usize {
        self.with_read(Container::len)
    }

    fn is_empty(&self) -> bool {
        self.with_read(Container::is_empty)
    }
}

impl<C> FilterableCollection for Synchronized<C>
where
    C: FilterableCollection,
    C::Item: Clone,
{
    type Item = C::Item;
    type Filtered = Synchronized<C::Filtered>;

    /// Visits a copy taken under the guard; `visit` itself runs unguarded.
    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &C::Item) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A> {
        self.to_vec()
            .iter()
            .try_fold(initial, |accumulator, element| step(accumulator, element))
    }

    /// Filters under the guard. The result shares this view's guard.
    fn filter<F>(&self, filter: &F) -> Synchronized<C::Filtered>
    where
        F: Filter<C::Item> + ?Sized,
    {
        let filtered = self.with_read(|container| container.filter(filter));
        self.derive(filtered)
    }

    fn to_vec(&self) -> Vec<C::Item> {
        self.with_read(FilterableCollection::to_vec)
    }
}

static_assertions::assert_impl_all!(Synchronized<Vec<i32>>: Send, Sync, Clone);
