//! Container capabilities.
//!
//! Instead of one deep hierarchy of collection interfaces, each capability is
//! a separate trait implemented by delegation:
//!
//! - [`Container`]: size queries, shared by collections and maps
//! - [`FilterableCollection`]: traversal with early exit and predicate-based
//!   derivation of a new collection
//! - [`MutableCollection`]: insert / remove / contains / clear / retain
//! - [`SortedSet`]: ordered ranges and both-end removal over a set
//! - [`MapCollection`]: key/value storage
//! - [`SortedMap`]: ordered key ranges and both-end removal over a map
//! - [`BidiMap`]: lookup and removal by value
//! - [`SortedBidiMap`]: ordered value ranges
//! - [`Transactional`]: commit / rollback with an optional session binding
//!
//! The traits are implemented for the standard containers (`Vec`,
//! `VecDeque`, `HashSet`, `BTreeSet`, `HashMap`, `BTreeMap`), for
//! [`DualBidiMap`] (a pair of maps kept inverse to each other) and for
//! [`TransactionalMap`] (a working copy over a committed snapshot).
//!
//! # Examples
//!
//! ```rust
//! use guarded::collection::{FilterableCollection, MutableCollection};
//! use guarded::filter::comparison;
//!
//! // `Vec` has inherent methods with the same names, so the trait is named.
//! let mut numbers = vec![1, 2, 3, 4];
//! assert!(MutableCollection::insert(&mut numbers, 5));
//! assert!(MutableCollection::remove(&mut numbers, &1));
//!
//! let evens = numbers.filter(&|value: &i32| value % 2 == 0);
//! assert_eq!(evens, vec![2, 4]);
//! assert_eq!(numbers.filter(&comparison::greater_than(3)).len(), 2);
//! ```

mod bidi;
mod range;
mod std_impls;
mod transactional;

pub use bidi::{DualBidiMap, HashBidiMap, TreeBidiMap};
pub use range::KeyRange;
pub use transactional::TransactionalMap;

use std::ops::ControlFlow;
use std::thread::ThreadId;

use crate::filter::Filter;

/// Borrowing iterator over a contiguous ordered range.
pub type RangeIter<'a, T> = Box<dyn DoubleEndedIterator<Item = T> + 'a>;

/// Anything with a size.
pub trait Container {
    /// Returns the number of elements (or entries).
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Collections
// =============================================================================

/// A collection that can be traversed and narrowed by a [`Filter`].
pub trait FilterableCollection: Container {
    /// The element type.
    type Item;

    /// The collection produced by [`filter`](Self::filter).
    type Filtered: FilterableCollection<Item = Self::Item>;

    /// Folds elements in encounter order until `step` breaks.
    ///
    /// Returns `ControlFlow::Break` with the accumulator if traversal was cut
    /// short, `ControlFlow::Continue` with it otherwise.
    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &Self::Item) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A>;

    /// Visits elements in encounter order until `visit` breaks.
    ///
    /// Returns `ControlFlow::Break(())` if traversal was cut short.
    fn for_each_until(
        &self,
        visit: &mut dyn FnMut(&Self::Item) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.fold_elements((), &mut |(), element| visit(element))
    }

    /// Returns a new collection holding the elements `filter` accepts, in
    /// encounter order.
    fn filter<F>(&self, filter: &F) -> Self::Filtered
    where
        F: Filter<Self::Item> + ?Sized;

    /// Copies the elements into a `Vec`, in encounter order.
    fn to_vec(&self) -> Vec<Self::Item>
    where
        Self::Item: Clone,
    {
        let mut elements = Vec::with_capacity(self.len());
        let _ = self.for_each_until(&mut |element| {
            elements.push(element.clone());
            ControlFlow::Continue(())
        });
        elements
    }
}

/// A collection that can be modified in place.
pub trait MutableCollection: FilterableCollection {
    /// Adds `element`. Returns `false` if a set already contained it.
    fn insert(&mut self, element: Self::Item) -> bool;

    /// Removes one occurrence of `element`. Returns `true` if it was present.
    fn remove(&mut self, element: &Self::Item) -> bool;

    /// Returns `true` if `element` is present.
    fn contains(&self, element: &Self::Item) -> bool;

    /// Removes every element.
    fn clear(&mut self);

    /// Keeps only the elements for which `keep` returns `true`.
    fn retain(&mut self, keep: &mut dyn FnMut(&Self::Item) -> bool);
}

/// A set whose elements are kept in ascending order.
///
/// Element ordering is the element type's `Ord`. Navigation (floor, ceiling,
/// first, last) is derived from [`range_iter`](Self::range_iter) by the
/// synchronized layer.
pub trait SortedSet: MutableCollection {
    /// Iterates the elements within `range` in ascending order.
    ///
    /// A degenerate range (empty or inverted) yields nothing.
    fn range_iter<'a>(&'a self, range: &KeyRange<Self::Item>) -> RangeIter<'a, &'a Self::Item>;

    /// Removes and returns the smallest element.
    fn pop_first(&mut self) -> Option<Self::Item>;

    /// Removes and returns the largest element.
    fn pop_last(&mut self) -> Option<Self::Item>;
}

// =============================================================================
// Maps
// =============================================================================

/// Key/value storage.
pub trait MapCollection: Container {
    /// The key type.
    type Key;
    /// The value type.
    type Value;

    /// Returns the value stored under `key`.
    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Stores `value` under `key`, returning the previous value.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Removes `key`, returning its value.
    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    /// Removes every entry.
    fn clear(&mut self);

    /// Visits entries until `visit` breaks.
    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&Self::Key, &Self::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()>;

    /// Keeps only the entries for which `keep` returns `true`.
    fn retain(&mut self, keep: &mut dyn FnMut(&Self::Key, &Self::Value) -> bool);

    /// Returns `true` if `key` is present.
    fn contains_key(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if some entry holds `value`.
    ///
    /// Linear by default; bidirectional maps answer from their inverse index.
    fn contains_value(&self, value: &Self::Value) -> bool
    where
        Self::Value: PartialEq,
    {
        self.for_each_entry_until(&mut |_, candidate| {
            if candidate == value {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .is_break()
    }
}

/// A map whose entries are kept in ascending key order.
pub trait SortedMap: MapCollection {
    /// Iterates the entries whose keys fall within `range`, ascending.
    ///
    /// A degenerate range (empty or inverted) yields nothing.
    fn range_entries<'a>(
        &'a self,
        range: &KeyRange<Self::Key>,
    ) -> RangeIter<'a, (&'a Self::Key, &'a Self::Value)>;

    /// Removes and returns the entry with the smallest key.
    fn pop_first(&mut self) -> Option<(Self::Key, Self::Value)>;

    /// Removes and returns the entry with the largest key.
    fn pop_last(&mut self) -> Option<(Self::Key, Self::Value)>;
}

/// A map that is also indexed by value. Values are unique: inserting a value
/// already stored under another key moves it to the new key.
pub trait BidiMap: MapCollection {
    /// Returns the key under which `value` is stored.
    fn get_key(&self, value: &Self::Value) -> Option<&Self::Key>;

    /// Removes the entry holding `value`, returning its key.
    fn remove_value(&mut self, value: &Self::Value) -> Option<Self::Key>;
}

/// A bidirectional map whose value index is ordered.
pub trait SortedBidiMap: BidiMap + SortedMap {
    /// Iterates `(value, key)` pairs whose values fall within `range`,
    /// ascending by value.
    fn value_range_entries<'a>(
        &'a self,
        range: &KeyRange<Self::Value>,
    ) -> RangeIter<'a, (&'a Self::Value, &'a Self::Key)>;
}

// =============================================================================
// Transactions
// =============================================================================

/// A container with explicit commit and rollback.
///
/// `attach` / `detach` bind the container to the calling thread's session.
/// They describe affinity rather than contents, which is why the
/// synchronized layer forwards them without taking its guard.
pub trait Transactional {
    /// Makes every change since the last commit permanent.
    fn commit(&mut self);

    /// Discards every change since the last commit.
    fn rollback(&mut self);

    /// Enables or disables committing after every write.
    fn set_auto_commit(&mut self, auto_commit: bool);

    /// Returns `true` if every write commits immediately.
    fn is_auto_commit(&self) -> bool;

    /// Returns `true` if there are changes that have not been committed.
    fn has_uncommitted_changes(&self) -> bool;

    /// Binds the container to the calling thread.
    fn attach(&mut self);

    /// Releases the session binding.
    fn detach(&mut self);

    /// Returns the thread currently attached, if any.
    fn attached_session(&self) -> Option<ThreadId>;
}
