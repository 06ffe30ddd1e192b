//! Synchronized decorators.
//!
//! [`Synchronized`] wraps a container so that every operation acquires a
//! re-entrant guard ([`Lock`]), delegates, and releases the guard before
//! returning. Views derived from it (key sets, value collections, entry sets,
//! sorted sub-ranges, descending views, value-ordered views and filtered
//! collections) keep operating on the same container under the same guard.
//!
//! Operations are grouped into capability traits mirroring the container
//! capabilities in [`crate::collection`]:
//!
//! - [`GuardedCollection`]: insert / remove / contains / clear / extend /
//!   retain / snapshot iteration
//! - [`GuardedSortedSet`]: navigation and sub-range views over a sorted set
//! - [`GuardedMap`]: key/value operations and live key, value and entry views
//! - [`GuardedSortedMap`]: key navigation and sub-map views
//! - [`GuardedBidiMap`]: lookup and removal by value
//! - [`GuardedSortedBidiMap`]: value navigation and value-ranged views
//! - [`GuardedTransactional`]: commit / rollback, plus unguarded session
//!   binding
//!
//! Size queries come from [`Container`](crate::collection::Container) and
//! filtering from [`FilterableCollection`](crate::collection::FilterableCollection),
//! both implemented with the guard held.
//!
//! # Examples
//!
//! ```rust
//! use guarded::prelude::*;
//! use std::collections::BTreeMap;
//!
//! let scores = Synchronized::new(BTreeMap::from([(1, "d"), (5, "b"), (9, "a")]));
//!
//! // A live view of keys 1..=5 sharing the same guard.
//! let low = scores.head_map(5, true).unwrap();
//! assert_eq!(low.len(), 2);
//! assert!(low.lock().same_as(scores.lock()));
//!
//! // Writes outside the view's range are rejected.
//! assert!(low.insert(7, "c").is_err());
//!
//! scores.insert(2, "c").unwrap();
//! assert_eq!(low.keys().to_vec(), vec![1, 2, 5]);
//! ```

mod bidi;
mod collection;
mod lock;
mod map;
mod sorted_map;
mod sorted_set;
mod synchronized;
mod transactional;

pub use bidi::{GuardedBidiMap, GuardedSortedBidiMap, ValueRangeView};
pub use collection::GuardedCollection;
pub use lock::{Lock, LockGuard};
pub use map::{EntriesView, GuardedMap, KeysView, ValuesView};
pub use sorted_map::{DescendingMapView, GuardedSortedMap, SubMapView};
pub use sorted_set::{DescendingSetView, GuardedSortedSet, SubSetView};
pub use synchronized::Synchronized;
pub use transactional::GuardedTransactional;

/// Anything operating under a shared [`Lock`].
pub trait GuardedView {
    /// Returns the guard this view acquires for every operation.
    fn lock(&self) -> &Lock;
}
