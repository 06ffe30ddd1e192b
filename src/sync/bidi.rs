//! Guarded bidirectional maps and value-ordered views.

use std::fmt;
use std::ops::{Bound, ControlFlow, RangeBounds};

use super::{GuardedMap, GuardedView, Lock, Synchronized};
use crate::collection::{BidiMap, Container, KeyRange, SortedBidiMap};
use crate::error::{Error, Result};
use crate::failure;

/// Lookup and removal by value on a guarded bidirectional map.
pub trait GuardedBidiMap: GuardedMap {
    /// Returns the key under which `value` is stored.
    fn get_key(&self, value: &Self::Value) -> Option<Self::Key>;

    /// Removes the entry holding `value`, returning its key.
    fn remove_value(&self, value: &Self::Value) -> Option<Self::Key>;
}

impl<M> GuardedBidiMap for Synchronized<M>
where
    M: BidiMap,
    M::Key: Clone,
    M::Value: Clone,
{
    fn get_key(&self, value: &M::Value) -> Option<M::Key> {
        self.with_read(|map| map.get_key(value).cloned())
    }

    fn remove_value(&self, value: &M::Value) -> Option<M::Key> {
        self.with_write(|map| map.remove_value(value))
    }
}

/// Value navigation and value-ranged views over a guarded sorted
/// bidirectional map.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
///
/// let ranks: TreeBidiMap<&str, u32> = [("ann", 3), ("bo", 1), ("cy", 2)].into_iter().collect();
/// let ranks = Synchronized::new(ranks);
///
/// assert_eq!(ranks.first_value(), Some(1));
/// assert_eq!(ranks.values_descending(), vec![3, 2, 1]);
///
/// // Entries ordered by value, restricted to values 2 and above.
/// let top = ranks.tail_map_by_value(2, true).unwrap();
/// assert_eq!(top.to_entries(), vec![("cy", 2), ("ann", 3)]);
/// assert_eq!(top.get_key(&1), None);
/// assert!(top.insert("dee", 0).is_err());
/// ```
pub trait GuardedSortedBidiMap: GuardedBidiMap<Value: Ord> {
    /// The sorted bidirectional map behind the view.
    type Backing: SortedBidiMap<Key = Self::Key, Value = Self::Value>;

    /// Returns this view as a value-ranged view over its backing map.
    fn value_view(&self) -> ValueRangeView<Self::Backing>;

    /// Returns the smallest visible value.
    fn first_value(&self) -> Option<Self::Value> {
        self.value_view().value_at_end(false)
    }

    /// Returns the largest visible value.
    fn last_value(&self) -> Option<Self::Value> {
        self.value_view().value_at_end(true)
    }

    /// Returns a copy of the visible values, smallest first.
    fn values_ascending(&self) -> Vec<Self::Value> {
        self.value_view().value_vec()
    }

    /// Returns a copy of the visible values, largest first.
    fn values_descending(&self) -> Vec<Self::Value> {
        let mut values = self.values_ascending();
        values.reverse();
        values
    }

    /// Returns a live view of the entries ordered by value.
    fn ordered_by_value(&self) -> ValueRangeView<Self::Backing> {
        self.value_view()
    }

    /// Returns a live view of the entries whose values fall within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `range` is inverted or reaches
    /// outside this view's own value range.
    fn value_range_map<R>(&self, range: R) -> Result<ValueRangeView<Self::Backing>>
    where
        R: RangeBounds<Self::Value>,
    {
        self.value_view()
            .narrowed(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// Returns a live view of the entries with values below `to` (or up to
    /// it, when `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `to` lies outside this view.
    fn head_map_by_value(
        &self,
        to: Self::Value,
        inclusive: bool,
    ) -> Result<ValueRangeView<Self::Backing>> {
        let upper = if inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        self.value_view().narrowed(Bound::Unbounded, upper)
    }

    /// Returns a live view of the entries with values from `from` upwards
    /// (strictly above it, unless `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `from` lies outside this view.
    fn tail_map_by_value(
        &self,
        from: Self::Value,
        inclusive: bool,
    ) -> Result<ValueRangeView<Self::Backing>> {
        let lower = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        self.value_view().narrowed(lower, Bound::Unbounded)
    }
}

impl<M> GuardedSortedBidiMap for Synchronized<M>
where
    M: SortedBidiMap,
    M::Key: Clone,
    M::Value: Ord + Clone,
{
    type Backing = M;

    fn value_view(&self) -> ValueRangeView<M> {
        ValueRangeView {
            root: self.clone(),
            range: KeyRange::full(),
        }
    }
}

// =============================================================================
// ValueRangeView
// =============================================================================

/// A live view of the entries of a guarded sorted bidirectional map whose
/// values fall within a [`KeyRange`], traversed in value order.
///
/// Entries with values outside the range are invisible: lookups miss them,
/// removals skip them, and inserting a value outside the range fails with
/// [`Error::InvalidArgument`].
pub struct ValueRangeView<M: SortedBidiMap> {
    root: Synchronized<M>,
    range: KeyRange<M::Value>,
}

impl<M: SortedBidiMap> ValueRangeView<M>
where
    M::Key: Clone,
    M::Value: Ord + Clone,
{
    /// Returns the value range this view is restricted to.
    pub const fn range(&self) -> &KeyRange<M::Value> {
        &self.range
    }

    fn value_at_end(&self, last: bool) -> Option<M::Value> {
        self.root.with_read(|map| {
            let mut entries = map.value_range_entries(&self.range);
            let entry = if last {
                entries.next_back()
            } else {
                entries.next()
            };
            entry.map(|(value, _)| value.clone())
        })
    }

    fn value_vec(&self) -> Vec<M::Value> {
        self.root.with_read(|map| {
            map.value_range_entries(&self.range)
                .map(|(value, _)| value.clone())
                .collect()
        })
    }

    fn narrowed(&self, lower: Bound<M::Value>, upper: Bound<M::Value>) -> Result<Self> {
        Ok(Self {
            root: self.root.clone(),
            range: self.range.narrow(lower, upper)?,
        })
    }

    fn visible(&self, map: &M, key: &M::Key) -> bool {
        map.get(key).is_some_and(|value| self.range.contains(value))
    }
}

impl<M: SortedBidiMap> Clone for ValueRangeView<M>
where
    M::Value: Clone,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            range: self.range.clone(),
        }
    }
}

impl<M: SortedBidiMap> fmt::Debug for ValueRangeView<M>
where
    M::Value: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ValueRangeView")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl<M: SortedBidiMap> GuardedView for ValueRangeView<M> {
    fn lock(&self) -> &Lock {
        self.root.lock()
    }
}

impl<M: SortedBidiMap> Container for ValueRangeView<M>
where
    M::Value: Ord,
{
    fn len(&self) -> usize {
        self.root
            .with_read(|map| map.value_range_entries(&self.range).count())
    }

    fn is_empty(&self) -> bool {
        self.root
            .with_read(|map| map.value_range_entries(&self.range).next().is_none())
    }
}

impl<M: SortedBidiMap> GuardedMap for ValueRangeView<M>
where
    M::Key: Clone,
    M::Value: Ord + Clone,
{
    type Key = M::Key;
    type Value = M::Value;

    fn get(&self, key: &M::Key) -> Option<M::Value> {
        self.root.with_read(|map| {
            map.get(key)
                .filter(|value| self.range.contains(value))
                .cloned()
        })
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.root.with_read(|map| self.visible(map, key))
    }

    fn insert(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        if !self.range.contains(&value) {
            return Err(failure::raise(Error::invalid_argument(
                "ValueRangeView::insert",
                "value out of range",
            )));
        }
        self.root.insert(key, value)
    }

    fn remove(&self, key: &M::Key) -> Option<M::Value> {
        self.root.with_write(|map| {
            if self.visible(map, key) {
                map.remove(key)
            } else {
                None
            }
        })
    }

    fn clear(&self) {
        let range = &self.range;
        self.root.retain(|_, value| !range.contains(value));
    }

    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&M::Key, &M::Value) -> bool,
    {
        let range = &self.range;
        self.root
            .retain(|key, value| !range.contains(value) || keep(key, value));
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.root.with_read(|map| {
            for (value, key) in map.value_range_entries(&self.range) {
                visit(key, value)?;
            }
            ControlFlow::Continue(())
        })
    }

    fn contains_value(&self, value: &M::Value) -> bool {
        self.range.contains(value) && self.root.contains_value(value)
    }

    fn admits(&self, _key: &M::Key, value: &M::Value) -> bool {
        self.range.contains(value)
    }
}

impl<M: SortedBidiMap> GuardedBidiMap for ValueRangeView<M>
where
    M::Key: Clone,
    M::Value: Ord + Clone,
{
    fn get_key(&self, value: &M::Value) -> Option<M::Key> {
        if self.range.contains(value) {
            self.root.get_key(value)
        } else {
            None
        }
    }

    fn remove_value(&self, value: &M::Value) -> Option<M::Key> {
        if self.range.contains(value) {
            self.root.remove_value(value)
        } else {
            None
        }
    }
}

impl<M: SortedBidiMap> GuardedSortedBidiMap for ValueRangeView<M>
where
    M::Key: Clone,
    M::Value: Ord + Clone,
{
    type Backing = M;

    fn value_view(&self) -> ValueRangeView<M> {
        self.clone()
    }
}
