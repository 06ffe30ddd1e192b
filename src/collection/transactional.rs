//! A map with commit and rollback.

use std::ops::ControlFlow;
use std::thread::{self, ThreadId};

use super::{
    BidiMap, Container, KeyRange, MapCollection, RangeIter, SortedBidiMap, SortedMap,
    Transactional,
};

/// Wraps a map in a working copy over a committed snapshot.
///
/// Writes go to the working copy. [`commit`](Transactional::commit) makes the
/// working copy the new snapshot; [`rollback`](Transactional::rollback)
/// restores the working copy from it. With auto-commit enabled every write is
/// committed as soon as it completes.
///
/// Every capability of the wrapped map (sorted, bidirectional) is exposed
/// against the working copy.
///
/// # Examples
///
/// ```rust
/// use guarded::collection::{MapCollection, Transactional, TransactionalMap};
/// use std::collections::BTreeMap;
///
/// let mut accounts = TransactionalMap::new(BTreeMap::from([("alice", 10)]));
/// accounts.insert("bob", 5);
/// assert!(accounts.has_uncommitted_changes());
///
/// accounts.rollback();
/// assert_eq!(accounts.get(&"bob"), None);
///
/// accounts.insert("carol", 7);
/// accounts.commit();
/// accounts.rollback();
/// assert_eq!(accounts.get(&"carol"), Some(&7));
/// ```
#[derive(Debug, Clone)]
pub struct TransactionalMap<M> {
    committed: M,
    working: M,
    auto_commit: bool,
    dirty: bool,
    session: Option<ThreadId>,
}

impl<M: Clone> TransactionalMap<M> {
    /// Wraps `map`, treating its current contents as committed.
    pub fn new(map: M) -> Self {
        Self {
            committed: map.clone(),
            working: map,
            auto_commit: false,
            dirty: false,
            session: None,
        }
    }

    /// Returns the last committed contents.
    pub const fn committed(&self) -> &M {
        &self.committed
    }

    /// Returns the working copy.
    pub const fn working(&self) -> &M {
        &self.working
    }

    /// Unwraps the working copy, dropping the snapshot.
    pub fn into_working(self) -> M {
        self.working
    }

    fn write<R>(&mut self, operation: impl FnOnce(&mut M) -> R) -> R {
        let result = operation(&mut self.working);
        self.dirty = true;
        if self.auto_commit {
            self.commit();
        }
        result
    }
}

impl<M: Clone + Default> Default for TransactionalMap<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: Clone> Transactional for TransactionalMap<M> {
    fn commit(&mut self) {
        if self.dirty {
            self.committed = self.working.clone();
            self.dirty = false;
        }
    }

    fn rollback(&mut self) {
        if self.dirty {
            self.working = self.committed.clone();
            self.dirty = false;
        }
    }

    fn set_auto_commit(&mut self, auto_commit: bool) {
        self.auto_commit = auto_commit;
        if auto_commit {
            self.commit();
        }
    }

    fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn has_uncommitted_changes(&self) -> bool {
        self.dirty
    }

    fn attach(&mut self) {
        self.session = Some(thread::current().id());
    }

    fn detach(&mut self) {
        self.session = None;
    }

    fn attached_session(&self) -> Option<ThreadId> {
        self.session
    }
}

impl<M: Container> Container for TransactionalMap<M> {
    fn len(&self) -> usize {
        self.working.len()
    }

    fn is_empty(&self) -> bool {
        self.working.is_empty()
    }
}

impl<M: MapCollection + Clone> MapCollection for TransactionalMap<M> {
    type Key = M::Key;
    type Value = M::Value;

    fn get(&self, key: &M::Key) -> Option<&M::Value> {
        self.working.get(key)
    }

    fn insert(&mut self, key: M::Key, value: M::Value) -> Option<M::Value> {
        self.write(|map| map.insert(key, value))
    }

    fn remove(&mut self, key: &M::Key) -> Option<M::Value> {
        self.write(|map| map.remove(key))
    }

    fn clear(&mut self) {
        self.write(MapCollection::clear);
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.working.for_each_entry_until(visit)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&M::Key, &M::Value) -> bool) {
        self.write(|map| map.retain(keep));
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.working.contains_key(key)
    }

    fn contains_value(&self, value: &M::Value) -> bool
    where
        M::Value: PartialEq,
    {
        self.working.contains_value(value)
    }
}

impl<M: SortedMap + Clone> SortedMap for TransactionalMap<M> {
    fn range_entries<'a>(
        &'a self,
        range: &KeyRange<M::Key>,
    ) -> RangeIter<'a, (&'a M::Key, &'a M::Value)> {
        self.working.range_entries(range)
    }

    fn pop_first(&mut self) -> Option<(M::Key, M::Value)> {
        self.write(SortedMap::pop_first)
    }

    fn pop_last(&mut self) -> Option<(M::Key, M::Value)> {
        self.write(SortedMap::pop_last)
    }
}

impl<M: BidiMap + Clone> BidiMap for TransactionalMap<M> {
    fn get_key(&self, value: &M::Value) -> Option<&M::Key> {
        self.working.get_key(value)
    }

    fn remove_value(&mut self, value: &M::Value) -> Option<M::Key> {
        self.write(|map| map.remove_value(value))
    }
}

impl<M: SortedBidiMap + Clone> SortedBidiMap for TransactionalMap<M> {
    fn value_range_entries<'a>(
        &'a self,
        range: &KeyRange<M::Value>,
    ) -> RangeIter<'a, (&'a M::Value, &'a M::Key)> {
        self.working.value_range_entries(range)
    }
}
