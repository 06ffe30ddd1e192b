//! Guarded maps and their key, value and entry views.

use std::ops::ControlFlow;

use super::{GuardedView, Lock, Synchronized};
use crate::collection::{Container, FilterableCollection, MapCollection};
use crate::error::{Error, Result};
use crate::failure;
use crate::filter::Filter;

/// Key/value operations on a guarded map or one of its views.
///
/// Values are returned by clone, so that nothing borrowed from the map
/// outlives the guard.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
/// use std::collections::HashMap;
///
/// let sessions = Synchronized::new(HashMap::new());
/// sessions.insert("alice", 3).unwrap();
/// sessions.insert("bob", 5).unwrap();
///
/// let keys = sessions.keys();
/// assert!(keys.contains(&"alice"));
///
/// // Removing through a view removes from the map.
/// assert!(sessions.values().remove(&5));
/// assert_eq!(sessions.get(&"bob"), None);
/// assert_eq!(keys.len(), 1);
/// ```
pub trait GuardedMap: GuardedView + Container {
    /// The key type.
    type Key: Clone;
    /// The value type.
    type Value: Clone;

    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Returns `true` if `key` is visible through this view.
    fn contains_key(&self, key: &Self::Key) -> bool;

    /// Stores `value` under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// the view is restricted to a range the entry does not fall within.
    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<Option<Self::Value>>;

    /// Removes `key`, returning its value.
    fn remove(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Removes every entry visible through this view.
    fn clear(&self);

    /// Keeps only the visible entries for which `keep` returns `true`.
    fn retain<F>(&self, keep: F)
    where
        F: FnMut(&Self::Key, &Self::Value) -> bool;

    /// Visits the visible entries in this view's order, under the guard,
    /// until `visit` breaks.
    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&Self::Key, &Self::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()>;

    /// Returns `true` if some visible entry holds `value`.
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

    /// Stores every entry of `entries` under a single acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument),
    /// without storing anything, if some entry falls outside the view.
    fn extend<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (Self::Key, Self::Value)>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let _guard = self.lock().write();
        for (key, value) in &entries {
            if !self.admits(key, value) {
                return Err(failure::raise(Error::invalid_argument(
                    "GuardedMap::extend",
                    "entry out of range",
                )));
            }
        }
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Returns `true` if [`insert`](Self::insert) would accept the entry.
    /// Unrestricted views accept everything.
    fn admits(&self, _key: &Self::Key, _value: &Self::Value) -> bool {
        true
    }

    /// Returns a copy of the visible entries, in this view's order.
    fn to_entries(&self) -> Vec<(Self::Key, Self::Value)> {
        let mut entries = Vec::with_capacity(self.len());
        let _ = self.for_each_entry_until(&mut |key, value| {
            entries.push((key.clone(), value.clone()));
            ControlFlow::Continue(())
        });
        entries
    }

    /// Returns a live view of the keys.
    fn keys(&self) -> KeysView<Self>
    where
        Self: Clone + Sized,
    {
        KeysView {
            map: self.clone(),
        }
    }

    /// Returns a live view of the values.
    fn values(&self) -> ValuesView<Self>
    where
        Self: Clone + Sized,
    {
        ValuesView {
            map: self.clone(),
        }
    }

    /// Returns a live view of the entries.
    fn entries(&self) -> EntriesView<Self>
    where
        Self: Clone + Sized,
    {
        EntriesView {
            map: self.clone(),
        }
    }
}

impl<M> GuardedMap for Synchronized<M>
where
    M: MapCollection,
    M::Key: Clone,
    M::Value: Clone,
{
    type Key = M::Key;
    type Value = M::Value;

    fn get(&self, key: &M::Key) -> Option<M::Value> {
        self.with_read(|map| map.get(key).cloned())
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.with_read(|map| map.contains_key(key))
    }

    fn insert(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        Ok(self.with_write(|map| map.insert(key, value)))
    }

    fn remove(&self, key: &M::Key) -> Option<M::Value> {
        self.with_write(|map| map.remove(key))
    }

    fn clear(&self) {
        self.with_write(MapCollection::clear);
    }

    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&M::Key, &M::Value) -> bool,
    {
        self.with_write(|map| map.retain(&mut keep));
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.with_read(|map| map.for_each_entry_until(visit))
    }

    fn contains_value(&self, value: &M::Value) -> bool
    where
        M::Value: PartialEq,
    {
        self.with_read(|map| map.contains_value(value))
    }
}

// =============================================================================
// Views
// =============================================================================

macro_rules! view_common {
    ($view:ident, $item:ty, |$map:ident| $snapshot:expr) => {
        impl<P: GuardedMap> GuardedView for $view<P> {
            fn lock(&self) -> &Lock {
                self.map.lock()
            }
        }

        impl<P: GuardedMap> Container for $view<P> {
            fn len(&self) -> usize {
                self.map.len()
            }

            fn is_empty(&self) -> bool {
                self.map.is_empty()
            }
        }

        impl<P: GuardedMap> FilterableCollection for $view<P> {
            type Item = $item;
            type Filtered = Synchronized<Vec<$item>>;

            fn fold_elements<A>(
                &self,
                initial: A,
                step: &mut dyn FnMut(A, &$item) -> ControlFlow<A, A>,
            ) -> ControlFlow<A, A> {
                self.to_vec()
                    .iter()
                    .try_fold(initial, |accumulator, element| step(accumulator, element))
            }

            fn filter<F>(&self, filter: &F) -> Synchronized<Vec<$item>>
            where
                F: Filter<$item> + ?Sized,
            {
                let mut accepted = self.to_vec();
                accepted.retain(|element| filter.accept(element));
                Synchronized::with_lock(accepted, self.map.lock().clone())
            }

            fn to_vec(&self) -> Vec<$item> {
                let $map = &self.map;
                $snapshot
            }
        }

        impl<P: GuardedMap> $view<P> {
            /// Returns an iterator over a copy taken under the guard.
            pub fn iter(&self) -> std::vec::IntoIter<$item> {
                self.to_vec().into_iter()
            }

            /// Removes every entry of the underlying view.
            pub fn clear(&self) {
                self.map.clear();
            }
        }
    };
}

/// A live view of a guarded map's keys.
///
/// Shares the map's guard. Removing a key removes its entry.
#[derive(Debug, Clone)]
pub struct KeysView<P> {
    map: P,
}

view_common!(KeysView, P::Key, |map| {
    let mut keys = Vec::with_capacity(map.len());
    let _ = map.for_each_entry_until(&mut |key, _| {
        keys.push(key.clone());
        ControlFlow::Continue(())
    });
    keys
});

impl<P: GuardedMap> KeysView<P> {
    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &P::Key) -> bool {
        self.map.contains_key(key)
    }

    /// Removes `key` from the map. Returns `true` if it was present.
    pub fn remove(&self, key: &P::Key) -> bool {
        self.map.remove(key).is_some()
    }

    /// Keeps only the entries whose key satisfies `keep`.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&P::Key) -> bool,
    {
        self.map.retain(|key, _| keep(key));
    }
}

/// A live view of a guarded map's values.
///
/// Shares the map's guard. Removing a value removes the first entry holding
/// it.
#[derive(Debug, Clone)]
pub struct ValuesView<P> {
    map: P,
}

view_common!(ValuesView, P::Value, |map| {
    let mut values = Vec::with_capacity(map.len());
    let _ = map.for_each_entry_until(&mut |_, value| {
        values.push(value.clone());
        ControlFlow::Continue(())
    });
    values
});

impl<P: GuardedMap> ValuesView<P>
where
    P::Value: PartialEq,
{
    /// Returns `true` if some entry holds `value`.
    pub fn contains(&self, value: &P::Value) -> bool {
        self.map.contains_value(value)
    }

    /// Removes the first entry holding `value`. Returns `true` if one was
    /// found.
    pub fn remove(&self, value: &P::Value) -> bool {
        let _guard = self.map.lock().write();
        let mut found = None;
        let _ = self.map.for_each_entry_until(&mut |key, candidate| {
            if candidate == value {
                found = Some(key.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found.is_some_and(|key| self.map.remove(&key).is_some())
    }
}

impl<P: GuardedMap> ValuesView<P> {
    /// Keeps only the entries whose value satisfies `keep`.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&P::Value) -> bool,
    {
        self.map.retain(|_, value| keep(value));
    }
}

/// A live view of a guarded map's entries as `(key, value)` pairs.
#[derive(Debug, Clone)]
pub struct EntriesView<P> {
    map: P,
}

view_common!(EntriesView, (P::Key, P::Value), |map| map.to_entries());

impl<P: GuardedMap> EntriesView<P>
where
    P::Value: PartialEq,
{
    /// Returns `true` if the map stores exactly this pair.
    pub fn contains(&self, entry: &(P::Key, P::Value)) -> bool {
        let (key, value) = entry;
        self.map.get(key).as_ref() == Some(value)
    }

    /// Removes the pair if the map stores exactly it.
    pub fn remove(&self, entry: &(P::Key, P::Value)) -> bool {
        let _guard = self.map.lock().write();
        self.contains(entry) && self.map.remove(&entry.0).is_some()
    }
}

impl<P: GuardedMap> EntriesView<P> {
    /// Keeps only the entries satisfying `keep`.
    pub fn retain<F>(&self, keep: F)
    where
        F: FnMut(&P::Key, &P::Value) -> bool,
    {
        self.map.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::{BTreeMap, HashMap};

    #[fixture]
    fn stock() -> Synchronized<BTreeMap<&'static str, u32>> {
        Synchronized::new(BTreeMap::from([("apple", 3), ("pear", 0), ("plum", 7)]))
    }

    #[rstest]
    fn delegates_lookups(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        assert_eq!(stock.get(&"plum"), Some(7));
        assert_eq!(stock.get(&"kiwi"), None);
        assert!(stock.contains_key(&"pear"));
        assert!(stock.contains_value(&3));
        assert!(!stock.contains_value(&4));
    }

    #[rstest]
    fn insert_returns_previous_value(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        assert_eq!(stock.insert("pear", 2), Ok(Some(0)));
        assert_eq!(stock.insert("kiwi", 1), Ok(None));
        assert_eq!(stock.len(), 4);
    }

    #[rstest]
    fn extend_and_retain(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        stock.extend([("fig", 4), ("lime", 0)]).unwrap();
        stock.retain(|_, count| *count > 0);
        assert_eq!(
            stock.to_entries(),
            vec![("apple", 3), ("fig", 4), ("plum", 7)]
        );
    }

    #[rstest]
    fn views_are_live(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        let keys = stock.keys();
        let values = stock.values();
        stock.insert("fig", 4).unwrap();
        assert_eq!(keys.to_vec(), vec!["apple", "fig", "pear", "plum"]);
        assert_eq!(values.to_vec(), vec![3, 4, 0, 7]);
    }

    #[rstest]
    fn view_removal_writes_through(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        assert!(stock.keys().remove(&"apple"));
        assert!(stock.values().remove(&7));
        assert!(!stock.entries().remove(&("pear", 9)));
        assert!(stock.entries().remove(&("pear", 0)));
        assert!(stock.is_empty());
    }

    #[rstest]
    fn view_retain_filters_map(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        stock.keys().retain(|key| key.starts_with('p'));
        assert_eq!(stock.len(), 2);
        stock.values().retain(|count| *count > 0);
        assert_eq!(stock.to_entries(), vec![("plum", 7)]);
    }

    #[rstest]
    fn views_share_guard(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        assert!(stock.keys().lock().same_as(stock.lock()));
        assert!(stock.values().lock().same_as(stock.lock()));
        let entries = stock.entries();
        let filtered = entries.filter(&|entry: &(&'static str, u32)| entry.1 > 0);
        assert!(filtered.lock().same_as(stock.lock()));
        assert_eq!(filtered.to_vec(), vec![("apple", 3), ("plum", 7)]);
    }

    #[rstest]
    fn entries_contains_checks_value() {
        let map = Synchronized::new(HashMap::from([(1, 'a')]));
        let entries = map.entries();
        assert!(entries.contains(&(1, 'a')));
        assert!(!entries.contains(&(1, 'b')));
        assert!(!entries.contains(&(2, 'a')));
    }

    #[rstest]
    fn view_clear_empties_map(stock: Synchronized<BTreeMap<&'static str, u32>>) {
        stock.values().clear();
        assert!(stock.is_empty());
    }
}
