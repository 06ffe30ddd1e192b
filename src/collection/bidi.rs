//! Bidirectional maps built from two ordinary maps.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::ControlFlow;

use super::{
    BidiMap, Container, KeyRange, MapCollection, RangeIter, SortedBidiMap, SortedMap,
};

/// A bidirectional map kept as a forward map (`K -> V`) and an inverse map
/// (`V -> K`).
///
/// Values are unique. Storing a value that already belongs to another key
/// removes that other entry first, so both directions always describe the
/// same set of pairs.
///
/// Use the aliases [`HashBidiMap`] and [`TreeBidiMap`] for the common
/// layouts.
///
/// # Examples
///
/// ```rust
/// use guarded::collection::{BidiMap, MapCollection, TreeBidiMap};
///
/// let mut codes: TreeBidiMap<&str, u16> = TreeBidiMap::new();
/// codes.insert("ok", 200);
/// codes.insert("created", 201);
///
/// assert_eq!(codes.get_key(&201), Some(&"created"));
///
/// // 200 moves from "ok" to "success".
/// codes.insert("success", 200);
/// assert_eq!(codes.get(&"ok"), None);
/// assert_eq!(codes.get_key(&200), Some(&"success"));
/// ```
#[derive(Clone, Default)]
pub struct DualBidiMap<F, B> {
    forward: F,
    backward: B,
}

/// A bidirectional map hashed in both directions.
pub type HashBidiMap<K, V> = DualBidiMap<HashMap<K, V>, HashMap<V, K>>;

/// A bidirectional map ordered in both directions.
pub type TreeBidiMap<K, V> = DualBidiMap<BTreeMap<K, V>, BTreeMap<V, K>>;

impl<F: Default, B: Default> DualBidiMap<F, B> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, B> DualBidiMap<F, B> {
    /// Returns the `K -> V` direction.
    pub const fn forward(&self) -> &F {
        &self.forward
    }

    /// Returns the `V -> K` direction.
    pub const fn backward(&self) -> &B {
        &self.backward
    }

    /// Swaps the directions, turning values into keys.
    pub fn into_inverse(self) -> DualBidiMap<B, F> {
        DualBidiMap {
            forward: self.backward,
            backward: self.forward,
        }
    }
}

impl<F: Clone, B: Clone> DualBidiMap<F, B> {
    /// Returns a copy with the directions swapped.
    pub fn inverse(&self) -> DualBidiMap<B, F> {
        self.clone().into_inverse()
    }
}

impl<F: Container, B> Container for DualBidiMap<F, B> {
    fn len(&self) -> usize {
        self.forward.len()
    }

    fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<K, V, F, B> MapCollection for DualBidiMap<F, B>
where
    F: MapCollection<Key = K, Value = V>,
    B: MapCollection<Key = V, Value = K>,
    K: Clone,
    V: Clone,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> Option<&V> {
        self.forward.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.forward.remove(&key);
        if let Some(previous_value) = &previous {
            self.backward.remove(previous_value);
        }
        if let Some(displaced_key) = self.backward.remove(&value) {
            self.forward.remove(&displaced_key);
        }
        self.forward.insert(key.clone(), value.clone());
        self.backward.insert(value, key);
        previous
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.forward.remove(key)?;
        self.backward.remove(&value);
        Some(value)
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&K, &V) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.forward.for_each_entry_until(visit)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) {
        let mut dropped = Vec::new();
        self.forward.retain(&mut |key, value| {
            let kept = keep(key, value);
            if !kept {
                dropped.push(value.clone());
            }
            kept
        });
        for value in &dropped {
            self.backward.remove(value);
        }
    }

    fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.backward.contains_key(value)
    }
}

impl<K, V, F, B> BidiMap for DualBidiMap<F, B>
where
    F: MapCollection<Key = K, Value = V>,
    B: MapCollection<Key = V, Value = K>,
    K: Clone,
    V: Clone,
{
    fn get_key(&self, value: &V) -> Option<&K> {
        self.backward.get(value)
    }

    fn remove_value(&mut self, value: &V) -> Option<K> {
        let key = self.backward.remove(value)?;
        self.forward.remove(&key);
        Some(key)
    }
}

impl<K, V, F, B> SortedMap for DualBidiMap<F, B>
where
    F: SortedMap<Key = K, Value = V>,
    B: MapCollection<Key = V, Value = K>,
    K: Clone,
    V: Clone,
{
    fn range_entries<'a>(&'a self, range: &KeyRange<K>) -> RangeIter<'a, (&'a K, &'a V)> {
        self.forward.range_entries(range)
    }

    fn pop_first(&mut self) -> Option<(K, V)> {
        let (key, value) = self.forward.pop_first()?;
        self.backward.remove(&value);
        Some((key, value))
    }

    fn pop_last(&mut self) -> Option<(K, V)> {
        let (key, value) = self.forward.pop_last()?;
        self.backward.remove(&value);
        Some((key, value))
    }
}

impl<K, V, F, B> SortedBidiMap for DualBidiMap<F, B>
where
    F: SortedMap<Key = K, Value = V>,
    B: SortedMap<Key = V, Value = K>,
    K: Clone,
    V: Clone,
{
    fn value_range_entries<'a>(&'a self, range: &KeyRange<V>) -> RangeIter<'a, (&'a V, &'a K)> {
        self.backward.range_entries(range)
    }
}

impl<K, V, F, B> FromIterator<(K, V)> for DualBidiMap<F, B>
where
    F: MapCollection<Key = K, Value = V> + Default,
    B: MapCollection<Key = V, Value = K> + Default,
    K: Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, F, B> Extend<(K, V)> for DualBidiMap<F, B>
where
    F: MapCollection<Key = K, Value = V>,
    B: MapCollection<Key = V, Value = K>,
    K: Clone,
    V: Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            MapCollection::insert(self, key, value);
        }
    }
}

impl<F: PartialEq, B> PartialEq for DualBidiMap<F, B> {
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl<F: Eq, B> Eq for DualBidiMap<F, B> {}

impl<F: fmt::Debug, B> fmt::Debug for DualBidiMap<F, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("DualBidiMap")
            .field(&self.forward)
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<F: serde::Serialize, B> serde::Serialize for DualBidiMap<F, B> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.forward.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, F, B> serde::Deserialize<'de> for DualBidiMap<F, B>
where
    F: serde::Deserialize<'de> + MapCollection<Key = K, Value = V> + Default,
    B: MapCollection<Key = V, Value = K> + Default,
    K: Clone,
    V: Clone,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = F::deserialize(deserializer)?;
        let mut map = Self::default();
        // Re-inserting keeps values unique even if the input repeats one.
        let _ = source.for_each_entry_until(&mut |key, value| {
            MapCollection::insert(&mut map, key.clone(), value.clone());
            ControlFlow::Continue(())
        });
        Ok(map)
    }
}
