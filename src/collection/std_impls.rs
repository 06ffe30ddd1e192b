//! Capability implementations for the standard containers.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::ops::ControlFlow;

use super::{
    Container, FilterableCollection, KeyRange, MapCollection, MutableCollection, RangeIter,
    SortedMap, SortedSet,
};
use crate::filter::Filter;

fn fold_all<'a, T: 'a, A>(
    mut elements: impl Iterator<Item = &'a T>,
    initial: A,
    step: &mut dyn FnMut(A, &T) -> ControlFlow<A, A>,
) -> ControlFlow<A, A> {
    elements.try_fold(initial, |accumulator, element| step(accumulator, element))
}

fn visit_entries<'a, K: 'a, V: 'a>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    visit: &mut dyn FnMut(&K, &V) -> ControlFlow<()>,
) -> ControlFlow<()> {
    for (key, value) in entries {
        visit(key, value)?;
    }
    ControlFlow::Continue(())
}

// =============================================================================
// Sequences
// =============================================================================

macro_rules! sequence_impls {
    ($($sequence:ident => $push:ident),* $(,)?) => {
        $(
            impl<T> Container for $sequence<T> {
                #[inline]
                fn len(&self) -> usize {
                    $sequence::len(self)
                }

                #[inline]
                fn is_empty(&self) -> bool {
                    $sequence::is_empty(self)
                }
            }

            impl<T: Clone> FilterableCollection for $sequence<T> {
                type Item = T;
                type Filtered = Self;

                fn fold_elements<A>(
                    &self,
                    initial: A,
                    step: &mut dyn FnMut(A, &T) -> ControlFlow<A, A>,
                ) -> ControlFlow<A, A> {
                    fold_all(self.iter(), initial, step)
                }

                fn filter<F>(&self, filter: &F) -> Self
                where
                    F: Filter<T> + ?Sized,
                {
                    self.iter()
                        .filter(|element| filter.accept(element))
                        .cloned()
                        .collect()
                }
            }

            impl<T: Clone + PartialEq> MutableCollection for $sequence<T> {
                fn insert(&mut self, element: T) -> bool {
                    self.$push(element);
                    true
                }

                fn remove(&mut self, element: &T) -> bool {
                    match self.iter().position(|candidate| candidate == element) {
                        Some(index) => {
                            let _removed = $sequence::remove(self, index);
                            true
                        }
                        None => false,
                    }
                }

                fn contains(&self, element: &T) -> bool {
                    self.iter().any(|candidate| candidate == element)
                }

                fn clear(&mut self) {
                    $sequence::clear(self);
                }

                fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) {
                    $sequence::retain(self, |element| keep(element));
                }
            }
        )*
    };
}

sequence_impls!(Vec => push, VecDeque => push_back);

// =============================================================================
// Sets
// =============================================================================

impl<T, S> Container for HashSet<T, S> {
    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }
}

impl<T, S> FilterableCollection for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Default,
{
    type Item = T;
    type Filtered = Self;

    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &T) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A> {
        fold_all(self.iter(), initial, step)
    }

    fn filter<F>(&self, filter: &F) -> Self
    where
        F: Filter<T> + ?Sized,
    {
        self.iter()
            .filter(|element| filter.accept(element))
            .cloned()
            .collect()
    }
}

impl<T, S> MutableCollection for HashSet<T, S>
where
    T: Clone + Eq + Hash,
    S: BuildHasher + Default,
{
    fn insert(&mut self, element: T) -> bool {
        Self::insert(self, element)
    }

    fn remove(&mut self, element: &T) -> bool {
        Self::remove(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) {
        Self::retain(self, |element| keep(element));
    }
}

impl<T> Container for BTreeSet<T> {
    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }
}

impl<T: Clone + Ord> FilterableCollection for BTreeSet<T> {
    type Item = T;
    type Filtered = Self;

    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &T) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A> {
        fold_all(self.iter(), initial, step)
    }

    fn filter<F>(&self, filter: &F) -> Self
    where
        F: Filter<T> + ?Sized,
    {
        self.iter()
            .filter(|element| filter.accept(element))
            .cloned()
            .collect()
    }
}

impl<T: Clone + Ord> MutableCollection for BTreeSet<T> {
    fn insert(&mut self, element: T) -> bool {
        Self::insert(self, element)
    }

    fn remove(&mut self, element: &T) -> bool {
        Self::remove(self, element)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&T) -> bool) {
        Self::retain(self, |element| keep(element));
    }
}

impl<T: Clone + Ord> SortedSet for BTreeSet<T> {
    fn range_iter<'a>(&'a self, range: &KeyRange<T>) -> RangeIter<'a, &'a T> {
        if range.is_degenerate() {
            Box::new(std::iter::empty())
        } else {
            Box::new(self.range::<T, _>(range.as_bounds()))
        }
    }

    fn pop_first(&mut self) -> Option<T> {
        Self::pop_first(self)
    }

    fn pop_last(&mut self) -> Option<T> {
        Self::pop_last(self)
    }
}

// =============================================================================
// Maps
// =============================================================================

impl<K, V, S> Container for HashMap<K, V, S> {
    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }
}

impl<K, V, S> MapCollection for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> Option<&V> {
        Self::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        Self::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        Self::remove(self, key)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&K, &V) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        visit_entries(self.iter(), visit)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) {
        Self::retain(self, |key, value| keep(key, value));
    }

    fn contains_key(&self, key: &K) -> bool {
        Self::contains_key(self, key)
    }
}

impl<K, V> Container for BTreeMap<K, V> {
    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }
}

impl<K: Ord, V> MapCollection for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> Option<&V> {
        Self::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        Self::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        Self::remove(self, key)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&K, &V) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        visit_entries(self.iter(), visit)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&K, &V) -> bool) {
        Self::retain(self, |key, value| keep(key, value));
    }

    fn contains_key(&self, key: &K) -> bool {
        Self::contains_key(self, key)
    }
}

impl<K: Ord, V> SortedMap for BTreeMap<K, V> {
    fn range_entries<'a>(&'a self, range: &KeyRange<K>) -> RangeIter<'a, (&'a K, &'a V)> {
        if range.is_degenerate() {
            Box::new(std::iter::empty())
        } else {
            Box::new(self.range::<K, _>(range.as_bounds()))
        }
    }

    fn pop_first(&mut self) -> Option<(K, V)> {
        Self::pop_first(self)
    }

    fn pop_last(&mut self) -> Option<(K, V)> {
        Self::pop_last(self)
    }
}
