//! Guarded sorted maps and their sub-map views.

use std::fmt;
use std::ops::{Bound, ControlFlow, RangeBounds};

use super::{GuardedMap, GuardedView, Lock, Synchronized};
use crate::collection::{Container, KeyRange, SortedMap};
use crate::error::{Error, Result};
use crate::failure;

/// Key navigation and sub-map views over a guarded sorted map.
///
/// Like [`GuardedSortedSet`](super::GuardedSortedSet), every implementor
/// can describe itself as a [`SubMapView`]; the provided methods work
/// through that view.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
/// use std::collections::BTreeMap;
///
/// let prices = Synchronized::new(BTreeMap::from([(10, "ten"), (20, "twenty"), (30, "thirty")]));
/// assert_eq!(prices.floor_entry(&25), Some((20, "twenty")));
/// assert_eq!(prices.higher_key(&30), None);
///
/// let cheap = prices.head_map(20, true).unwrap();
/// assert_eq!(cheap.last_key(), Some(20));
/// assert_eq!(cheap.pop_first(), Some((10, "ten")));
/// assert_eq!(prices.len(), 2);
///
/// let descending = prices.descending_map();
/// assert_eq!(descending.first_key(), Some(30));
/// ```
pub trait GuardedSortedMap: GuardedMap<Key: Ord> {
    /// The sorted map behind the view.
    type Backing: SortedMap<Key = Self::Key, Value = Self::Value>;

    /// Returns this view as a sub-map view over its backing map.
    fn range_view(&self) -> SubMapView<Self::Backing>;

    /// Returns the smallest visible key.
    fn first_key(&self) -> Option<Self::Key> {
        self.first_entry().map(|(key, _)| key)
    }

    /// Returns the largest visible key.
    fn last_key(&self) -> Option<Self::Key> {
        self.last_entry().map(|(key, _)| key)
    }

    /// Returns the entry with the smallest visible key.
    fn first_entry(&self) -> Option<(Self::Key, Self::Value)> {
        self.range_view().entry_within(&KeyRange::full(), false)
    }

    /// Returns the entry with the largest visible key.
    fn last_entry(&self) -> Option<(Self::Key, Self::Value)> {
        self.range_view().entry_within(&KeyRange::full(), true)
    }

    /// Returns the entry with the largest key `<= key`.
    fn floor_entry(&self, key: &Self::Key) -> Option<(Self::Key, Self::Value)> {
        self.range_view()
            .entry_within(&KeyRange::at_most(key.clone()), true)
    }

    /// Returns the entry with the smallest key `>= key`.
    fn ceiling_entry(&self, key: &Self::Key) -> Option<(Self::Key, Self::Value)> {
        self.range_view()
            .entry_within(&KeyRange::at_least(key.clone()), false)
    }

    /// Returns the entry with the largest key `< key`.
    fn lower_entry(&self, key: &Self::Key) -> Option<(Self::Key, Self::Value)> {
        self.range_view()
            .entry_within(&KeyRange::less_than(key.clone()), true)
    }

    /// Returns the entry with the smallest key `> key`.
    fn higher_entry(&self, key: &Self::Key) -> Option<(Self::Key, Self::Value)> {
        self.range_view()
            .entry_within(&KeyRange::greater_than(key.clone()), false)
    }

    /// Returns the largest key `<= key`.
    fn floor_key(&self, key: &Self::Key) -> Option<Self::Key> {
        self.floor_entry(key).map(|(found, _)| found)
    }

    /// Returns the smallest key `>= key`.
    fn ceiling_key(&self, key: &Self::Key) -> Option<Self::Key> {
        self.ceiling_entry(key).map(|(found, _)| found)
    }

    /// Returns the largest key `< key`.
    fn lower_key(&self, key: &Self::Key) -> Option<Self::Key> {
        self.lower_entry(key).map(|(found, _)| found)
    }

    /// Returns the smallest key `> key`.
    fn higher_key(&self, key: &Self::Key) -> Option<Self::Key> {
        self.higher_entry(key).map(|(found, _)| found)
    }

    /// Removes and returns the entry with the smallest visible key.
    fn pop_first(&self) -> Option<(Self::Key, Self::Value)> {
        self.range_view().pop_end(false)
    }

    /// Removes and returns the entry with the largest visible key.
    fn pop_last(&self) -> Option<(Self::Key, Self::Value)> {
        self.range_view().pop_end(true)
    }

    /// Returns a live view of the entries whose keys fall within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `range` is inverted or reaches
    /// outside this view's own range.
    fn sub_map<R>(&self, range: R) -> Result<SubMapView<Self::Backing>>
    where
        R: RangeBounds<Self::Key>,
    {
        self.range_view()
            .narrowed(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// Returns a live view of the entries with keys below `to` (or up to it,
    /// when `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `to` lies outside this view.
    fn head_map(&self, to: Self::Key, inclusive: bool) -> Result<SubMapView<Self::Backing>> {
        let upper = if inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        self.range_view().narrowed(Bound::Unbounded, upper)
    }

    /// Returns a live view of the entries with keys from `from` upwards
    /// (strictly above it, unless `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `from` lies outside this view.
    fn tail_map(&self, from: Self::Key, inclusive: bool) -> Result<SubMapView<Self::Backing>> {
        let lower = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        self.range_view().narrowed(lower, Bound::Unbounded)
    }

    /// Returns a live view of the same entries in descending key order.
    fn descending_map(&self) -> DescendingMapView<Self::Backing> {
        DescendingMapView {
            ascending: self.range_view(),
        }
    }
}

// =============================================================================
// SubMapView
// =============================================================================

/// A live view of the entries of a guarded sorted map whose keys fall within
/// a [`KeyRange`].
///
/// Lookups outside the range find nothing, removals outside it do nothing,
/// and inserting outside it fails with [`Error::InvalidArgument`].
pub struct SubMapView<M: SortedMap> {
    root: Synchronized<M>,
    range: KeyRange<M::Key>,
}

impl<M: SortedMap> SubMapView<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    /// Returns the key range this view is restricted to.
    pub const fn range(&self) -> &KeyRange<M::Key> {
        &self.range
    }

    fn entry_within(&self, within: &KeyRange<M::Key>, last: bool) -> Option<(M::Key, M::Value)> {
        let bounds = self.range.intersect(within);
        self.root.with_read(|map| {
            let mut entries = map.range_entries(&bounds);
            let entry = if last {
                entries.next_back()
            } else {
                entries.next()
            };
            entry.map(|(key, value)| (key.clone(), value.clone()))
        })
    }

    fn pop_end(&self, last: bool) -> Option<(M::Key, M::Value)> {
        self.root.with_write(|map| {
            if self.range.is_full() {
                return if last { map.pop_last() } else { map.pop_first() };
            }
            let key = {
                let mut entries = map.range_entries(&self.range);
                let entry = if last {
                    entries.next_back()
                } else {
                    entries.next()
                };
                entry.map(|(key, _)| key.clone())
            }?;
            map.remove(&key).map(|value| (key, value))
        })
    }

    fn narrowed(&self, lower: Bound<M::Key>, upper: Bound<M::Key>) -> Result<Self> {
        Ok(Self {
            root: self.root.clone(),
            range: self.range.narrow(lower, upper)?,
        })
    }

    fn visit(
        &self,
        descending: bool,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.root.with_read(|map| {
            let entries = map.range_entries(&self.range);
            if descending {
                for (key, value) in entries.rev() {
                    visit(key, value)?;
                }
            } else {
                for (key, value) in entries {
                    visit(key, value)?;
                }
            }
            ControlFlow::Continue(())
        })
    }
}

impl<M: SortedMap> Clone for SubMapView<M>
where
    M::Key: Clone,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            range: self.range.clone(),
        }
    }
}

impl<M: SortedMap> fmt::Debug for SubMapView<M>
where
    M::Key: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubMapView")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl<M: SortedMap> GuardedView for SubMapView<M> {
    fn lock(&self) -> &Lock {
        self.root.lock()
    }
}

impl<M: SortedMap> Container for SubMapView<M>
where
    M::Key: Ord,
{
    fn len(&self) -> usize {
        self.root
            .with_read(|map| map.range_entries(&self.range).count())
    }

    fn is_empty(&self) -> bool {
        self.root
            .with_read(|map| map.range_entries(&self.range).next().is_none())
    }
}

impl<M: SortedMap> GuardedMap for SubMapView<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    type Key = M::Key;
    type Value = M::Value;

    fn get(&self, key: &M::Key) -> Option<M::Value> {
        if self.range.contains(key) {
            self.root.get(key)
        } else {
            None
        }
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.range.contains(key) && self.root.contains_key(key)
    }

    fn insert(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        if !self.range.contains(&key) {
            return Err(failure::raise(Error::invalid_argument(
                "SubMapView::insert",
                "key out of range",
            )));
        }
        self.root.insert(key, value)
    }

    fn remove(&self, key: &M::Key) -> Option<M::Value> {
        if self.range.contains(key) {
            self.root.remove(key)
        } else {
            None
        }
    }

    fn clear(&self) {
        if self.range.is_full() {
            self.root.clear();
        } else {
            let range = &self.range;
            self.root.retain(|key, _| !range.contains(key));
        }
    }

    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&M::Key, &M::Value) -> bool,
    {
        let range = &self.range;
        self.root
            .retain(|key, value| !range.contains(key) || keep(key, value));
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.visit(false, visit)
    }

    fn admits(&self, key: &M::Key, _value: &M::Value) -> bool {
        self.range.contains(key)
    }
}

impl<M: SortedMap> GuardedSortedMap for SubMapView<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    type Backing = M;

    fn range_view(&self) -> SubMapView<M> {
        self.clone()
    }
}

impl<M: SortedMap> GuardedSortedMap for Synchronized<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    type Backing = M;

    fn range_view(&self) -> SubMapView<M> {
        SubMapView {
            root: self.clone(),
            range: KeyRange::full(),
        }
    }
}

// =============================================================================
// DescendingMapView
// =============================================================================

/// A live view of a guarded sorted map (or sub-map) in descending key order.
///
/// Implements [`GuardedMap`] with descending traversal; navigation is
/// mirrored (`first_key` is the largest key, `floor_key` finds the smallest
/// key `>=` its argument, and so on).
pub struct DescendingMapView<M: SortedMap> {
    ascending: SubMapView<M>,
}

impl<M: SortedMap> DescendingMapView<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    /// Returns the largest key.
    pub fn first_key(&self) -> Option<M::Key> {
        self.ascending.last_key()
    }

    /// Returns the smallest key.
    pub fn last_key(&self) -> Option<M::Key> {
        self.ascending.first_key()
    }

    /// Returns the entry with the largest key.
    pub fn first_entry(&self) -> Option<(M::Key, M::Value)> {
        self.ascending.last_entry()
    }

    /// Returns the entry with the smallest key.
    pub fn last_entry(&self) -> Option<(M::Key, M::Value)> {
        self.ascending.first_entry()
    }

    /// Returns the next key at or after `key` in descending order.
    pub fn floor_key(&self, key: &M::Key) -> Option<M::Key> {
        self.ascending.ceiling_key(key)
    }

    /// Returns the last key at or before `key` in descending order.
    pub fn ceiling_key(&self, key: &M::Key) -> Option<M::Key> {
        self.ascending.floor_key(key)
    }

    /// Returns the next key strictly after `key` in descending order.
    pub fn lower_key(&self, key: &M::Key) -> Option<M::Key> {
        self.ascending.higher_key(key)
    }

    /// Returns the last key strictly before `key` in descending order.
    pub fn higher_key(&self, key: &M::Key) -> Option<M::Key> {
        self.ascending.lower_key(key)
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_first(&self) -> Option<(M::Key, M::Value)> {
        self.ascending.pop_last()
    }

    /// Removes and returns the entry with the smallest key.
    pub fn pop_last(&self) -> Option<(M::Key, M::Value)> {
        self.ascending.pop_first()
    }

    /// Returns the ascending view this view mirrors.
    pub fn descending_map(&self) -> SubMapView<M> {
        self.ascending.clone()
    }
}

impl<M: SortedMap> Clone for DescendingMapView<M>
where
    M::Key: Clone,
{
    fn clone(&self) -> Self {
        Self {
            ascending: self.ascending.clone(),
        }
    }
}

impl<M: SortedMap> GuardedView for DescendingMapView<M> {
    fn lock(&self) -> &Lock {
        self.ascending.lock()
    }
}

impl<M: SortedMap> Container for DescendingMapView<M>
where
    M::Key: Ord,
{
    fn len(&self) -> usize {
        self.ascending.len()
    }

    fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }
}

impl<M: SortedMap> GuardedMap for DescendingMapView<M>
where
    M::Key: Ord + Clone,
    M::Value: Clone,
{
    type Key = M::Key;
    type Value = M::Value;

    fn get(&self, key: &M::Key) -> Option<M::Value> {
        self.ascending.get(key)
    }

    fn contains_key(&self, key: &M::Key) -> bool {
        self.ascending.contains_key(key)
    }

    fn insert(&self, key: M::Key, value: M::Value) -> Result<Option<M::Value>> {
        self.ascending.insert(key, value)
    }

    fn remove(&self, key: &M::Key) -> Option<M::Value> {
        self.ascending.remove(key)
    }

    fn clear(&self) {
        self.ascending.clear();
    }

    fn retain<F>(&self, keep: F)
    where
        F: FnMut(&M::Key, &M::Value) -> bool,
    {
        self.ascending.retain(keep);
    }

    fn for_each_entry_until(
        &self,
        visit: &mut dyn FnMut(&M::Key, &M::Value) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.ascending.visit(true, visit)
    }

    fn admits(&self, key: &M::Key, value: &M::Value) -> bool {
        self.ascending.admits(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use crate::collection::FilterableCollection;
    use std::collections::BTreeMap;

    type Grades = Synchronized<BTreeMap<u32, char>>;

    #[fixture]
    fn grades() -> Grades {
        Synchronized::new(BTreeMap::from([(50, 'F'), (60, 'D'), (70, 'C'), (80, 'B'), (90, 'A')]))
    }

    #[rstest]
    #[case::between(75, Some(70), Some(80), Some(70), Some(80))]
    #[case::exact(80, Some(80), Some(80), Some(70), Some(90))]
    #[case::below(10, None, Some(50), None, Some(50))]
    fn key_navigation(
        grades: Grades,
        #[case] probe: u32,
        #[case] floor: Option<u32>,
        #[case] ceiling: Option<u32>,
        #[case] lower: Option<u32>,
        #[case] higher: Option<u32>,
    ) {
        assert_eq!(grades.floor_key(&probe), floor);
        assert_eq!(grades.ceiling_key(&probe), ceiling);
        assert_eq!(grades.lower_key(&probe), lower);
        assert_eq!(grades.higher_key(&probe), higher);
    }

    #[rstest]
    fn first_and_last_entries(grades: Grades) {
        assert_eq!(grades.first_entry(), Some((50, 'F')));
        assert_eq!(grades.last_entry(), Some((90, 'A')));
        assert_eq!(grades.first_key(), Some(50));
        assert_eq!(grades.last_key(), Some(90));
    }

    #[rstest]
    fn sub_map_scopes_everything(grades: Grades) {
        let passing = grades.sub_map(60..90).unwrap();
        assert_eq!(passing.len(), 3);
        assert_eq!(passing.get(&90), None);
        assert!(!passing.contains_key(&50));
        assert_eq!(passing.remove(&50), None);
        assert_eq!(passing.first_key(), Some(60));
        assert_eq!(passing.last_key(), Some(80));
        assert_eq!(passing.ceiling_key(&85), None);
        assert_eq!(grades.len(), 5);
    }

    #[rstest]
    fn sub_map_rejects_out_of_range_insert(grades: Grades) {
        let passing = grades.sub_map(60..90).unwrap();
        assert!(passing.insert(95, 'S').unwrap_err().is_invalid_argument());
        assert_eq!(passing.insert(65, 'D'), Ok(None));
        assert_eq!(grades.get(&65), Some('D'));
    }

    #[rstest]
    fn extend_checks_every_entry_first(grades: Grades) {
        let high = grades.tail_map(80, true).unwrap();
        assert!(high.extend([(85, 'B'), (10, 'X')]).is_err());
        assert_eq!(grades.get(&85), None);
        high.extend([(85, 'B'), (95, 'A')]).unwrap();
        assert_eq!(high.len(), 4);
    }

    #[rstest]
    fn nested_sub_maps(grades: Grades) {
        let upper = grades.tail_map(60, false).unwrap();
        let middle = upper.head_map(80, true).unwrap();
        assert_eq!(middle.keys().to_vec(), vec![70, 80]);
        assert!(upper.head_map(50, true).unwrap_err().is_invalid_argument());
        assert!(upper.sub_map(70..=100).is_ok());
    }

    #[rstest]
    fn clear_and_retain_are_scoped(grades: Grades) {
        let low = grades.head_map(60, true).unwrap();
        low.clear();
        assert_eq!(grades.keys().to_vec(), vec![70, 80, 90]);

        let high = grades.tail_map(80, true).unwrap();
        high.retain(|_, grade| *grade == 'A');
        assert_eq!(grades.keys().to_vec(), vec![70, 90]);
    }

    #[rstest]
    fn pop_within_range(grades: Grades) {
        let middle = grades.sub_map(60..=80).unwrap();
        assert_eq!(middle.pop_first(), Some((60, 'D')));
        assert_eq!(middle.pop_last(), Some((80, 'B')));
        assert_eq!(grades.keys().to_vec(), vec![50, 70, 90]);
        assert_eq!(grades.pop_last(), Some((90, 'A')));
    }

    #[rstest]
    fn descending_map_reverses_order(grades: Grades) {
        let descending = grades.descending_map();
        assert_eq!(descending.keys().to_vec(), vec![90, 80, 70, 60, 50]);
        assert_eq!(descending.first_entry(), Some((90, 'A')));
        assert_eq!(descending.floor_key(&75), Some(80));
        assert_eq!(descending.higher_key(&75), Some(70));
        assert_eq!(descending.pop_first(), Some((90, 'A')));
        assert_eq!(descending.descending_map().first_key(), Some(50));
    }

    #[rstest]
    fn views_share_root_guard(grades: Grades) {
        let sub = grades.sub_map(60..).unwrap();
        assert!(sub.lock().same_as(grades.lock()));
        assert!(sub.keys().lock().same_as(grades.lock()));
        assert!(sub.descending_map().lock().same_as(grades.lock()));
    }
}
