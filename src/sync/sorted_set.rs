//! Guarded sorted sets and their range views.

use std::fmt;
use std::ops::{Bound, ControlFlow, RangeBounds};

use super::{GuardedCollection, GuardedView, Lock, Synchronized};
use crate::collection::{Container, FilterableCollection, KeyRange, RangeIter, SortedSet};
use crate::error::{Error, Result};
use crate::failure;
use crate::filter::Filter;

/// Navigation and range views over a guarded sorted set.
///
/// Every implementor can describe itself as a [`SubSetView`] (the root
/// covers the full range); the provided methods work through that view.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
/// use std::collections::BTreeSet;
///
/// let set = Synchronized::new(BTreeSet::from([10, 20, 30, 40]));
/// assert_eq!(set.floor(&25), Some(20));
/// assert_eq!(set.higher(&40), None);
///
/// let middle = set.sub_set(15..40).unwrap();
/// assert_eq!(middle.to_vec(), vec![20, 30]);
/// assert_eq!(middle.first(), Some(20));
///
/// // The view is live and scoped.
/// set.insert(35).unwrap();
/// assert_eq!(middle.last(), Some(35));
/// assert!(middle.insert(50).is_err());
/// ```
pub trait GuardedSortedSet: GuardedCollection<Element: Ord> {
    /// The sorted set behind the view.
    type Backing: SortedSet<Item = Self::Element>;

    /// Returns this view as a range view over its backing set.
    fn range_view(&self) -> SubSetView<Self::Backing>;

    /// Returns the smallest visible element.
    fn first(&self) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::full(), |mut elements| elements.next().cloned())
    }

    /// Returns the largest visible element.
    fn last(&self) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::full(), |mut elements| elements.next_back().cloned())
    }

    /// Returns the largest visible element `<= element`.
    fn floor(&self, element: &Self::Element) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::at_most(element.clone()), |mut elements| {
            elements.next_back().cloned()
        })
    }

    /// Returns the smallest visible element `>= element`.
    fn ceiling(&self, element: &Self::Element) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::at_least(element.clone()), |mut elements| {
            elements.next().cloned()
        })
    }

    /// Returns the largest visible element `< element`.
    fn lower(&self, element: &Self::Element) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::less_than(element.clone()), |mut elements| {
            elements.next_back().cloned()
        })
    }

    /// Returns the smallest visible element `> element`.
    fn higher(&self, element: &Self::Element) -> Option<Self::Element> {
        let view = self.range_view();
        view.read_range(&KeyRange::greater_than(element.clone()), |mut elements| {
            elements.next().cloned()
        })
    }

    /// Removes and returns the smallest visible element.
    fn pop_first(&self) -> Option<Self::Element> {
        self.range_view().pop_end(false)
    }

    /// Removes and returns the largest visible element.
    fn pop_last(&self) -> Option<Self::Element> {
        self.range_view().pop_end(true)
    }

    /// Returns a live view of the elements within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `range` is inverted or reaches
    /// outside this view's own range.
    fn sub_set<R>(&self, range: R) -> Result<SubSetView<Self::Backing>>
    where
        R: RangeBounds<Self::Element>,
    {
        self.range_view()
            .narrowed(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// Returns a live view of the elements below `to` (or up to it, when
    /// `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `to` lies outside this view.
    fn head_set(&self, to: Self::Element, inclusive: bool) -> Result<SubSetView<Self::Backing>> {
        let upper = if inclusive {
            Bound::Included(to)
        } else {
            Bound::Excluded(to)
        };
        self.range_view().narrowed(Bound::Unbounded, upper)
    }

    /// Returns a live view of the elements from `from` upwards (strictly
    /// above it, unless `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `from` lies outside this view.
    fn tail_set(
        &self,
        from: Self::Element,
        inclusive: bool,
    ) -> Result<SubSetView<Self::Backing>> {
        let lower = if inclusive {
            Bound::Included(from)
        } else {
            Bound::Excluded(from)
        };
        self.range_view().narrowed(lower, Bound::Unbounded)
    }

    /// Returns a live view of the same elements in descending order.
    fn descending_set(&self) -> DescendingSetView<Self::Backing> {
        DescendingSetView {
            ascending: self.range_view(),
        }
    }

    /// Returns a copy of the visible elements, largest first.
    fn descending_iter(&self) -> std::iter::Rev<std::vec::IntoIter<Self::Element>> {
        self.iter().rev()
    }
}

// =============================================================================
// SubSetView
// =============================================================================

/// A live view of the elements of a guarded sorted set within a
/// [`KeyRange`].
///
/// Reads see only elements inside the range; inserting an element outside it
/// fails with [`Error::InvalidArgument`]; removing one is a no-op.
pub struct SubSetView<S: SortedSet> {
    root: Synchronized<S>,
    range: KeyRange<S::Item>,
}

impl<S: SortedSet> SubSetView<S>
where
    S::Item: Ord + Clone,
{
    /// Returns the range this view is restricted to.
    pub const fn range(&self) -> &KeyRange<S::Item> {
        &self.range
    }

    /// Runs `read` over the visible elements within `within`, ascending,
    /// under the guard.
    fn read_range<R>(
        &self,
        within: &KeyRange<S::Item>,
        read: impl FnOnce(RangeIter<'_, &S::Item>) -> R,
    ) -> R {
        let bounds = self.range.intersect(within);
        self.root.with_read(|set| read(set.range_iter(&bounds)))
    }

    fn pop_end(&self, last: bool) -> Option<S::Item> {
        if self.range.is_full() {
            return self.root.with_write(|set| {
                if last {
                    set.pop_last()
                } else {
                    set.pop_first()
                }
            });
        }
        self.root.with_write(|set| {
            let mut elements = set.range_iter(&self.range);
            let end = if last {
                elements.next_back()
            } else {
                elements.next()
            }
            .cloned();
            drop(elements);
            if let Some(element) = &end {
                set.remove(element);
            }
            end
        })
    }

    fn narrowed(&self, lower: Bound<S::Item>, upper: Bound<S::Item>) -> Result<Self> {
        Ok(Self {
            root: self.root.clone(),
            range: self.range.narrow(lower, upper)?,
        })
    }

    fn out_of_range(context: &'static str) -> Error {
        failure::raise(Error::invalid_argument(context, "element out of range"))
    }
}

impl<S: SortedSet> Clone for SubSetView<S>
where
    S::Item: Clone,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            range: self.range.clone(),
        }
    }
}

impl<S: SortedSet> fmt::Debug for SubSetView<S>
where
    S::Item: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubSetView")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl<S: SortedSet> GuardedView for SubSetView<S> {
    fn lock(&self) -> &Lock {
        self.root.lock()
    }
}

impl<S: SortedSet> Container for SubSetView<S>
where
    S::Item: Ord + Clone,
{
    fn len(&self) -> usize {
        if self.range.is_full() {
            return self.root.len();
        }
        self.read_range(&KeyRange::full(), |elements| elements.count())
    }

    fn is_empty(&self) -> bool {
        self.read_range(&KeyRange::full(), |mut elements| elements.next().is_none())
    }
}

impl<S: SortedSet> FilterableCollection for SubSetView<S>
where
    S::Item: Ord + Clone,
{
    type Item = S::Item;
    type Filtered = Synchronized<Vec<S::Item>>;

    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &S::Item) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A> {
        self.to_vec()
            .iter()
            .try_fold(initial, |accumulator, element| step(accumulator, element))
    }

    fn filter<F>(&self, filter: &F) -> Synchronized<Vec<S::Item>>
    where
        F: Filter<S::Item> + ?Sized,
    {
        let accepted = self.read_range(&KeyRange::full(), |elements| {
            elements
                .filter(|element| filter.accept(element))
                .cloned()
                .collect()
        });
        self.root.derive(accepted)
    }

    fn to_vec(&self) -> Vec<S::Item> {
        self.read_range(&KeyRange::full(), |elements| elements.cloned().collect())
    }
}

impl<S: SortedSet> GuardedCollection for SubSetView<S>
where
    S::Item: Ord + Clone,
{
    type Element = S::Item;

    fn contains(&self, element: &S::Item) -> bool {
        self.range.contains(element) && self.root.contains(element)
    }

    fn insert(&self, element: S::Item) -> Result<bool> {
        if !self.range.contains(&element) {
            return Err(Self::out_of_range("SubSetView::insert"));
        }
        self.root.insert(element)
    }

    fn remove(&self, element: &S::Item) -> bool {
        self.range.contains(element) && self.root.remove(element)
    }

    fn clear(&self) {
        if self.range.is_full() {
            self.root.clear();
        } else {
            let range = &self.range;
            self.root.retain(|element| !range.contains(element));
        }
    }

    fn extend<I>(&self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = S::Item>,
    {
        let elements: Vec<S::Item> = elements.into_iter().collect();
        if !elements.iter().all(|element| self.range.contains(element)) {
            return Err(Self::out_of_range("SubSetView::extend"));
        }
        self.root.extend(elements)
    }

    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&S::Item) -> bool,
    {
        let range = &self.range;
        self.root
            .retain(|element| !range.contains(element) || keep(element));
    }

    fn iter(&self) -> std::vec::IntoIter<S::Item> {
        self.to_vec().into_iter()
    }
}

impl<S: SortedSet> GuardedSortedSet for SubSetView<S>
where
    S::Item: Ord + Clone,
{
    type Backing = S;

    fn range_view(&self) -> SubSetView<S> {
        self.clone()
    }
}

impl<S: SortedSet> GuardedSortedSet for Synchronized<S>
where
    S::Item: Ord + Clone,
{
    type Backing = S;

    fn range_view(&self) -> SubSetView<S> {
        SubSetView {
            root: self.clone(),
            range: KeyRange::full(),
        }
    }
}

// =============================================================================
// DescendingSetView
// =============================================================================

/// A live view of a guarded sorted set (or range of one) in descending
/// order.
///
/// Navigation is mirrored: `first` is the largest element, `floor` finds the
/// smallest element `>=` its argument, and so on.
pub struct DescendingSetView<S: SortedSet> {
    ascending: SubSetView<S>,
}

impl<S: SortedSet> DescendingSetView<S>
where
    S::Item: Ord + Clone,
{
    /// Returns the largest element.
    pub fn first(&self) -> Option<S::Item> {
        self.ascending.last()
    }

    /// Returns the smallest element.
    pub fn last(&self) -> Option<S::Item> {
        self.ascending.first()
    }

    /// Returns the next element at or after `element` in descending order.
    pub fn floor(&self, element: &S::Item) -> Option<S::Item> {
        self.ascending.ceiling(element)
    }

    /// Returns the last element at or before `element` in descending order.
    pub fn ceiling(&self, element: &S::Item) -> Option<S::Item> {
        self.ascending.floor(element)
    }

    /// Returns the next element strictly after `element` in descending order.
    pub fn lower(&self, element: &S::Item) -> Option<S::Item> {
        self.ascending.higher(element)
    }

    /// Returns the last element strictly before `element` in descending order.
    pub fn higher(&self, element: &S::Item) -> Option<S::Item> {
        self.ascending.lower(element)
    }

    /// Removes and returns the largest element.
    pub fn pop_first(&self) -> Option<S::Item> {
        self.ascending.pop_last()
    }

    /// Removes and returns the smallest element.
    pub fn pop_last(&self) -> Option<S::Item> {
        self.ascending.pop_first()
    }

    /// Returns `true` if `element` is visible through this view.
    pub fn contains(&self, element: &S::Item) -> bool {
        self.ascending.contains(element)
    }

    /// Adds `element` to the underlying set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `element` lies outside the
    /// view's range.
    pub fn insert(&self, element: S::Item) -> Result<bool> {
        self.ascending.insert(element)
    }

    /// Removes `element` from the underlying set.
    pub fn remove(&self, element: &S::Item) -> bool {
        self.ascending.remove(element)
    }

    /// Returns a copy of the elements, largest first.
    pub fn iter(&self) -> std::iter::Rev<std::vec::IntoIter<S::Item>> {
        self.ascending.iter().rev()
    }

    /// Returns the ascending view this view mirrors.
    pub fn descending_set(&self) -> SubSetView<S> {
        self.ascending.clone()
    }
}

impl<S: SortedSet> Clone for DescendingSetView<S>
where
    S::Item: Clone,
{
    fn clone(&self) -> Self {
        Self {
            ascending: self.ascending.clone(),
        }
    }
}

impl<S: SortedSet> GuardedView for DescendingSetView<S> {
    fn lock(&self) -> &Lock {
        self.ascending.lock()
    }
}

impl<S: SortedSet> Container for DescendingSetView<S>
where
    S::Item: Ord + Clone,
{
    fn len(&self) -> usize {
        self.ascending.len()
    }

    fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }
}

impl<S: SortedSet> FilterableCollection for DescendingSetView<S>
where
    S::Item: Ord + Clone,
{
    type Item = S::Item;
    type Filtered = Synchronized<Vec<S::Item>>;

    fn fold_elements<A>(
        &self,
        initial: A,
        step: &mut dyn FnMut(A, &S::Item) -> ControlFlow<A, A>,
    ) -> ControlFlow<A, A> {
        self.iter()
            .try_fold(initial, |accumulator, element| step(accumulator, &element))
    }

    fn filter<F>(&self, filter: &F) -> Synchronized<Vec<S::Item>>
    where
        F: Filter<S::Item> + ?Sized,
    {
        let accepted = self.ascending.filter(filter);
        accepted.with_write(|elements| elements.reverse());
        accepted
    }

    fn to_vec(&self) -> Vec<S::Item> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::BTreeSet;

    #[fixture]
    fn decades() -> Synchronized<BTreeSet<i32>> {
        Synchronized::new(BTreeSet::from([10, 20, 30, 40, 50]))
    }

    #[rstest]
    #[case::floor_between(25, Some(20), Some(30), Some(20), Some(30))]
    #[case::on_element(30, Some(30), Some(30), Some(20), Some(40))]
    #[case::below_all(5, None, Some(10), None, Some(10))]
    #[case::above_all(55, Some(50), None, Some(50), None)]
    fn navigation(
        decades: Synchronized<BTreeSet<i32>>,
        #[case] probe: i32,
        #[case] floor: Option<i32>,
        #[case] ceiling: Option<i32>,
        #[case] lower: Option<i32>,
        #[case] higher: Option<i32>,
    ) {
        assert_eq!(decades.floor(&probe), floor);
        assert_eq!(decades.ceiling(&probe), ceiling);
        assert_eq!(decades.lower(&probe), lower);
        assert_eq!(decades.higher(&probe), higher);
    }

    #[rstest]
    fn sub_set_is_scoped(decades: Synchronized<BTreeSet<i32>>) {
        let middle = decades.sub_set(20..=40).unwrap();
        assert_eq!(middle.len(), 3);
        assert_eq!(middle.first(), Some(20));
        assert_eq!(middle.last(), Some(40));
        assert_eq!(middle.floor(&15), None);
        assert!(!middle.contains(&10));
        assert!(!middle.remove(&10));
        assert!(decades.contains(&10));
    }

    #[rstest]
    fn sub_set_rejects_out_of_range_insert(decades: Synchronized<BTreeSet<i32>>) {
        let middle = decades.sub_set(20..40).unwrap();
        let error = middle.insert(40).unwrap_err();
        assert!(error.is_invalid_argument());
        assert_eq!(middle.insert(25), Ok(true));
        assert!(decades.contains(&25));
    }

    #[rstest]
    fn extend_is_all_or_nothing(decades: Synchronized<BTreeSet<i32>>) {
        let head = decades.head_set(30, false).unwrap();
        assert!(head.extend([1, 2, 99]).is_err());
        assert_eq!(decades.len(), 5);
        head.extend([1, 2]).unwrap();
        assert_eq!(decades.len(), 7);
    }

    #[rstest]
    fn nested_views_must_stay_inside_parent(decades: Synchronized<BTreeSet<i32>>) {
        let tail = decades.tail_set(20, true).unwrap();
        assert!(tail.sub_set(30..).is_ok());
        assert!(tail.sub_set(10..).unwrap_err().is_invalid_argument());
        assert!(tail.head_set(15, true).is_err());
    }

    #[rstest]
    fn inverted_range_is_rejected(decades: Synchronized<BTreeSet<i32>>) {
        let inverted = (Bound::Included(40), Bound::Included(20));
        assert!(decades.sub_set(inverted).is_err());
    }

    #[rstest]
    fn clear_only_touches_range(decades: Synchronized<BTreeSet<i32>>) {
        let tail = decades.tail_set(30, false).unwrap();
        tail.clear();
        assert_eq!(decades.to_vec(), vec![10, 20, 30]);
        assert!(tail.is_empty());
    }

    #[rstest]
    fn pop_respects_range(decades: Synchronized<BTreeSet<i32>>) {
        let middle = decades.sub_set(20..=40).unwrap();
        assert_eq!(middle.pop_first(), Some(20));
        assert_eq!(middle.pop_last(), Some(40));
        assert_eq!(decades.to_vec(), vec![10, 30, 50]);
        assert_eq!(decades.pop_first(), Some(10));
    }

    #[rstest]
    fn descending_view_mirrors_navigation(decades: Synchronized<BTreeSet<i32>>) {
        let descending = decades.descending_set();
        assert_eq!(descending.first(), Some(50));
        assert_eq!(descending.floor(&25), Some(30));
        assert_eq!(descending.higher(&30), Some(20));
        assert_eq!(descending.to_vec(), vec![50, 40, 30, 20, 10]);
        assert_eq!(descending.descending_set().first(), Some(10));
        assert_eq!(
            decades.descending_iter().collect::<Vec<_>>(),
            vec![50, 40, 30, 20, 10]
        );
    }

    #[rstest]
    fn descending_filter_keeps_descending_order(decades: Synchronized<BTreeSet<i32>>) {
        let filtered = decades.descending_set().filter(&|value: &i32| *value > 20);
        assert_eq!(filtered.to_vec(), vec![50, 40, 30]);
        assert!(filtered.lock().same_as(decades.lock()));
    }

    #[rstest]
    fn views_share_root_guard(decades: Synchronized<BTreeSet<i32>>) {
        let sub = decades.sub_set(10..30).unwrap();
        let descending = sub.descending_set();
        assert!(sub.lock().same_as(decades.lock()));
        assert!(descending.lock().same_as(decades.lock()));
        let filtered = sub.filter(&|_: &i32| true);
        assert!(filtered.lock().same_as(decades.lock()));
    }
}
