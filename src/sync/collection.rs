//! Guarded element operations.

use super::{GuardedView, Synchronized};
use crate::collection::{Container, FilterableCollection, MutableCollection};
use crate::error::Result;

/// Element operations on a guarded collection or one of its views.
///
/// Every method acquires the view's guard for its whole duration. Methods
/// take `&self`: the container is shared between handles and mutated
/// through the guard.
pub trait GuardedCollection: GuardedView + Container {
    /// The element type.
    type Element: Clone;

    /// Returns `true` if `element` is visible through this view.
    fn contains(&self, element: &Self::Element) -> bool;

    /// Adds `element`. Returns `false` if a set already contained it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// the view is restricted to a range that does not contain `element`.
    fn insert(&self, element: Self::Element) -> Result<bool>;

    /// Removes one occurrence of `element`. Returns `true` if it was present.
    fn remove(&self, element: &Self::Element) -> bool;

    /// Removes every element visible through this view.
    fn clear(&self);

    /// Adds every element of `elements` under a single acquisition.
    ///
    /// Elements are collected before the guard is taken, so the iterator may
    /// itself read from this view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument),
    /// without adding anything, if some element lies outside the view's
    /// range.
    fn extend<I>(&self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = Self::Element>;

    /// Keeps only the visible elements for which `keep` returns `true`.
    fn retain<F>(&self, keep: F)
    where
        F: FnMut(&Self::Element) -> bool;

    /// Returns an iterator over a copy of the elements taken under the guard.
    ///
    /// The traversal itself is not guarded: later changes are not reflected.
    fn iter(&self) -> std::vec::IntoIter<Self::Element>;
}

impl<C> GuardedCollection for Synchronized<C>
where
    C: MutableCollection,
    C::Item: Clone,
{
    type Element = C::Item;

    fn contains(&self, element: &C::Item) -> bool {
        self.with_read(|container| container.contains(element))
    }

    fn insert(&self, element: C::Item) -> Result<bool> {
        Ok(self.with_write(|container| container.insert(element)))
    }

    fn remove(&self, element: &C::Item) -> bool {
        self.with_write(|container| container.remove(element))
    }

    fn clear(&self) {
        self.with_write(MutableCollection::clear);
    }

    fn extend<I>(&self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = C::Item>,
    {
        let elements: Vec<C::Item> = elements.into_iter().collect();
        self.with_write(|container| {
            for element in elements {
                container.insert(element);
            }
        });
        Ok(())
    }

    fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&C::Item) -> bool,
    {
        self.with_write(|container| container.retain(&mut keep));
    }

    fn iter(&self) -> std::vec::IntoIter<C::Item> {
        self.to_vec().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[fixture]
    fn numbers() -> Synchronized<Vec<i32>> {
        Synchronized::new(vec![3, 1, 2])
    }

    #[rstest]
    fn delegates_membership(numbers: Synchronized<Vec<i32>>) {
        assert!(numbers.contains(&1));
        assert!(!numbers.contains(&9));
        assert_eq!(numbers.len(), 3);
        assert!(!numbers.is_empty());
    }

    #[rstest]
    fn insert_and_remove_report_container_results() {
        let set = Synchronized::new(HashSet::from([1]));
        assert_eq!(set.insert(1), Ok(false));
        assert_eq!(set.insert(2), Ok(true));
        assert!(set.remove(&1));
        assert!(!set.remove(&1));
    }

    #[rstest]
    fn extend_may_read_from_same_view(numbers: Synchronized<Vec<i32>>) {
        let doubled: Vec<i32> = numbers.iter().map(|value| value * 2).collect();
        numbers.extend(doubled).unwrap();
        assert_eq!(numbers.to_vec(), vec![3, 1, 2, 6, 2, 4]);
    }

    #[rstest]
    fn retain_and_clear(numbers: Synchronized<Vec<i32>>) {
        numbers.retain(|value| *value > 1);
        assert_eq!(numbers.to_vec(), vec![3, 2]);
        numbers.clear();
        assert!(numbers.is_empty());
    }

    #[rstest]
    fn iter_is_a_snapshot(numbers: Synchronized<Vec<i32>>) {
        let snapshot = numbers.iter();
        numbers.insert(4).unwrap();
        assert_eq!(snapshot.collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[rstest]
    fn writer_waits_for_guard_holder(numbers: Synchronized<Vec<i32>>) {
        let inserted = Arc::new(AtomicBool::new(false));
        let held = numbers.lock().acquire();

        let writer = {
            let numbers = numbers.clone();
            let inserted = Arc::clone(&inserted);
            thread::spawn(move || {
                numbers.insert(10).unwrap();
                inserted.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!inserted.load(Ordering::SeqCst));
        assert_eq!(numbers.len(), 3);
        drop(held);

        writer.join().unwrap();
        assert!(numbers.contains(&10));
    }
}
