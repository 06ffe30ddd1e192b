//! Filters comparing elements against a fixed target.
//!
//! Every ordered factory comes in two forms: one using the element type's
//! natural order (`T: Ord`) and a `*_by` variant taking an explicit
//! comparator, for types without a total order or when a different ordering
//! is wanted.
//!
//! # Examples
//!
//! ```rust
//! use guarded::filter::{comparison, Filter};
//! use std::sync::Arc;
//!
//! assert!(comparison::greater_than(3).accept(&4));
//! assert!(comparison::less_or_equal(3).accept(&3));
//! assert!(comparison::equal_to("a".to_string()).accept(&"a".to_string()));
//!
//! // Compare strings by length instead of lexicographically.
//! let longer = comparison::greater_than_by("abc", |left: &&str, right: &&str| {
//!     left.len().cmp(&right.len())
//! });
//! assert!(longer.accept(&"abcd"));
//! assert!(!longer.accept(&"zzz"));
//!
//! // Identity rather than equality.
//! let shared = Arc::new(7);
//! let same = comparison::same_instance(&shared);
//! assert!(same.accept(&Arc::clone(&shared)));
//! assert!(!same.accept(&Arc::new(7)));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Filter;

/// How an element must relate to the target to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `element == target`
    Equal,
    /// `element != target`
    NotEqual,
    /// `element > target`
    Greater,
    /// `element >= target`
    GreaterOrEqual,
    /// `element < target`
    Less,
    /// `element <= target`
    LessOrEqual,
}

impl Relation {
    /// Returns `true` if `ordering` (element compared to target) satisfies
    /// the relation.
    pub const fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering.is_eq(),
            Self::NotEqual => ordering.is_ne(),
            Self::Greater => ordering.is_gt(),
            Self::GreaterOrEqual => ordering.is_ge(),
            Self::Less => ordering.is_lt(),
            Self::LessOrEqual => ordering.is_le(),
        }
    }
}

/// Natural-order comparator used by the non-`_by` factories.
pub type NaturalOrder<T> = fn(&T, &T) -> Ordering;

/// Compares each element against `target` with `comparator`.
#[derive(Clone)]
pub struct Comparison<T, C> {
    target: T,
    comparator: C,
    relation: Relation,
}

impl<T, C> Comparison<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates a comparison filter.
    pub const fn new(target: T, comparator: C, relation: Relation) -> Self {
        Self {
            target,
            comparator,
            relation,
        }
    }

    /// Returns the target value.
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// Returns the relation checked by this filter.
    pub const fn relation(&self) -> Relation {
        self.relation
    }
}

impl<T, C> Filter<T> for Comparison<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn accept(&self, element: &T) -> bool {
        self.relation
            .holds((self.comparator)(element, &self.target))
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Comparison<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Comparison")
            .field("target", &self.target)
            .field("relation", &self.relation)
            .finish_non_exhaustive()
    }
}

macro_rules! ordered_factories {
    ($($(#[$attribute:meta])* $name:ident => $relation:ident;)*) => {
        paste::paste! {
            $(
                $(#[$attribute])*
                pub fn $name<T: Ord>(target: T) -> Comparison<T, NaturalOrder<T>> {
                    Comparison::new(target, T::cmp as NaturalOrder<T>, Relation::$relation)
                }

                #[doc = concat!("Like [`", stringify!($name), "`], ordered by `comparator`.")]
                pub fn [<$name _by>]<T, C>(target: T, comparator: C) -> Comparison<T, C>
                where
                    C: Fn(&T, &T) -> Ordering,
                {
                    Comparison::new(target, comparator, Relation::$relation)
                }
            )*
        }
    };
}

ordered_factories! {
    /// Accepts elements strictly greater than `target`.
    greater_than => Greater;
    /// Accepts elements greater than or equal to `target`.
    greater_or_equal => GreaterOrEqual;
    /// Accepts elements strictly less than `target`.
    less_than => Less;
    /// Accepts elements less than or equal to `target`.
    less_or_equal => LessOrEqual;
}

/// Like [`equal_to`], but equality is decided by `comparator`.
pub fn equal_to_by<T, C>(target: T, comparator: C) -> Comparison<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    Comparison::new(target, comparator, Relation::Equal)
}

/// Like [`not_equal_to`], but equality is decided by `comparator`.
pub fn not_equal_to_by<T, C>(target: T, comparator: C) -> Comparison<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    Comparison::new(target, comparator, Relation::NotEqual)
}

// =============================================================================
// Equality
// =============================================================================

/// Accepts elements equal (or, when negated, unequal) to a target.
///
/// Only needs `PartialEq`, so it works for floating point values too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equality<T> {
    target: T,
    negated: bool,
}

impl<T: PartialEq> Filter<T> for Equality<T> {
    #[inline]
    fn accept(&self, element: &T) -> bool {
        (element == &self.target) != self.negated
    }
}

/// Accepts elements equal to `target`.
pub const fn equal_to<T: PartialEq>(target: T) -> Equality<T> {
    Equality {
        target,
        negated: false,
    }
}

/// Accepts elements not equal to `target`.
pub const fn not_equal_to<T: PartialEq>(target: T) -> Equality<T> {
    Equality {
        target,
        negated: true,
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Accepts exactly the `Arc` handles pointing at the target allocation.
pub struct SameInstance<T: ?Sized> {
    target: Arc<T>,
}

impl<T: ?Sized> Filter<Arc<T>> for SameInstance<T> {
    #[inline]
    fn accept(&self, element: &Arc<T>) -> bool {
        Arc::ptr_eq(element, &self.target)
    }
}

impl<T: ?Sized> Clone for SameInstance<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for SameInstance<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SameInstance")
            .field("target", &self.target)
            .finish()
    }
}

/// Accepts elements that are the same allocation as `target`.
pub fn same_instance<T: ?Sized>(target: &Arc<T>) -> SameInstance<T> {
    SameInstance {
        target: Arc::clone(target),
    }
}

// =============================================================================
// Range
// =============================================================================

/// Accepts elements within an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Between<T> {
    low: T,
    high: T,
}

impl<T: Ord> Filter<T> for Between<T> {
    #[inline]
    fn accept(&self, element: &T) -> bool {
        &self.low <= element && element <= &self.high
    }
}

/// Accepts elements `e` with `low <= e <= high`.
pub const fn between<T: Ord>(low: T, high: T) -> Between<T> {
    Between { low, high }
}
