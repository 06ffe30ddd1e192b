#![cfg(feature = "callback")]
//! Property-based tests for the iterative callbacks.
//!
//! Every stock callback must agree with the equivalent standard-library
//! computation over the same elements:
//!
//! 1. **Count**: `len`
//! 2. **Detector**: `!is_empty`
//! 3. **Selector**: the elements themselves, in order
//! 4. **Collector**: `seed ++ map(f)`
//! 5. **Extremes**: `max` / `min` (first of equals)
//! 6. **HasLessThan**: `len < bound`, counting at most `bound`
//! 7. **fold_until**: a fold that stops where `try_fold` stops

use guarded::prelude::*;
use proptest::prelude::*;
use std::ops::ControlFlow as Flow;

proptest! {
    #[test]
    fn prop_count_is_len(elements in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assert_eq!(Count::new().iterate(&elements).copied(), Ok(elements.len()));
    }

    #[test]
    fn prop_detector_is_non_empty(elements in prop::collection::vec(any::<u8>(), 0..8)) {
        prop_assert_eq!(Detector::new().iterate(&elements).copied(), Ok(!elements.is_empty()));
    }

    #[test]
    fn prop_selector_copies_in_order(elements in prop::collection::vec(any::<i64>(), 0..64)) {
        let mut selector = Selector::new();
        prop_assert_eq!(selector.iterate(&elements), Ok(&elements));
    }

    #[test]
    fn prop_collector_appends_mapped(
        seed in prop::collection::vec(any::<i32>(), 0..8),
        elements in prop::collection::vec(any::<i32>(), 0..64),
    ) {
        let mut collector = Collector::with_accumulator(seed.clone(), |value: &i32| value.wrapping_mul(3));
        let mut expected = seed;
        expected.extend(elements.iter().map(|value| value.wrapping_mul(3)));
        prop_assert_eq!(collector.iterate(&elements), Ok(&expected));
    }

    #[test]
    fn prop_extremes_match_iterator(elements in prop::collection::vec(any::<i16>(), 0..64)) {
        prop_assert_eq!(
            MaximumRetriever::new().iterate(&elements).cloned(),
            Ok(elements.iter().copied().max())
        );
        prop_assert_eq!(
            MinimumRetriever::new().iterate(&elements).cloned(),
            Ok(elements.iter().copied().min())
        );
    }

    #[test]
    fn prop_has_less_than_matches_len(
        elements in prop::collection::vec(any::<u8>(), 0..32),
        bound in 0usize..40,
    ) {
        let checked = HasLessThan::new(bound).iterate(&elements).unwrap();
        prop_assert_eq!(checked.has_less(), Ok(bound > 0 && elements.len() < bound));
        prop_assert!(checked.count().unwrap() <= bound);
    }

    #[test]
    fn prop_has_less_than_spreads_its_bound(
        first in prop::collection::vec(any::<u8>(), 0..16),
        second in prop::collection::vec(any::<u8>(), 0..16),
        bound in 1usize..40,
    ) {
        let checked = HasLessThan::new(bound)
            .iterate(&first)
            .and_then(|used| used.iterate(&second))
            .unwrap();
        let counted_first = first.len().min(bound);
        prop_assert_eq!(checked.bound(), bound - counted_first);
    }

    #[test]
    fn prop_fold_until_matches_try_fold(
        elements in prop::collection::vec(0u32..100, 0..64),
        limit in 0u32..2000,
    ) {
        let folded = fold_until(&elements, 0u32, |sum, value| {
            let sum = sum + value;
            if sum > limit { Step::Stop(sum) } else { Step::Continue(sum) }
        });
        let expected = elements.iter().try_fold(0u32, |sum, value| {
            let sum = sum + value;
            if sum > limit { Flow::Break(sum) } else { Flow::Continue(sum) }
        });
        match expected {
            Flow::Continue(sum) => prop_assert_eq!(folded, Step::Continue(sum)),
            Flow::Break(sum) => prop_assert_eq!(folded, Step::Stop(sum)),
        }
    }
}
