#![cfg(feature = "sync")]
//! Integration tests for the synchronized decorators.
//!
//! Covers guard sharing between roots and their views, compound operations
//! under an explicitly held guard, and behavior under contention.

use guarded::prelude::*;
use rstest::{fixture, rstest};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs `operation` on another thread and reports whether it finished within
/// `patience`.
fn finishes_within<F>(patience: Duration, operation: F) -> bool
where
    F: FnOnce() + Send + 'static,
{
    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        operation();
        let _ = done.send(());
    });
    finished.recv_timeout(patience).is_ok()
}

const PATIENCE: Duration = Duration::from_millis(100);

#[fixture]
fn inventory() -> Synchronized<BTreeMap<String, u32>> {
    Synchronized::new(BTreeMap::from([
        ("apple".to_owned(), 3),
        ("cherry".to_owned(), 12),
        ("kiwi".to_owned(), 0),
        ("pear".to_owned(), 7),
    ]))
}

// =============================================================================
// Guard sharing
// =============================================================================

#[rstest]
fn view_operations_wait_for_root_guard(inventory: Synchronized<BTreeMap<String, u32>>) {
    let keys = inventory.keys();
    let held = inventory.lock().acquire();

    assert!(!finishes_within(PATIENCE, move || {
        let _ = keys.len();
    }));
    drop(held);
}

#[rstest]
fn root_operations_wait_for_sub_map_guard(inventory: Synchronized<BTreeMap<String, u32>>) {
    let fruit = inventory.tail_map("c".to_owned(), true).unwrap();
    let held = fruit.lock().acquire();

    let root = inventory.clone();
    assert!(!finishes_within(PATIENCE, move || {
        let _ = root.get(&"apple".to_owned());
    }));
    drop(held);
}

#[rstest]
fn unrelated_roots_do_not_exclude_each_other(inventory: Synchronized<BTreeMap<String, u32>>) {
    let other = Synchronized::new(vec![1, 2, 3]);
    let _held = inventory.lock().acquire();

    assert!(finishes_within(PATIENCE, move || {
        other.insert(4).unwrap();
    }));
}

#[rstest]
fn an_explicit_lock_joins_two_roots() {
    let lock = Lock::new();
    let names = Synchronized::with_lock(HashSet::from(["ada"]), lock.clone());
    let ages = Synchronized::with_lock(vec![36], lock);
    let held = names.lock().acquire();

    assert!(!finishes_within(PATIENCE, move || {
        let _ = ages.len();
    }));
    drop(held);
}

#[rstest]
fn filtered_results_join_the_source_guard() {
    let readings = Synchronized::new(vec![3, 18, 7, 21]);
    let high = readings.filter(&comparison::greater_than(10));
    assert_eq!(high.to_vec(), vec![18, 21]);
    assert!(high.lock().same_as(readings.lock()));
    assert!(!high.shares_container_with(&readings));
}

// =============================================================================
// Compound operations
// =============================================================================

#[rstest]
fn held_guard_makes_check_then_act_atomic() {
    let seats = Synchronized::new(BTreeSet::from([1, 2, 3]));
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let seats = seats.clone();
            thread::spawn(move || {
                let _held = seats.lock().acquire();
                // The guard is re-entrant, so these calls nest inside it.
                seats.first().filter(|seat| seats.remove(seat))
            })
        })
        .collect();

    let mut taken: Vec<_> = workers
        .into_iter()
        .filter_map(|worker| worker.join().unwrap())
        .collect();
    taken.sort_unstable();
    assert_eq!(taken, vec![1, 2, 3]);
    assert!(seats.is_empty());
}

#[rstest]
fn concurrent_inserts_are_all_kept() {
    let log = Synchronized::new(Vec::new());
    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let log = log.clone();
            thread::spawn(move || {
                for entry in 0..250 {
                    log.insert(writer * 1000 + entry).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    assert_eq!(log.len(), 1000);
}

#[rstest]
fn snapshot_iteration_tolerates_concurrent_writers() {
    let numbers = Synchronized::new((0..100).collect::<Vec<_>>());
    let writer = {
        let numbers = numbers.clone();
        thread::spawn(move || {
            for value in 100..200 {
                numbers.insert(value).unwrap();
            }
        })
    };
    let seen: Vec<i32> = numbers.iter().collect();
    writer.join().unwrap();
    assert!(seen.len() >= 100);
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}

// =============================================================================
// Views
// =============================================================================

#[rstest]
fn views_see_writes_through_any_other_view(inventory: Synchronized<BTreeMap<String, u32>>) {
    let stocked = inventory.values();
    let late = inventory.tail_map("m".to_owned(), false).unwrap();

    late.insert("plum".to_owned(), 4).unwrap();
    assert!(stocked.contains(&4));
    assert_eq!(inventory.len(), 5);

    inventory.keys().remove(&"pear".to_owned());
    assert_eq!(late.keys().to_vec(), vec!["plum".to_owned()]);
}

#[rstest]
fn out_of_range_write_is_rejected_without_effect(inventory: Synchronized<BTreeMap<String, u32>>) {
    let early = inventory.head_map("c".to_owned(), false).unwrap();
    let error = early.insert("zucchini".to_owned(), 1).unwrap_err();
    assert!(error.is_invalid_argument());
    assert_eq!(inventory.len(), 4);
}

#[rstest]
fn descending_views_reverse_navigation(inventory: Synchronized<BTreeMap<String, u32>>) {
    let reversed = inventory.descending_map();
    assert_eq!(reversed.first_key(), Some("pear".to_owned()));
    assert_eq!(
        reversed.higher_key(&"kiwi".to_owned()),
        Some("cherry".to_owned())
    );
    assert_eq!(reversed.pop_first(), Some(("pear".to_owned(), 7)));
    assert_eq!(inventory.last_key(), Some("kiwi".to_owned()));
}

#[rstest]
fn sorted_bidi_map_views_by_value() {
    let podium = Synchronized::new(TreeBidiMap::new());
    podium.insert("gold", 1).unwrap();
    podium.insert("silver", 2).unwrap();
    podium.insert("bronze", 3).unwrap();

    let medals = podium.head_map_by_value(2, true).unwrap();
    assert_eq!(medals.to_entries(), vec![("gold", 1), ("silver", 2)]);
    assert_eq!(medals.get_key(&2), Some("silver"));
    assert!(medals.insert("wooden", 4).is_err());
    assert!(medals.lock().same_as(podium.lock()));
}

#[rstest]
fn transactional_map_rolls_back_view_writes() {
    let settings = Synchronized::new(TransactionalMap::new(BTreeMap::from([
        ("depth", 3),
        ("width", 80),
    ])));
    settings.keys().remove(&"depth");
    settings.insert("height", 24).unwrap();
    assert!(settings.has_uncommitted_changes());

    settings.rollback();
    assert_eq!(settings.to_entries(), vec![("depth", 3), ("width", 80)]);
}

#[rstest]
fn callbacks_run_against_views(inventory: Synchronized<BTreeMap<String, u32>>) {
    let mut in_stock = Count::new();
    let stocked = inventory.values().filter(&comparison::greater_than(0));
    assert_eq!(in_stock.iterate(&stocked), Ok(&3));

    let mut largest = MaximumRetriever::new();
    assert_eq!(largest.iterate(&inventory.values()), Ok(&Some(12)));
}
