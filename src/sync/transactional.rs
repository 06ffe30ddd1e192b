//! Guarded commit and rollback.

use std::thread::ThreadId;

use super::Synchronized;
use crate::collection::Transactional;

/// Transaction control over a guarded transactional container.
///
/// `commit`, `rollback` and the auto-commit accessors run under the guard.
/// `attach`, `detach` and `attached_session` concern the session binding
/// rather than the contents and bypass the guard, so a thread can attach
/// even while another thread holds it.
///
/// # Examples
///
/// ```rust
/// use guarded::prelude::*;
/// use std::collections::HashMap;
///
/// let cart = Synchronized::new(TransactionalMap::new(HashMap::new()));
/// cart.insert("apples", 3).unwrap();
/// assert!(cart.has_uncommitted_changes());
///
/// cart.rollback();
/// assert!(cart.is_empty());
///
/// cart.set_auto_commit(true);
/// cart.insert("pears", 2).unwrap();
/// cart.rollback();
/// assert_eq!(cart.get(&"pears"), Some(2));
/// ```
pub trait GuardedTransactional {
    /// Makes every change since the last commit permanent.
    fn commit(&self);

    /// Discards every change since the last commit.
    fn rollback(&self);

    /// Enables or disables committing after every write.
    fn set_auto_commit(&self, auto_commit: bool);

    /// Returns `true` if every write commits immediately.
    fn is_auto_commit(&self) -> bool;

    /// Returns `true` if there are changes that have not been committed.
    fn has_uncommitted_changes(&self) -> bool;

    /// Binds the container to the calling thread. Does not take the guard.
    fn attach(&self);

    /// Releases the session binding. Does not take the guard.
    fn detach(&self);

    /// Returns the attached thread, if any. Does not take the guard.
    fn attached_session(&self) -> Option<ThreadId>;
}

impl<T: Transactional> GuardedTransactional for Synchronized<T> {
    fn commit(&self) {
        self.with_write(Transactional::commit);
    }

    fn rollback(&self) {
        self.with_write(Transactional::rollback);
    }

    fn set_auto_commit(&self, auto_commit: bool) {
        self.with_write(|container| container.set_auto_commit(auto_commit));
    }

    fn is_auto_commit(&self) -> bool {
        self.with_read(Transactional::is_auto_commit)
    }

    fn has_uncommitted_changes(&self) -> bool {
        self.with_read(Transactional::has_uncommitted_changes)
    }

    fn attach(&self) {
        self.with_unguarded(Transactional::attach);
    }

    fn detach(&self) {
        self.with_unguarded(Transactional::detach);
    }

    fn attached_session(&self) -> Option<ThreadId> {
        self.with_unguarded(|container| container.attached_session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Container, TransactionalMap, TreeBidiMap};
    use crate::sync::{GuardedBidiMap, GuardedMap, GuardedView};
    use rstest::{fixture, rstest};
    use std::collections::BTreeMap;
    use std::thread;

    type Ledger = Synchronized<TransactionalMap<BTreeMap<u32, i64>>>;

    #[fixture]
    fn ledger() -> Ledger {
        Synchronized::new(TransactionalMap::new(BTreeMap::from([(1, 100)])))
    }

    #[rstest]
    fn rollback_discards_guarded_writes(ledger: Ledger) {
        ledger.insert(2, 50).unwrap();
        ledger.remove(&1);
        ledger.rollback();
        assert_eq!(ledger.to_entries(), vec![(1, 100)]);
    }

    #[rstest]
    fn commit_then_rollback_keeps_changes(ledger: Ledger) {
        ledger.insert(2, 50).unwrap();
        ledger.commit();
        assert!(!ledger.has_uncommitted_changes());
        ledger.rollback();
        assert_eq!(ledger.len(), 2);
    }

    #[rstest]
    fn auto_commit_is_guarded_state(ledger: Ledger) {
        assert!(!ledger.is_auto_commit());
        ledger.set_auto_commit(true);
        assert!(ledger.is_auto_commit());
    }

    #[rstest]
    fn attach_bypasses_the_guard(ledger: Ledger) {
        let _held = ledger.lock().acquire();
        let other = ledger.clone();
        let attached = thread::spawn(move || {
            other.attach();
            other.attached_session()
        })
        .join()
        .unwrap();
        assert!(attached.is_some());
        assert_ne!(attached, Some(thread::current().id()));
        ledger.detach();
        assert_eq!(ledger.attached_session(), None);
    }

    #[rstest]
    fn transactional_bidi_map_keeps_all_capabilities() {
        let map = Synchronized::new(TransactionalMap::new(TreeBidiMap::<&str, u8>::new()));
        map.insert("x", 1).unwrap();
        assert_eq!(map.get_key(&1), Some("x"));
        map.rollback();
        assert!(map.is_empty());
    }
}
