//! The re-entrant guard shared by a family of views.

use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Proof that the current thread holds a [`Lock`]. Released on drop.
pub type LockGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// A shareable, re-entrant mutual-exclusion guard.
///
/// Cloning a `Lock` yields another handle to the *same* guard. Every view
/// derived from a [`Synchronized`](super::Synchronized) root holds such a
/// clone, so locking any of them excludes operations on all of them.
///
/// The same thread may acquire the guard any number of times; it is released
/// when the last [`LockGuard`] is dropped. This lets a caller hold the guard
/// across several calls on a view:
///
/// ```rust
/// use guarded::prelude::*;
///
/// let stack = Synchronized::new(vec![1, 2, 3]);
/// {
///     let _held = stack.lock().acquire();
///     // Nothing else can touch `stack` between these two calls.
///     let size = stack.len();
///     stack.insert(size as i32 + 1).unwrap();
/// }
/// assert_eq!(stack.to_vec(), vec![1, 2, 3, 4]);
/// ```
///
/// "Read" and "write" acquisitions go through the same exclusive primitive;
/// [`read`](Self::read) and [`write`](Self::write) only document intent.
#[derive(Clone, Default)]
pub struct Lock {
    inner: Arc<ReentrantMutex<()>>,
}

impl Lock {
    /// Creates a new, independent guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the current thread holds the guard.
    pub fn acquire(&self) -> LockGuard<'_> {
        self.inner.lock()
    }

    /// Acquires the guard for an operation that only observes state.
    #[inline]
    pub fn read(&self) -> LockGuard<'_> {
        self.acquire()
    }

    /// Acquires the guard for an operation that modifies state.
    #[inline]
    pub fn write(&self) -> LockGuard<'_> {
        self.acquire()
    }

    /// Acquires the guard if no other thread holds it.
    pub fn try_acquire(&self) -> Option<LockGuard<'_>> {
        self.inner.try_lock()
    }

    /// Returns `true` if some thread holds the guard.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Returns `true` if the calling thread holds the guard.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.is_owned_by_current_thread()
    }

    /// Returns `true` if both handles denote the same guard.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the number of handles to this guard.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Lock")
            .field("locked", &self.is_locked())
            .field("holders", &self.holders())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    #[rstest]
    fn clones_share_the_guard() {
        let lock = Lock::new();
        let clone = lock.clone();
        assert!(lock.same_as(&clone));
        assert_eq!(lock.holders(), 2);
        assert!(!lock.same_as(&Lock::new()));
    }

    #[rstest]
    fn guard_is_reentrant() {
        let lock = Lock::new();
        let outer = lock.write();
        let inner = lock.read();
        assert!(lock.is_held_by_current_thread());
        drop(inner);
        assert!(lock.is_locked());
        drop(outer);
        assert!(!lock.is_locked());
    }

    #[rstest]
    fn other_threads_are_excluded() {
        let lock = Lock::new();
        let _held = lock.acquire();
        let clone = lock.clone();
        let acquired = thread::spawn(move || clone.try_acquire().is_some())
            .join()
            .unwrap();
        assert!(!acquired);
    }

    #[rstest]
    fn independent_locks_do_not_exclude_each_other() {
        let lock = Lock::new();
        let _held = lock.acquire();
        let other = Lock::new();
        let acquired = thread::spawn(move || other.try_acquire().is_some())
            .join()
            .unwrap();
        assert!(acquired);
    }
}
