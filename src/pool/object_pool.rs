//! A bounded pool of reusable objects.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};

use super::PoolConfig;
use crate::error::{Error, Result};
use crate::failure;

// =============================================================================
// Factory
// =============================================================================

/// Lifecycle hooks for pooled objects.
///
/// Only [`create`](Self::create) is required. Any `Fn() -> Result<T>` closure
/// is a factory with default hooks.
pub trait PooledObjectFactory<T>: Send + Sync {
    /// Makes a new object.
    ///
    /// # Errors
    ///
    /// Whatever prevents creation, typically [`Error::Creation`].
    fn create(&self) -> Result<T>;

    /// Returns `false` if `object` must not be lent out again.
    fn validate(&self, _object: &T) -> bool {
        true
    }

    /// Prepares an idle object for a borrower.
    ///
    /// # Errors
    ///
    /// A failing idle object is destroyed and the borrow moves on to another.
    fn activate(&self, _object: &mut T) -> Result<()> {
        Ok(())
    }

    /// Resets an object that was given back.
    ///
    /// # Errors
    ///
    /// A failing object is destroyed instead of kept idle.
    fn passivate(&self, _object: &mut T) -> Result<()> {
        Ok(())
    }

    /// Releases an object the pool no longer keeps.
    fn destroy(&self, object: T) {
        drop(object);
    }
}

impl<T, F> PooledObjectFactory<T> for F
where
    F: Fn() -> Result<T> + Send + Sync,
{
    fn create(&self) -> Result<T> {
        self()
    }
}

// =============================================================================
// Pool
// =============================================================================

struct PoolState<T> {
    idle: VecDeque<T>,
    // Borrowed objects plus creation slots reserved but not filled yet.
    active: usize,
    // Idle objects taken out for validation by the evictor.
    evicting: usize,
    closed: bool,
}

struct Shared<T, F> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<T>>,
    returned: Condvar,
    evictor_stop: Mutex<Option<Sender<()>>>,
}

enum Acquired<T> {
    Idle(T),
    Reserved,
}

/// A thread-safe pool lending out objects made by a
/// [`PooledObjectFactory`].
///
/// At most `max_active` objects are out at any time; [`borrow`](Self::borrow)
/// blocks when the limit is reached and [`try_borrow`](Self::try_borrow)
/// fails with [`Error::Exhausted`]. Objects come back when their [`Pooled`]
/// guard drops. Cloning the pool clones a handle to the same pool.
///
/// # Examples
///
/// ```rust
/// use guarded::pool::{ObjectPool, PoolConfig};
///
/// let pool = ObjectPool::new(
///     || -> guarded::Result<Vec<u8>> { Ok(Vec::with_capacity(1024)) },
///     PoolConfig::default().with_max_active(2),
/// )
/// .unwrap();
///
/// {
///     let mut buffer = pool.borrow().unwrap();
///     buffer.extend_from_slice(b"hello");
///     assert_eq!(pool.num_active(), 1);
/// }
/// assert_eq!(pool.num_active(), 0);
/// assert_eq!(pool.num_idle(), 1);
///
/// let _first = pool.borrow().unwrap();
/// let _second = pool.borrow().unwrap();
/// assert!(pool.try_borrow().is_err());
/// ```
pub struct ObjectPool<T, F> {
    shared: Arc<Shared<T, F>>,
}

impl<T, F> Clone for ObjectPool<T, F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, F> ObjectPool<T, F>
where
    T: Send + 'static,
    F: PooledObjectFactory<T> + 'static,
{
    /// Creates an empty pool. Starts the background evictor if the
    /// configuration sets an eviction interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `config` fails validation, or
    /// [`Error::Creation`] if the evictor thread cannot be spawned.
    pub fn new(factory: F, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let interval = config.eviction_interval;
        let pool = Self {
            shared: Arc::new(Shared {
                factory,
                config,
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    active: 0,
                    evicting: 0,
                    closed: false,
                }),
                returned: Condvar::new(),
                evictor_stop: Mutex::new(None),
            }),
        };
        if let Some(interval) = interval {
            pool.spawn_evictor(interval)?;
        }
        Ok(pool)
    }

    /// Borrows an object, waiting for one to be given back if `max_active`
    /// are already out.
    ///
    /// Idle objects are reused first; an idle object that fails activation
    /// (or validation, with `test_on_borrow`) is destroyed and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the pool is or becomes closed, or the
    /// factory's error if a new object cannot be made ready.
    pub fn borrow(&self) -> Result<Pooled<T, F>> {
        self.acquire(true).map(|object| Pooled::new(self.clone(), object))
    }

    /// Borrows an object without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if `max_active` objects are out, plus the
    /// errors of [`borrow`](Self::borrow). Waits briefly if the only free
    /// slot belongs to an object the evictor is validating.
    pub fn try_borrow(&self) -> Result<Pooled<T, F>> {
        self.acquire(false).map(|object| Pooled::new(self.clone(), object))
    }

    /// Returns a borrowed object to the pool. Same as dropping the guard.
    pub fn give_back(&self, pooled: Pooled<T, F>) {
        drop(pooled);
    }

    /// Destroys a borrowed object instead of returning it.
    pub fn invalidate(&self, pooled: Pooled<T, F>) {
        pooled.invalidate();
    }

    /// Validates the idle objects one at a time, destroys those that fail,
    /// then refills the idle set up to `min_idle`.
    ///
    /// The object under examination is neither idle nor active: borrowers
    /// take the remaining idle objects meanwhile, and its slot never makes
    /// [`try_borrow`](Self::try_borrow) fail with [`Error::Exhausted`].
    ///
    /// Returns how many objects were destroyed.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if refilling fails. The destroyed objects
    /// stay destroyed.
    pub fn evict(&self) -> Result<usize> {
        let examined = self.shared.state.lock().idle.len();
        let mut evicted = 0;
        for _ in 0..examined {
            let Some(candidate) = self.take_candidate() else {
                break;
            };
            let healthy = self.shared.factory.validate(&candidate);
            let rejected = {
                let mut state = self.shared.state.lock();
                state.evicting -= 1;
                if healthy && !state.closed && state.idle.len() < self.shared.config.max_idle {
                    state.idle.push_back(candidate);
                    None
                } else {
                    Some(candidate)
                }
            };
            self.shared.returned.notify_all();
            if let Some(object) = rejected {
                if !healthy {
                    evicted += 1;
                }
                self.shared.factory.destroy(object);
            }
        }
        tracing::debug!(examined, evicted, "evicted idle objects");

        self.prefill()?;
        Ok(evicted)
    }

    fn take_candidate(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        let candidate = state.idle.pop_front()?;
        state.evicting += 1;
        Some(candidate)
    }

    /// Creates idle objects until there are `min_idle` of them, without
    /// exceeding `max_active` objects in total.
    ///
    /// Returns how many objects were created.
    ///
    /// # Errors
    ///
    /// Returns the factory's error; objects created before it stay idle.
    pub fn prefill(&self) -> Result<usize> {
        let mut created = 0;
        loop {
            {
                let mut state = self.shared.state.lock();
                if state.closed
                    || state.idle.len() >= self.shared.config.min_idle
                    || state.idle.len() + state.active + state.evicting
                        >= self.shared.config.max_active
                {
                    break;
                }
                state.active += 1;
            }
            let object = match self.shared.factory.create() {
                Ok(object) => object,
                Err(error) => {
                    self.release_slot();
                    return Err(error);
                }
            };
            created += 1;
            let rejected = {
                let mut state = self.shared.state.lock();
                state.active -= 1;
                if state.closed {
                    Some(object)
                } else {
                    state.idle.push_back(object);
                    None
                }
            };
            self.shared.returned.notify_one();
            if let Some(object) = rejected {
                self.shared.factory.destroy(object);
            }
        }
        if created > 0 {
            tracing::debug!(created, "prefilled idle objects");
        }
        Ok(created)
    }

    /// Closes the pool: idle objects are destroyed, waiting borrowers fail
    /// with [`Error::Closed`], and objects given back later are destroyed.
    pub fn close(&self) {
        let idle = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            mem::take(&mut state.idle)
        };
        self.shared.evictor_stop.lock().take();
        self.shared.returned.notify_all();
        let destroyed = idle.len();
        for object in idle {
            self.shared.factory.destroy(object);
        }
        tracing::debug!(destroyed, "pool closed");
    }

    fn acquire(&self, blocking: bool) -> Result<T> {
        loop {
            let acquired = {
                let mut state = self.shared.state.lock();
                loop {
                    if state.closed {
                        return Err(failure::raise(Error::Closed));
                    }
                    if let Some(object) = state.idle.pop_front() {
                        state.active += 1;
                        break Acquired::Idle(object);
                    }
                    if state.active + state.evicting < self.shared.config.max_active {
                        state.active += 1;
                        break Acquired::Reserved;
                    }
                    // Objects under validation come back without a borrower.
                    if !blocking && state.active >= self.shared.config.max_active {
                        return Err(failure::raise(Error::Exhausted {
                            max_active: self.shared.config.max_active,
                        }));
                    }
                    self.shared.returned.wait(&mut state);
                }
            };

            match acquired {
                Acquired::Idle(mut object) => {
                    if self.ready(&mut object) {
                        return Ok(object);
                    }
                    tracing::debug!("idle object rejected on borrow");
                    self.discard(object);
                }
                Acquired::Reserved => return self.create_ready(),
            }
        }
    }

    fn create_ready(&self) -> Result<T> {
        let mut object = match self.shared.factory.create() {
            Ok(object) => object,
            Err(error) => {
                self.release_slot();
                return Err(error);
            }
        };
        tracing::debug!("created pooled object");
        if self.ready(&mut object) {
            Ok(object)
        } else {
            self.discard(object);
            Err(failure::raise(Error::creation(
                "new object failed activation or validation",
            )))
        }
    }

    fn ready(&self, object: &mut T) -> bool {
        match self.shared.factory.activate(object) {
            Ok(()) => !self.shared.config.test_on_borrow || self.shared.factory.validate(object),
            Err(error) => {
                tracing::debug!(%error, "activation failed");
                false
            }
        }
    }

    fn spawn_evictor(&self, interval: Duration) -> Result<()> {
        let (stop, stopped) = channel::bounded::<()>(0);
        let pool = Arc::downgrade(&self.shared);
        thread::Builder::new()
            .name("guarded-evictor".to_owned())
            .spawn(move || run_evictor(&pool, &stopped, interval))
            .map_err(|error| failure::raise(Error::creation(error.to_string())))?;
        *self.shared.evictor_stop.lock() = Some(stop);
        Ok(())
    }
}

fn run_evictor<T, F>(pool: &Weak<Shared<T, F>>, stopped: &Receiver<()>, interval: Duration)
where
    T: Send + 'static,
    F: PooledObjectFactory<T> + 'static,
{
    while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
        let Some(shared) = pool.upgrade() else {
            break;
        };
        let pool = ObjectPool { shared };
        if pool.is_closed() {
            break;
        }
        if let Err(error) = pool.evict() {
            tracing::debug!(%error, "evictor could not refill the pool");
        }
    }
}

impl<T, F: PooledObjectFactory<T>> ObjectPool<T, F> {
    fn restore(&self, mut object: T) {
        let keep = match self.shared.factory.passivate(&mut object) {
            Ok(()) => !self.shared.config.test_on_return || self.shared.factory.validate(&object),
            Err(error) => {
                tracing::debug!(%error, "passivation failed");
                false
            }
        };
        let rejected = {
            let mut state = self.shared.state.lock();
            state.active -= 1;
            if keep && !state.closed && state.idle.len() < self.shared.config.max_idle {
                state.idle.push_back(object);
                None
            } else {
                Some(object)
            }
        };
        self.shared.returned.notify_one();
        if let Some(object) = rejected {
            self.shared.factory.destroy(object);
            tracing::debug!("destroyed returned object");
        }
    }

    fn discard(&self, object: T) {
        self.release_slot();
        self.shared.factory.destroy(object);
        tracing::debug!("destroyed pooled object");
    }

    fn release_slot(&self) {
        self.shared.state.lock().active -= 1;
        self.shared.returned.notify_one();
    }
}

impl<T, F> ObjectPool<T, F> {
    /// Returns the number of idle objects.
    pub fn num_idle(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Returns the number of borrowed objects.
    pub fn num_active(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Returns the configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }
}

impl<T, F> fmt::Debug for ObjectPool<T, F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        formatter
            .debug_struct("ObjectPool")
            .field("idle", &state.idle.len())
            .field("active", &state.active)
            .field("evicting", &state.evicting)
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Guard
// =============================================================================

/// A borrowed object; goes back to its pool when dropped.
pub struct Pooled<T, F>
where
    F: PooledObjectFactory<T>,
{
    pool: ObjectPool<T, F>,
    object: Option<T>,
}

impl<T, F> Pooled<T, F>
where
    F: PooledObjectFactory<T>,
{
    const fn new(pool: ObjectPool<T, F>, object: T) -> Self {
        Self {
            pool,
            object: Some(object),
        }
    }

    /// Returns the object to the pool. Same as dropping the guard.
    pub fn give_back(self) {
        drop(self);
    }

    /// Destroys the object instead of returning it.
    pub fn invalidate(mut self) {
        if let Some(object) = self.object.take() {
            self.pool.discard(object);
        }
    }

    /// Takes the object out of the pool's accounting for good.
    pub fn detach(mut self) -> T {
        let object = self.take();
        self.pool.release_slot();
        object
    }

    /// Returns the pool this object came from.
    pub const fn pool(&self) -> &ObjectPool<T, F> {
        &self.pool
    }

    fn take(&mut self) -> T {
        match self.object.take() {
            Some(object) => object,
            None => unreachable!("a pooled object is present until the guard is consumed"),
        }
    }
}

impl<T, F> Deref for Pooled<T, F>
where
    F: PooledObjectFactory<T>,
{
    type Target = T;

    fn deref(&self) -> &T {
        match &self.object {
            Some(object) => object,
            None => unreachable!("a pooled object is present until the guard is consumed"),
        }
    }
}

impl<T, F> DerefMut for Pooled<T, F>
where
    F: PooledObjectFactory<T>,
{
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.object {
            Some(object) => object,
            None => unreachable!("a pooled object is present until the guard is consumed"),
        }
    }
}

impl<T, F> Drop for Pooled<T, F>
where
    F: PooledObjectFactory<T>,
{
    fn drop(&mut self) {
        if let Some(object) = self.object.take() {
            self.pool.restore(object);
        }
    }
}

impl<T, F> fmt::Debug for Pooled<T, F>
where
    T: fmt::Debug,
    F: PooledObjectFactory<T>,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Pooled").field(&**self).finish()
    }
}
