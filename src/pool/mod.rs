//! Object pooling and a thread pool built on it.
//!
//! [`ObjectPool`] lends out objects made by a [`PooledObjectFactory`], bounded
//! by a [`PoolConfig`]. [`ThreadPool`] uses the same pool to manage worker
//! threads.
//!
//! Pool lifecycle events (creation, destruction, eviction) are logged at
//! `debug` level through `tracing`.

mod config;
mod object_pool;
mod thread_pool;

pub use config::{ENV_PREFIX, PoolConfig};
pub use object_pool::{ObjectPool, Pooled, PooledObjectFactory};
pub use thread_pool::{ThreadPool, Worker, WorkerFactory};
