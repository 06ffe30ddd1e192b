//! # guarded
//!
//! Thread-safe collection decorators, filter combinators and visitor-style
//! iteration callbacks for Rust.
//!
//! ## Overview
//!
//! - **Synchronized decorators**: wrap any collection, set, sorted set, map,
//!   sorted map, bidirectional map or transactional map so that every
//!   operation runs under a shared, re-entrant guard. Sub-views (key sets,
//!   value collections, sorted ranges, value-ordered views) share the guard
//!   of the view they were derived from.
//! - **Filters**: composable predicates (`Not`, `And`, `Or`, comparison
//!   factories) consumed by filterable collections.
//! - **Iterative callbacks**: single-use visitors (count, detect, select,
//!   collect, min/max, bounded count, emptiness) driven by one
//!   fold-with-early-exit engine.
//! - **Pools**: a generic object pool and a thread pool built on it.
//!
//! ## Feature Flags
//!
//! - `filter`: Filter trait and combinators
//! - `collection`: Capability traits and the concrete containers behind them
//! - `sync`: Synchronized decorators
//! - `callback`: Iterative callbacks
//! - `pool`: Object pool and thread pool
//! - `serde`: Serialization for pool configuration and bidirectional maps
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use guarded::prelude::*;
//!
//! let numbers = Synchronized::new(vec![1, 2, 3, 4, 5]);
//! let large = numbers.filter(&comparison::greater_than(2));
//!
//! // Filtered collections share the guard of the collection they came from.
//! assert!(large.lock().same_as(numbers.lock()));
//!
//! let mut count = Count::new();
//! assert_eq!(count.iterate(&large).copied(), Ok(3));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use guarded::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};

    #[cfg(feature = "filter")]
    pub use crate::filter::*;

    #[cfg(feature = "collection")]
    pub use crate::collection::*;

    #[cfg(feature = "sync")]
    pub use crate::sync::*;

    #[cfg(feature = "callback")]
    pub use crate::callback::*;

    #[cfg(feature = "pool")]
    pub use crate::pool::*;
}

pub mod error;
pub mod failure;

#[cfg(feature = "filter")]
pub mod filter;

#[cfg(feature = "collection")]
pub mod collection;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "callback")]
pub mod callback;

#[cfg(feature = "pool")]
pub mod pool;

pub use error::{Error, Result};

/// The version of this crate, as recorded in its manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
