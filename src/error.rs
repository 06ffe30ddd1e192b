//! Error types shared by every module of the crate.
//!
//! The crate adds a small taxonomy on top of whatever the
//! wrapped containers report themselves:
//!
//! - [`Error::InvalidArgument`]: a caller passed an argument the operation
//!   cannot accept (a key outside a sub-view's range, inverted range bounds,
//!   an inconsistent pool configuration).
//! - [`Error::InvalidState`]: an object was used out of order (reading a
//!   visitor's result before it ran, re-running a single-use visitor).
//! - [`Error::Exhausted`], [`Error::Closed`], [`Error::Creation`]: object
//!   pool conditions.
//!
//! Missing keys, absent elements and similar outcomes are not errors here;
//! they surface exactly as the underlying container reports them (`None`,
//! `false`).
//!
//! Every error the crate raises passes through [`crate::failure::raise`]
//! first, so registered failure handlers observe it before the caller does.
//!
//! # Examples
//!
//! ```rust
//! use guarded::Error;
//!
//! let error = Error::invalid_state("Count", "result", "callback has not been iterated");
//! assert!(error.is_invalid_state());
//! assert_eq!(
//!     error.to_string(),
//!     "Count::result: callback has not been iterated"
//! );
//! ```

use std::fmt;

/// Errors raised by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument was rejected by the operation it was passed to.
    InvalidArgument {
        /// The operation that rejected the argument.
        context: &'static str,
        /// Why the argument was rejected.
        message: String,
    },

    /// An object was used in a state that does not permit the operation.
    InvalidState {
        /// The type whose state was violated.
        owner: &'static str,
        /// The method that was called.
        method: &'static str,
        /// Description of the violated state.
        message: &'static str,
    },

    /// A non-blocking borrow found every pooled object in use.
    Exhausted {
        /// The configured maximum of simultaneously borrowed objects.
        max_active: usize,
    },

    /// The pool has been closed.
    Closed,

    /// The pool's factory failed to create an object.
    Creation {
        /// The factory's description of the failure.
        message: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidArgument`].
    pub fn invalid_argument(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            context,
            message: message.into(),
        }
    }

    /// Creates an [`Error::InvalidState`].
    pub const fn invalid_state(
        owner: &'static str,
        method: &'static str,
        message: &'static str,
    ) -> Self {
        Self::InvalidState {
            owner,
            method,
            message,
        }
    }

    /// Creates an [`Error::Creation`].
    pub fn creation(message: impl Into<String>) -> Self {
        Self::Creation {
            message: message.into(),
        }
    }

    /// Returns `true` for [`Error::InvalidArgument`].
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` for [`Error::InvalidState`].
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { context, message } => {
                write!(formatter, "{context}: invalid argument: {message}")
            }
            Self::InvalidState {
                owner,
                method,
                message,
            } => write!(formatter, "{owner}::{method}: {message}"),
            Self::Exhausted { max_active } => write!(
                formatter,
                "pool exhausted: all {max_active} objects are in use"
            ),
            Self::Closed => write!(formatter, "pool is closed"),
            Self::Creation { message } => write!(formatter, "object creation failed: {message}"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
