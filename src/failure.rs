//! Process-wide failure observation.
//!
//! Every error this crate raises, and every panic escaping a user-supplied
//! hook (a visitor's per-element action, a pooled job), is logged with its
//! backtrace and handed to each registered [`FailureHandler`] before it
//! propagates. Handlers never change propagation: the error is still returned
//! to the caller and the panic is still resumed.
//!
//! The registry lives for the whole process. Handlers stay registered until
//! [`remove_handler`] or [`clear_handlers`] is called; there is no teardown.
//!
//! # Examples
//!
//! ```rust
//! use guarded::failure::{self, Failure};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let id = failure::register_handler(move |failure: &Failure<'_>| {
//!     if failure.message().contains("doc-example") {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//!
//! let error = failure::raise(guarded::Error::invalid_argument("doc-example", "bad"));
//! assert!(error.is_invalid_argument());
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! assert!(failure::remove_handler(id));
//! ```

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::error::Error;

/// Observer notified of every failure raised through this module.
///
/// Implemented for every `Fn(&Failure<'_>) + Send + Sync` closure.
pub trait FailureHandler: Send + Sync {
    /// Called once per failure, on the thread that raised it.
    fn on_failure(&self, failure: &Failure<'_>);
}

impl<F> FailureHandler for F
where
    F: Fn(&Failure<'_>) + Send + Sync,
{
    fn on_failure(&self, failure: &Failure<'_>) {
        self(failure);
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy)]
pub enum FailureKind<'a> {
    /// An error returned by this crate.
    Error(&'a Error),
    /// A panic raised by a user-supplied hook, with its message.
    Panic(&'a str),
}

/// A failure as presented to handlers.
#[derive(Debug)]
pub struct Failure<'a> {
    kind: FailureKind<'a>,
    backtrace: &'a Backtrace,
}

impl Failure<'_> {
    /// Returns what went wrong.
    pub const fn kind(&self) -> FailureKind<'_> {
        self.kind
    }

    /// Returns the error, if the failure is an error rather than a panic.
    pub const fn error(&self) -> Option<&Error> {
        match self.kind {
            FailureKind::Error(error) => Some(error),
            FailureKind::Panic(_) => None,
        }
    }

    /// Returns a human readable message.
    pub fn message(&self) -> String {
        match self.kind {
            FailureKind::Error(error) => error.to_string(),
            FailureKind::Panic(message) => format!("panicked: {message}"),
        }
    }

    /// Returns the backtrace captured where the failure was raised.
    ///
    /// Capture follows `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`; when both are
    /// unset the backtrace is disabled.
    pub const fn backtrace(&self) -> &Backtrace {
        self.backtrace
    }
}

impl fmt::Display for Failure<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.message())
    }
}

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Registry = RwLock<Vec<(HandlerId, Arc<dyn FailureHandler>)>>;

static HANDLERS: LazyLock<Registry> = LazyLock::new(|| RwLock::new(Vec::new()));
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(0);

/// Registers a handler for the rest of the process lifetime.
pub fn register_handler<H>(handler: H) -> HandlerId
where
    H: FailureHandler + 'static,
{
    let id = HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed));
    HANDLERS.write().push((id, Arc::new(handler)));
    id
}

/// Removes a handler. Returns `false` if it was not registered.
pub fn remove_handler(id: HandlerId) -> bool {
    let mut handlers = HANDLERS.write();
    let before = handlers.len();
    handlers.retain(|(registered, _)| *registered != id);
    handlers.len() != before
}

/// Removes every registered handler.
pub fn clear_handlers() {
    HANDLERS.write().clear();
}

/// Returns the number of registered handlers.
pub fn handler_count() -> usize {
    HANDLERS.read().len()
}

/// Logs `error`, notifies every handler, and hands the error back for
/// propagation.
///
/// # Examples
///
/// ```rust
/// use guarded::{Error, failure};
///
/// fn checked(bound: usize) -> guarded::Result<usize> {
///     if bound == 0 {
///         return Err(failure::raise(Error::invalid_argument("checked", "bound is zero")));
///     }
///     Ok(bound)
/// }
///
/// assert!(checked(0).is_err());
/// ```
pub fn raise(error: Error) -> Error {
    let backtrace = Backtrace::capture();
    tracing::error!(error = %error, backtrace = %backtrace, "guarded failure");
    dispatch(&Failure {
        kind: FailureKind::Error(&error),
        backtrace: &backtrace,
    });
    error
}

/// Logs a panic payload caught from a user hook and notifies every handler.
///
/// Returns the extracted panic message. The caller is expected to resume the
/// unwind (or otherwise contain it) afterwards.
pub fn report_panic(origin: &'static str, payload: &(dyn Any + Send)) -> String {
    let message = panic_message(payload);
    let backtrace = Backtrace::capture();
    tracing::error!(origin, panic = %message, backtrace = %backtrace, "hook panicked");
    dispatch(&Failure {
        kind: FailureKind::Panic(&message),
        backtrace: &backtrace,
    });
    message
}

fn dispatch(failure: &Failure<'_>) {
    // Handlers run outside the registry lock so they may register or remove
    // handlers themselves.
    let handlers: Vec<Arc<dyn FailureHandler>> = HANDLERS
        .read()
        .iter()
        .map(|(_, handler)| Arc::clone(handler))
        .collect();
    for handler in handlers {
        handler.on_failure(failure);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload.downcast_ref::<&'static str>().map_or_else(
        || {
            payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "non-string panic payload".to_string())
        },
        |message| (*message).to_string(),
    )
}
