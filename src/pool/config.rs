//! Pool sizing and validation policy.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::failure;

/// Prefix of the environment variables read by [`PoolConfig::from_env`].
pub const ENV_PREFIX: &str = "GUARDED_POOL_";

/// Sizing and validation policy of an [`ObjectPool`](super::ObjectPool).
///
/// # Examples
///
/// ```rust
/// use guarded::pool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::default()
///     .with_max_active(4)
///     .with_max_idle(4)
///     .with_min_idle(2)
///     .with_eviction_interval(Duration::from_secs(30))
///     .with_test_on_borrow(true);
/// assert!(config.validate().is_ok());
///
/// let inverted = PoolConfig::default().with_min_idle(5).with_max_idle(1);
/// assert!(inverted.validate().unwrap_err().is_invalid_argument());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Idle objects the pool keeps ready (see `prefill` and `evict`).
    pub min_idle: usize,
    /// Idle objects kept on return; surplus returns are destroyed.
    pub max_idle: usize,
    /// Objects that may be borrowed at the same time.
    pub max_active: usize,
    /// Period of the background evictor, if any.
    pub eviction_interval: Option<Duration>,
    /// Validate idle objects before lending them out.
    pub test_on_borrow: bool,
    /// Validate objects when they are given back.
    pub test_on_return: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_idle: 0,
            max_idle: 8,
            max_active: 8,
            eviction_interval: None,
            test_on_borrow: false,
            test_on_return: false,
        }
    }
}

impl PoolConfig {
    /// Sets `min_idle`.
    #[must_use]
    pub const fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Sets `max_idle`.
    #[must_use]
    pub const fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Sets `max_active`.
    #[must_use]
    pub const fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Enables the background evictor with the given period.
    #[must_use]
    pub const fn with_eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval = Some(interval);
        self
    }

    /// Sets `test_on_borrow`.
    #[must_use]
    pub const fn with_test_on_borrow(mut self, test_on_borrow: bool) -> Self {
        self.test_on_borrow = test_on_borrow;
        self
    }

    /// Sets `test_on_return`.
    #[must_use]
    pub const fn with_test_on_return(mut self, test_on_return: bool) -> Self {
        self.test_on_return = test_on_return;
        self
    }

    /// Checks that the limits are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `max_active` is zero, if
    /// `min_idle` exceeds `max_idle` or `max_active`, or if the eviction
    /// interval is zero.
    pub fn validate(&self) -> Result<()> {
        let problem = if self.max_active == 0 {
            Some("max_active must be at least 1".to_owned())
        } else if self.min_idle > self.max_idle {
            Some(format!(
                "min_idle ({}) exceeds max_idle ({})",
                self.min_idle, self.max_idle
            ))
        } else if self.min_idle > self.max_active {
            Some(format!(
                "min_idle ({}) exceeds max_active ({})",
                self.min_idle, self.max_active
            ))
        } else if self.eviction_interval == Some(Duration::ZERO) {
            Some("eviction_interval must be positive".to_owned())
        } else {
            None
        };
        problem.map_or(Ok(()), |message| {
            Err(failure::raise(Error::invalid_argument(
                "PoolConfig::validate",
                message,
            )))
        })
    }

    /// Reads the configuration from `GUARDED_POOL_*` environment variables,
    /// falling back to the defaults for unset ones.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GUARDED_POOL_MIN_IDLE` | `min_idle` |
    /// | `GUARDED_POOL_MAX_IDLE` | `max_idle` |
    /// | `GUARDED_POOL_MAX_ACTIVE` | `max_active` |
    /// | `GUARDED_POOL_EVICTION_INTERVAL_MS` | `eviction_interval` |
    /// | `GUARDED_POOL_TEST_ON_BORROW` | `test_on_borrow` |
    /// | `GUARDED_POOL_TEST_ON_RETURN` | `test_on_return` |
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a variable does not parse or the
    /// result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            min_idle: parse_var(&lookup, "MIN_IDLE")?.unwrap_or(defaults.min_idle),
            max_idle: parse_var(&lookup, "MAX_IDLE")?.unwrap_or(defaults.max_idle),
            max_active: parse_var(&lookup, "MAX_ACTIVE")?.unwrap_or(defaults.max_active),
            eviction_interval: parse_var(&lookup, "EVICTION_INTERVAL_MS")?
                .map(Duration::from_millis)
                .or(defaults.eviction_interval),
            test_on_borrow: parse_var(&lookup, "TEST_ON_BORROW")?
                .unwrap_or(defaults.test_on_borrow),
            test_on_return: parse_var(&lookup, "TEST_ON_RETURN")?
                .unwrap_or(defaults.test_on_return),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<L, T>(lookup: &L, suffix: &str) -> Result<Option<T>>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let name = format!("{ENV_PREFIX}{suffix}");
    lookup(&name)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                failure::raise(Error::invalid_argument(
                    "PoolConfig::from_env",
                    format!("{name}: cannot parse {raw:?}"),
                ))
            })
        })
        .transpose()
}
