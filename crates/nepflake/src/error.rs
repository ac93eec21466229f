/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nepflake` can emit.
///
/// Every variant is an ordinary per-call failure. The generator never retries
/// on its own and never mutates its clock state when it returns an error, so
/// the caller is free to retry, fall back to another ID source, or fail the
/// surrounding request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A node or data center ID does not fit its bit width.
    ///
    /// Raised at construction. `max` is the largest accepted value.
    #[error("invalid {field}: {value} is outside 0..={max}")]
    InvalidIdentity {
        field: &'static str,
        value: i64,
        max: i64,
    },

    /// The time source reported a time earlier than the last issued ID.
    ///
    /// Typically caused by an NTP step or a VM migration. Issuing an ID now
    /// could duplicate one that was already handed out, so the call fails
    /// instead.
    #[error("clock moved backward: last issued at {last_timestamp}ms, now {now}ms")]
    ClockMovedBackward { last_timestamp: i64, now: i64 },

    /// The time source reported a time that cannot be encoded in the
    /// timestamp field: either before the epoch or past its last
    /// representable millisecond.
    #[error("timestamp {timestamp}ms is outside the representable range 0..={max}")]
    TimestampOutOfRange { timestamp: i64, max: i64 },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
