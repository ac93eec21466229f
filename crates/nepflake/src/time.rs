use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Neptune epoch: Saturday, November 26, 2016 13:21:05.631 UTC
///
/// With a 41-bit timestamp field, IDs anchored here stay representable until
/// mid 2086.
pub const NEPTUNE_EPOCH: Duration = Duration::from_millis(1_480_166_465_631);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const UNIX_EPOCH_MILLIS: Duration = Duration::from_millis(0);

/// A source of millisecond timestamps relative to some epoch.
///
/// This abstraction lets the generator run against the real wall clock, a
/// regression-free monotonic clock, or a mocked time source in tests.
///
/// Values are signed: a source may legitimately report a time before its
/// epoch, which the generator rejects rather than encodes.
///
/// # Example
///
/// ```
/// use nepflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> i64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

/// Milliseconds since the UNIX epoch, negative if the system clock is set
/// before 1970.
fn unix_millis_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => saturating_millis(elapsed),
        Err(err) => -saturating_millis(err.duration()),
    }
}

fn saturating_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// The wall clock, offset to a configurable epoch.
///
/// Every read goes to [`SystemTime::now`], so adjustments to the system clock
/// (NTP steps, manual changes, VM migrations) are visible. A backward step
/// surfaces from the generator as [`Error::ClockMovedBackward`].
///
/// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch_millis: i64,
}

impl Default for SystemClock {
    /// Constructs a wall clock aligned to [`NEPTUNE_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(NEPTUNE_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock using `epoch` (a [`Duration`] since
    /// 1970-01-01 UTC) as t = 0.
    ///
    /// All generators that must interoperate have to agree on the epoch.
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: saturating_millis(epoch),
        }
    }

    /// The configured epoch in milliseconds since the UNIX epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> i64 {
        unix_millis_now().saturating_sub(self.epoch_millis)
    }
}

/// A monotonic time source that returns elapsed time since construction,
/// offset from a user-defined epoch.
///
/// The wall clock is sampled once, at construction, to anchor the timeline;
/// from then on time advances with [`Instant`], which never goes backward.
/// Generators driven by this clock therefore never observe a regression, at
/// the cost of drifting from the wall clock if it is later corrected.
///
/// Clones share the same anchor, so IDs issued through clones stay ordered.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    start: Instant,
    epoch_offset: i64, // in milliseconds
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`NEPTUNE_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(NEPTUNE_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using `epoch` (a [`Duration`] since
    /// 1970-01-01 UTC) as t = 0.
    ///
    /// If the system clock is earlier than `epoch` at construction, readings
    /// start negative and the generator reports
    /// [`Error::TimestampOutOfRange`] until the clock passes the epoch.
    ///
    /// [`Error::TimestampOutOfRange`]: crate::Error::TimestampOutOfRange
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            start: Instant::now(),
            epoch_offset: unix_millis_now().saturating_sub(saturating_millis(epoch)),
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the number of milliseconds since the configured epoch, based on
    /// the elapsed monotonic time since construction.
    fn current_millis(&self) -> i64 {
        self.epoch_offset
            .saturating_add(saturating_millis(self.start.elapsed()))
    }
}
