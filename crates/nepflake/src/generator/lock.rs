use core::{cmp::Ordering, fmt, marker::PhantomData};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, NeptuneId, Result, SnowflakeId, SystemClock, TimeSource,
    generator::{IdGenStatus, Mutex, MutexGuard},
};

/// Mutable clock bookkeeping, only ever touched while the lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClockState {
    /// Timestamp of the most recently issued ID, `-1` before the first one.
    pub(crate) last_timestamp: i64,
    /// Sequence of the most recently issued ID.
    pub(crate) sequence: i64,
}

impl ClockState {
    const INITIAL: Self = Self {
        last_timestamp: -1,
        sequence: 0,
    };

    /// Sequence for an ID issued at `now`, or `None` if the sequence space of
    /// this millisecond is used up.
    fn next_sequence(&self, now: i64, max_sequence: i64) -> Result<Option<i64>> {
        match now.cmp(&self.last_timestamp) {
            Ordering::Greater => Ok(Some(0)),
            Ordering::Equal if self.sequence < max_sequence => Ok(Some(self.sequence + 1)),
            Ordering::Equal => Ok(None),
            Ordering::Less => Err(cold_clock_behind(self.last_timestamp, now)),
        }
    }
}

#[cold]
#[inline(never)]
fn cold_clock_behind(last_timestamp: i64, now: i64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        last_timestamp,
        now,
        behind_ms = last_timestamp - now,
        "clock moved backward, refusing to issue ID"
    );
    Error::ClockMovedBackward {
        last_timestamp,
        now,
    }
}

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// Each generator owns one `(node_id, data_center_id)` identity and the clock
/// state for it. The state lives behind an [`Arc<Mutex<_>>`]: every call to
/// [`generate`](Self::generate) is a single critical section, and clones of a
/// generator are handles to the *same* state, so they can be handed to as many
/// threads as needed without ever issuing the same ID twice.
///
/// Generators with different identities share nothing. Keeping identities
/// unique across a fleet is up to whoever provisions them.
///
/// ## Recommended When
/// - Several threads issue IDs on behalf of one node identity
/// - You want blocking, always-succeeds-or-errors semantics
///
/// ## See Also
/// - [`SnowflakeGenerator::poll_id`] for a non-blocking variant
pub struct SnowflakeGenerator<ID = NeptuneId, T = SystemClock>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<ClockState>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<ClockState>>,
    time: T,
    node_id: i64,
    data_center_id: i64,
    _id: PhantomData<fn() -> ID>,
}

/// A [`SnowflakeGenerator`] issuing [`NeptuneId`]s from the wall clock.
pub type NeptuneGenerator = SnowflakeGenerator<NeptuneId, SystemClock>;

impl<ID> SnowflakeGenerator<ID, SystemClock>
where
    ID: SnowflakeId,
{
    /// Creates a generator driven by the wall clock anchored at
    /// [`NEPTUNE_EPOCH`](crate::NEPTUNE_EPOCH).
    ///
    /// # Errors
    /// - [`Error::InvalidIdentity`] if either ID does not fit its bit width.
    ///
    /// # Example
    /// ```
    /// use nepflake::NeptuneGenerator;
    ///
    /// let generator = NeptuneGenerator::with_system_clock(1, 1)?;
    /// let a = generator.generate()?;
    /// let b = generator.generate()?;
    /// assert!(a < b);
    /// # Ok::<(), nepflake::Error>(())
    /// ```
    pub fn with_system_clock(node_id: i64, data_center_id: i64) -> Result<Self> {
        Self::new(node_id, data_center_id, SystemClock::default())
    }
}

impl<ID, T> SnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    /// Creates a new [`SnowflakeGenerator`] for the given identity.
    ///
    /// The generator starts with no issuance history, so the first call to
    /// [`generate`](Self::generate) accepts any representable timestamp.
    ///
    /// # Parameters
    ///
    /// - `node_id`: identifies the issuing machine, `0..=ID::MAX_NODE_ID`.
    /// - `data_center_id`: identifies the issuing site,
    ///   `0..=ID::MAX_DATA_CENTER_ID`.
    /// - `time`: A [`TimeSource`] implementation (e.g., [`SystemClock`]) that
    ///   determines how timestamps are generated.
    ///
    /// # Errors
    /// - [`Error::InvalidIdentity`] if either ID does not fit its bit width.
    ///
    /// # Example
    /// ```
    /// use nepflake::{NeptuneId, SnowflakeGenerator, SnowflakeId, SystemClock, TWITTER_EPOCH};
    ///
    /// let generator = SnowflakeGenerator::<NeptuneId, _>::new(
    ///     3,
    ///     7,
    ///     SystemClock::with_epoch(TWITTER_EPOCH),
    /// )?;
    ///
    /// let id = generator.generate()?;
    /// assert_eq!(id.node_id(), 3);
    /// assert_eq!(id.data_center_id(), 7);
    /// # Ok::<(), nepflake::Error>(())
    /// ```
    pub fn new(node_id: i64, data_center_id: i64, time: T) -> Result<Self> {
        Self::with_state(node_id, data_center_id, ClockState::INITIAL, time)
    }

    /// Creates a generator from explicit component values.
    ///
    /// This constructor is primarily useful for advanced use cases such as
    /// restoring the last issued `(timestamp, sequence)` after a restart, so
    /// that the new process cannot reissue IDs from the same millisecond.
    ///
    /// `timestamp` and `sequence` must fit their bit widths; this is checked
    /// in debug builds only.
    ///
    /// # Errors
    /// - [`Error::InvalidIdentity`] if either ID does not fit its bit width.
    pub fn from_components(
        timestamp: i64,
        node_id: i64,
        data_center_id: i64,
        sequence: i64,
        time: T,
    ) -> Result<Self> {
        debug_assert!(
            (0..=ID::MAX_TIMESTAMP).contains(&timestamp),
            "timestamp overflow"
        );
        debug_assert!(
            (0..=ID::MAX_SEQUENCE).contains(&sequence),
            "sequence overflow"
        );
        Self::with_state(
            node_id,
            data_center_id,
            ClockState {
                last_timestamp: timestamp,
                sequence,
            },
            time,
        )
    }

    fn with_state(node_id: i64, data_center_id: i64, state: ClockState, time: T) -> Result<Self> {
        check_identity("node_id", node_id, ID::MAX_NODE_ID)?;
        check_identity("data_center_id", data_center_id, ID::MAX_DATA_CENTER_ID)?;

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(state))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(state)),
            time,
            node_id,
            data_center_id,
            _id: PhantomData,
        })
    }

    /// The node ID encoded into every ID from this generator.
    pub fn node_id(&self) -> i64 {
        self.node_id
    }

    /// The data center ID encoded into every ID from this generator.
    pub fn data_center_id(&self) -> i64 {
        self.data_center_id
    }

    /// Generates the next ID, spinning if the current millisecond is used up.
    ///
    /// This is [`generate_with`](Self::generate_with) using
    /// [`core::hint::spin_loop`] between clock polls.
    ///
    /// # Errors
    /// - [`Error::ClockMovedBackward`] if the clock is behind the last issued
    ///   ID.
    /// - [`Error::TimestampOutOfRange`] if the clock is before the epoch or
    ///   past the last representable millisecond.
    /// - [`Error::LockPoisoned`] if another caller panicked while holding the
    ///   lock (std mutex only).
    pub fn generate(&self) -> Result<ID> {
        self.generate_with(|_| core::hint::spin_loop())
    }

    /// Generates the next ID, calling `f` while waiting for the clock.
    ///
    /// When more than `ID::MAX_SEQUENCE + 1` IDs are requested within one
    /// millisecond, the call keeps the lock and polls the clock until it
    /// passes the last issued millisecond, invoking `f` with that millisecond
    /// between polls (e.g. to yield the thread). Other callers queue behind
    /// the lock meanwhile. The wait normally lasts under a millisecond but
    /// never ends if the clock is frozen.
    ///
    /// No state is modified when an error is returned.
    ///
    /// # Errors
    /// Same as [`generate`](Self::generate).
    ///
    /// # Example
    /// ```
    /// use nepflake::{NeptuneGenerator, SnowflakeId};
    ///
    /// let generator = NeptuneGenerator::with_system_clock(0, 0)?;
    /// let id = generator.generate_with(|_| std::thread::yield_now())?;
    /// assert_eq!(id.node_id(), 0);
    /// # Ok::<(), nepflake::Error>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, f)))]
    pub fn generate_with(&self, mut f: impl FnMut(i64)) -> Result<ID> {
        let mut state = self.lock()?;
        // Read the clock under the lock; a reading taken while queued behind
        // another caller would look like a regression.
        let mut now = self.now()?;

        let sequence = match state.next_sequence(now, ID::MAX_SEQUENCE)? {
            Some(sequence) => sequence,
            None => {
                now = self.cold_wait_past(state.last_timestamp, &mut f)?;
                0
            }
        };

        Ok(self.issue(&mut state, now, sequence))
    }

    /// Attempts to generate the next ID without waiting.
    ///
    /// Returns [`IdGenStatus::Ready`] with a new ID, or
    /// [`IdGenStatus::Pending`] if the sequence for the current millisecond is
    /// exhausted. A pending result leaves the generator untouched; retry once
    /// the clock has advanced.
    ///
    /// # Errors
    /// Same as [`generate`](Self::generate).
    ///
    /// # Example
    /// ```
    /// use nepflake::{IdGenStatus, NeptuneGenerator, NeptuneId};
    ///
    /// let generator = NeptuneGenerator::with_system_clock(0, 0)?;
    ///
    /// let id: NeptuneId = loop {
    ///     match generator.poll_id()? {
    ///         IdGenStatus::Ready { id } => break id,
    ///         IdGenStatus::Pending { yield_for } => {
    ///             std::thread::sleep(std::time::Duration::from_millis(yield_for as u64));
    ///         }
    ///     }
    /// };
    /// # Ok::<(), nepflake::Error>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<IdGenStatus<ID>> {
        let mut state = self.lock()?;
        let now = self.now()?;

        match state.next_sequence(now, ID::MAX_SEQUENCE)? {
            Some(sequence) => Ok(IdGenStatus::Ready {
                id: self.issue(&mut state, now, sequence),
            }),
            None => Ok(IdGenStatus::Pending { yield_for: 1 }),
        }
    }

    /// Snapshot of `(last_timestamp, sequence)`.
    #[cfg(test)]
    pub(crate) fn clock_state(&self) -> Result<(i64, i64)> {
        let state = self.lock()?;
        Ok((state.last_timestamp, state.sequence))
    }

    fn issue(&self, state: &mut ClockState, now: i64, sequence: i64) -> ID {
        state.last_timestamp = now;
        state.sequence = sequence;
        ID::from_components(now, self.data_center_id, self.node_id, sequence)
    }

    fn now(&self) -> Result<i64> {
        check_timestamp(self.time.current_millis(), ID::MAX_TIMESTAMP)
    }

    #[cold]
    #[inline(never)]
    fn cold_wait_past(&self, last_timestamp: i64, f: &mut impl FnMut(i64)) -> Result<i64> {
        #[cfg(feature = "tracing")]
        tracing::trace!(last_timestamp, "sequence exhausted, waiting for next millisecond");

        loop {
            let now = self.time.current_millis();
            if now > last_timestamp {
                return check_timestamp(now, ID::MAX_TIMESTAMP);
            }
            f(last_timestamp);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClockState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

fn check_identity(field: &'static str, value: i64, max: i64) -> Result<()> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidIdentity { field, value, max })
    }
}

fn check_timestamp(timestamp: i64, max: i64) -> Result<i64> {
    if (0..=max).contains(&timestamp) {
        Ok(timestamp)
    } else {
        Err(Error::TimestampOutOfRange { timestamp, max })
    }
}

impl<ID, T> Clone for SnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource + Clone,
{
    /// Returns another handle to the same generator state.
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            time: self.time.clone(),
            node_id: self.node_id,
            data_center_id: self.data_center_id,
            _id: PhantomData,
        }
    }
}

impl<ID, T> fmt::Debug for SnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("node_id", &self.node_id)
            .field("data_center_id", &self.data_center_id)
            .finish_non_exhaustive()
    }
}
