use crate::SnowflakeId;

/// The outcome of a single non-blocking generation attempt.
///
/// Returned by [`SnowflakeGenerator::poll_id`]:
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is exhausted and no ID can be issued until the clock advances.
///
/// This allows callers to back off however they like (sleep, yield, reschedule
/// a task) instead of spinning inside the generator.
///
/// # Example
///
/// ```
/// use nepflake::{IdGenStatus, NeptuneId, SnowflakeGenerator, SnowflakeId, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1
///     }
/// }
///
/// let generator =
///     SnowflakeGenerator::<NeptuneId, _>::from_components(1, 0, 0, NeptuneId::MAX_SEQUENCE, FixedTime)?;
/// match generator.poll_id()? {
///     IdGenStatus::Ready { id } => println!("ID: {}", id.timestamp()),
///     IdGenStatus::Pending { yield_for } => println!("Back off for {yield_for}ms"),
/// }
/// # Ok::<(), nepflake::Error>(())
/// ```
///
/// [`SnowflakeGenerator::poll_id`]: crate::SnowflakeGenerator::poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus<ID: SnowflakeId> {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: ID,
    },
    /// No ID could be generated because the sequence has been exhausted for the
    /// current millisecond.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: i64,
    },
}
