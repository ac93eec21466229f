//! Coordination-free 64-bit Snowflake IDs.
//!
//! Every ID packs a millisecond timestamp, a data center ID, a node ID and a
//! per-millisecond sequence into a non-negative `i64`:
//!
//! ```text
//! [ unused: 1 ][ timestamp: 41 ][ data center: 5 ][ node: 5 ][ sequence: 12 ]
//! ```
//!
//! Because the timestamp occupies the high bits, IDs sort (roughly)
//! chronologically. A [`SnowflakeGenerator`] issues up to 4096 IDs per
//! millisecond per identity, fails with [`Error::ClockMovedBackward`] rather
//! than risk a duplicate when the wall clock steps back, and is safe to share
//! between threads.
//!
//! ```
//! use nepflake::{NeptuneGenerator, SnowflakeId};
//!
//! let generator = NeptuneGenerator::with_system_clock(3, 1)?;
//! let id = generator.generate()?;
//!
//! assert_eq!(id.node_id(), 3);
//! assert_eq!(id.data_center_id(), 1);
//! # Ok::<(), nepflake::Error>(())
//! ```
//!
//! ## Features
//!
//! - `parking-lot`: use `parking_lot::Mutex` (no lock poisoning).
//! - `cache-padded`: pad the shared state to a cache line.
//! - `tracing`: emit `tracing` spans and events from the generator.
//! - `serde`: serialize IDs as plain integers.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
#[cfg(feature = "serde")]
mod private;
mod time;

#[doc(hidden)]
pub mod __private {
    #[cfg(feature = "serde")]
    pub use crate::private::*;
}

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
