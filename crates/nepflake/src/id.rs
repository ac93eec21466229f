use core::{fmt, hash::Hash};

/// A layout-compatible Snowflake ID.
///
/// Implementors are thin wrappers around a packed, non-negative `i64` with four
/// bit fields, from most to least significant: timestamp, data center ID,
/// node ID and sequence. The most significant bit is never set.
///
/// Field widths are associated constants, so every generator that issues a
/// given ID type agrees on the layout at compile time. Use
/// [`define_snowflake_id!`] to declare a type with a different layout.
///
/// # Example
///
/// ```
/// use nepflake::{NeptuneId, SnowflakeId};
///
/// let id = NeptuneId::from_components(1000, 3, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.data_center_id(), 3);
/// assert_eq!(id.node_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
///
/// [`define_snowflake_id!`]: crate::define_snowflake_id
pub trait SnowflakeId:
    Sized + Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Width of the timestamp field.
    const TIMESTAMP_BITS: u32;
    /// Width of the data center ID field.
    const DATA_CENTER_ID_BITS: u32;
    /// Width of the node ID field.
    const NODE_ID_BITS: u32;
    /// Width of the sequence field.
    const SEQUENCE_BITS: u32;

    /// Largest representable timestamp (milliseconds since the epoch).
    const MAX_TIMESTAMP: i64 = (1 << Self::TIMESTAMP_BITS) - 1;
    /// Largest representable data center ID.
    const MAX_DATA_CENTER_ID: i64 = (1 << Self::DATA_CENTER_ID_BITS) - 1;
    /// Largest representable node ID.
    const MAX_NODE_ID: i64 = (1 << Self::NODE_ID_BITS) - 1;
    /// Largest representable sequence value.
    const MAX_SEQUENCE: i64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Bit offset of the node ID field.
    const NODE_ID_SHIFT: u32 = Self::SEQUENCE_BITS;
    /// Bit offset of the data center ID field.
    const DATA_CENTER_ID_SHIFT: u32 = Self::NODE_ID_SHIFT + Self::NODE_ID_BITS;
    /// Bit offset of the timestamp field.
    const TIMESTAMP_SHIFT: u32 = Self::DATA_CENTER_ID_SHIFT + Self::DATA_CENTER_ID_BITS;

    /// Wraps a raw packed value without validation.
    fn from_raw(raw: i64) -> Self;

    /// Returns the packed value.
    fn to_raw(&self) -> i64;

    /// Packs the four fields into an ID.
    ///
    /// Each component is masked to its width. In debug builds an out-of-range
    /// component panics instead of being silently truncated.
    fn from_components(timestamp: i64, data_center_id: i64, node_id: i64, sequence: i64) -> Self {
        debug_assert!(
            (0..=Self::MAX_TIMESTAMP).contains(&timestamp),
            "timestamp overflow"
        );
        debug_assert!(
            (0..=Self::MAX_DATA_CENTER_ID).contains(&data_center_id),
            "data_center_id overflow"
        );
        debug_assert!(
            (0..=Self::MAX_NODE_ID).contains(&node_id),
            "node_id overflow"
        );
        debug_assert!(
            (0..=Self::MAX_SEQUENCE).contains(&sequence),
            "sequence overflow"
        );
        Self::from_raw(
            ((timestamp & Self::MAX_TIMESTAMP) << Self::TIMESTAMP_SHIFT)
                | ((data_center_id & Self::MAX_DATA_CENTER_ID) << Self::DATA_CENTER_ID_SHIFT)
                | ((node_id & Self::MAX_NODE_ID) << Self::NODE_ID_SHIFT)
                | (sequence & Self::MAX_SEQUENCE),
        )
    }

    /// Extracts the timestamp (milliseconds since the epoch).
    fn timestamp(&self) -> i64 {
        (self.to_raw() >> Self::TIMESTAMP_SHIFT) & Self::MAX_TIMESTAMP
    }

    /// Extracts the data center ID.
    fn data_center_id(&self) -> i64 {
        (self.to_raw() >> Self::DATA_CENTER_ID_SHIFT) & Self::MAX_DATA_CENTER_ID
    }

    /// Extracts the node ID.
    fn node_id(&self) -> i64 {
        (self.to_raw() >> Self::NODE_ID_SHIFT) & Self::MAX_NODE_ID
    }

    /// Extracts the sequence number.
    fn sequence(&self) -> i64 {
        self.to_raw() & Self::MAX_SEQUENCE
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in the same order as the IDs sort numerically.
    fn to_padded_string(&self) -> String {
        format!("{:019}", self.to_raw())
    }

    /// Describes every field of the layout with its current value.
    fn fields(&self) -> [FieldLayout; 5] {
        [
            FieldLayout {
                name: "reserved",
                bits: 1,
                value: 0,
            },
            FieldLayout {
                name: "timestamp",
                bits: Self::TIMESTAMP_BITS,
                value: self.timestamp(),
            },
            FieldLayout {
                name: "data_center_id",
                bits: Self::DATA_CENTER_ID_BITS,
                value: self.data_center_id(),
            },
            FieldLayout {
                name: "node_id",
                bits: Self::NODE_ID_BITS,
                value: self.node_id(),
            },
            FieldLayout {
                name: "sequence",
                bits: Self::SEQUENCE_BITS,
                value: self.sequence(),
            },
        ]
    }
}

// Gated here rather than with `cfg_attr` in the expansion: a `cfg` inside
// `define_snowflake_id!` would be evaluated against the caller's features.
#[cfg(feature = "serde")]
#[doc(hidden)]
#[macro_export]
macro_rules! __snowflake_serde {
    ($name:ident) => {
        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, s: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                $crate::__private::serialize_raw(self, s)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                $crate::__private::deserialize_raw(d)
            }
        }
    };
}

#[cfg(not(feature = "serde"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __snowflake_serde {
    ($name:ident) => {};
}

/// Defines a packed Snowflake ID type with a custom bit layout.
///
/// The four widths must add up to 63 so the sign bit stays clear; any other
/// total fails to compile.
///
/// ```
/// nepflake::define_snowflake_id!(
///     /// 39-bit timestamp, 3-bit data center, 11-bit node, 10-bit sequence.
///     WideNodeId, 39, 3, 11, 10
/// );
///
/// use nepflake::SnowflakeId;
/// assert_eq!(WideNodeId::MAX_NODE_ID, 2047);
/// ```
#[macro_export]
macro_rules! define_snowflake_id {
    (
        $(#[$meta:meta])*
        $name:ident, $timestamp_bits:expr, $data_center_id_bits:expr, $node_id_bits:expr, $sequence_bits:expr
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            id: i64,
        }

        $crate::__snowflake_serde!($name);

        const _: () = assert!(
            $timestamp_bits + $data_center_id_bits + $node_id_bits + $sequence_bits == 63,
            "snowflake layout must use exactly 63 bits"
        );

        impl $crate::SnowflakeId for $name {
            const TIMESTAMP_BITS: u32 = $timestamp_bits;
            const DATA_CENTER_ID_BITS: u32 = $data_center_id_bits;
            const NODE_ID_BITS: u32 = $node_id_bits;
            const SEQUENCE_BITS: u32 = $sequence_bits;

            fn from_raw(raw: i64) -> Self {
                Self { id: raw }
            }

            fn to_raw(&self) -> i64 {
                self.id
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.id
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.id)
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                $crate::write_bit_layout_debug(f, self, stringify!($name))
            }
        }
    };
}

define_snowflake_id!(
    /// The default 64-bit Snowflake ID.
    ///
    /// - 1 bit reserved
    /// - 41 bits timestamp (ms since [`NEPTUNE_EPOCH`] by default)
    /// - 5 bits data center ID
    /// - 5 bits node ID
    /// - 12 bits sequence
    ///
    /// ```text
    ///  Bit Index:  63           63 62            22 21               17 16          12 11             0
    ///              +--------------+----------------+-------------------+-------------+---------------+
    ///  Field:      | reserved (1) | timestamp (41) | data center ID (5)| node ID (5) | sequence (12) |
    ///              +--------------+----------------+-------------------+-------------+---------------+
    ///              |<------------------- MSB ------------ 64 bits ----------- LSB ------------------>|
    /// ```
    ///
    /// [`NEPTUNE_EPOCH`]: crate::NEPTUNE_EPOCH
    NeptuneId, 41, 5, 5, 12
);

/// A single field of a Snowflake layout, used for debug rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub bits: u32,
    pub value: i64,
}

/// Renders an ID as one line per field, with the bit range each field
/// occupies (most significant first).
///
/// This backs the `Debug` impl of every type declared with
/// [`define_snowflake_id!`](crate::define_snowflake_id).
///
/// ```text
/// NeptuneId {
///     raw            0x000000000a822003 (176300035)
///     reserved       63..=63  = 0
///     timestamp      62..=22  = 42
///     data_center_id 21..=17  = 1
///     node_id        16..=12  = 2
///     sequence       11..=0   = 3
/// }
/// ```
pub fn write_bit_layout_debug<ID: SnowflakeId>(
    f: &mut fmt::Formatter<'_>,
    id: &ID,
    type_name: &str,
) -> fmt::Result {
    writeln!(f, "{type_name} {{")?;
    writeln!(f, "    {:<14} 0x{:016x} ({})", "raw", id.to_raw(), id.to_raw())?;

    let mut high = 63;
    for field in id.fields() {
        let low = high + 1 - field.bits;
        let range = format!("{high}..={low}");
        writeln!(f, "    {:<14} {range:<8} = {}", field.name, field.value)?;
        high = low.saturating_sub(1);
    }

    write!(f, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    define_snowflake_id!(
        /// Small timestamp budget, large sequence.
        BurstId, 35, 4, 6, 18
    );

    #[test]
    fn neptune_id_layout_constants() {
        assert_eq!(NeptuneId::MAX_TIMESTAMP, (1 << 41) - 1);
        assert_eq!(NeptuneId::MAX_DATA_CENTER_ID, 31);
        assert_eq!(NeptuneId::MAX_NODE_ID, 31);
        assert_eq!(NeptuneId::MAX_SEQUENCE, 4095);
        assert_eq!(NeptuneId::NODE_ID_SHIFT, 12);
        assert_eq!(NeptuneId::DATA_CENTER_ID_SHIFT, 17);
        assert_eq!(NeptuneId::TIMESTAMP_SHIFT, 22);
    }

    #[test]
    fn neptune_id_fields_and_bounds() {
        let ts = NeptuneId::MAX_TIMESTAMP;
        let dc = NeptuneId::MAX_DATA_CENTER_ID;
        let node = NeptuneId::MAX_NODE_ID;
        let seq = NeptuneId::MAX_SEQUENCE;

        let id = NeptuneId::from_components(ts, dc, node, seq);
        println!("ID: {id:?}");
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.data_center_id(), dc);
        assert_eq!(id.node_id(), node);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), i64::MAX);
    }

    #[test]
    fn fields_round_trip_without_overlap() {
        let samples = [
            (0, 0, 0, 0),
            (1, 0, 0, 0),
            (0, 1, 0, 0),
            (0, 0, 1, 0),
            (0, 0, 0, 1),
            (123_456_789, 17, 9, 4000),
            (NeptuneId::MAX_TIMESTAMP, 0, NeptuneId::MAX_NODE_ID, 0),
            (0, NeptuneId::MAX_DATA_CENTER_ID, 0, NeptuneId::MAX_SEQUENCE),
        ];

        for (ts, dc, node, seq) in samples {
            let id = NeptuneId::from_components(ts, dc, node, seq);
            assert_eq!(
                (id.timestamp(), id.data_center_id(), id.node_id(), id.sequence()),
                (ts, dc, node, seq)
            );
            assert!(id.to_raw() >= 0);
            assert_eq!(NeptuneId::from_raw(id.to_raw()), id);
        }
    }

    #[test]
    fn packs_in_documented_positions() {
        let id = NeptuneId::from_components(5, 3, 2, 1);
        assert_eq!(id.to_raw(), (5 << 22) | (3 << 17) | (2 << 12) | 1);
        assert_eq!(i64::from(id), id.to_raw());
    }

    #[test]
    fn timestamp_dominates_ordering() {
        let earlier = NeptuneId::from_components(10, 31, 31, 4095);
        let later = NeptuneId::from_components(11, 0, 0, 0);
        assert!(earlier < later);
    }

    #[test]
    fn padded_string_sorts_like_numbers() {
        let small = NeptuneId::from_components(1, 0, 0, 0);
        let large = NeptuneId::from_components(1 << 30, 0, 0, 0);
        assert_eq!(small.to_padded_string().len(), 19);
        assert_eq!(large.to_padded_string().len(), 19);
        assert!(small.to_padded_string() < large.to_padded_string());
        assert_eq!(small.to_string(), (1_i64 << 22).to_string());
    }

    #[test]
    fn debug_lists_bit_ranges() {
        let id = NeptuneId::from_components(42, 1, 2, 3);
        let rendered = format!("{id:?}");
        assert!(rendered.starts_with("NeptuneId {"));
        assert!(rendered.ends_with('}'));

        let rows: Vec<Vec<&str>> = rendered
            .lines()
            .skip(2)
            .filter(|line| line.contains('='))
            .map(|line| line.split_whitespace().collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["reserved", "63..=63", "=", "0"],
                vec!["timestamp", "62..=22", "=", "42"],
                vec!["data_center_id", "21..=17", "=", "1"],
                vec!["node_id", "16..=12", "=", "2"],
                vec!["sequence", "11..=0", "=", "3"],
            ]
        );
    }

    #[test]
    fn debug_ranges_follow_custom_widths() {
        let rendered = format!("{:?}", BurstId::from_components(0, 0, 0, 0));
        assert!(rendered.starts_with("BurstId {"));
        assert!(rendered.contains("62..=28"));
        assert!(rendered.contains("17..=0"));
    }

    #[test]
    fn custom_layout_round_trip() {
        assert_eq!(BurstId::MAX_SEQUENCE, (1 << 18) - 1);
        assert_eq!(BurstId::TIMESTAMP_SHIFT, 28);

        let id = BurstId::from_components(
            BurstId::MAX_TIMESTAMP,
            7,
            BurstId::MAX_NODE_ID,
            200_000,
        );
        assert_eq!(id.timestamp(), BurstId::MAX_TIMESTAMP);
        assert_eq!(id.data_center_id(), 7);
        assert_eq!(id.node_id(), 63);
        assert_eq!(id.sequence(), 200_000);
        assert_eq!(
            id.to_raw(),
            (BurstId::MAX_TIMESTAMP << 28) | (7 << 24) | (63 << 18) | 200_000
        );
    }

    #[test]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        NeptuneId::from_components(NeptuneId::MAX_TIMESTAMP + 1, 0, 0, 0);
    }

    #[test]
    #[should_panic(expected = "data_center_id overflow")]
    fn data_center_id_overflow_panics() {
        NeptuneId::from_components(0, NeptuneId::MAX_DATA_CENTER_ID + 1, 0, 0);
    }

    #[test]
    #[should_panic(expected = "node_id overflow")]
    fn node_id_overflow_panics() {
        NeptuneId::from_components(0, 0, -1, 0);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        NeptuneId::from_components(0, 0, 0, NeptuneId::MAX_SEQUENCE + 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_integer() {
        let id = NeptuneId::from_components(42, 1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());
        let back: NeptuneId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_sign_bit() {
        let err = serde_json::from_str::<NeptuneId>("-5").unwrap_err();
        assert!(err.to_string().contains("sign bit"));
    }
}
