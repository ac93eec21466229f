//! Support items for `define_snowflake_id!` expansions. Not public API.

pub use serde;
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

use crate::SnowflakeId;

/// Serializes an ID as its packed integer.
pub fn serialize_raw<ID, S>(id: &ID, s: S) -> Result<S::Ok, S::Error>
where
    ID: SnowflakeId,
    S: Serializer,
{
    s.serialize_i64(id.to_raw())
}

/// Deserializes an ID from its packed integer, rejecting values with the sign
/// bit set.
pub fn deserialize_raw<'de, ID, D>(d: D) -> Result<ID, D::Error>
where
    ID: SnowflakeId,
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(d)?;
    if raw < 0 {
        return Err(D::Error::custom(format_args!(
            "{raw} is not a valid ID: the sign bit is always clear"
        )));
    }
    Ok(ID::from_raw(raw))
}
