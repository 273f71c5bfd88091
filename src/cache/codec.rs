//! Encode/decode boundary between typed values and stored payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Serializes a value into the JSON text stored by either tier.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes a stored payload back into the caller's type.
pub fn decode<T: DeserializeOwned>(payload: &str) -> Result<T> {
    Ok(serde_json::from_str(payload)?)
}
