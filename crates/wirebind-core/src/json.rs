//! # JSON Serialization Module
//!
//! High-performance JSON parsing using simd-json, plus serde_json for
//! serialization.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Only handles JSON serialization/deserialization
//! - **O**: Extensible via serde traits
//! - **D**: Depends on serde abstractions, not concrete parsers

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse a JSON string to a typed value using simd-json
///
/// # Errors
///
/// Returns `Error::BodyDecode` if parsing fails.
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> Result<T> {
    let mut bytes = json_str.as_bytes().to_vec();

    simd_json::from_slice(&mut bytes).map_err(|e| Error::BodyDecode {
        reason: format!("Parse error: {e}"),
    })
}

/// Parse JSON bytes to a typed value using simd-json
///
/// simd-json parses in place, so the input buffer must be mutable.
///
/// # Errors
///
/// Returns `Error::BodyDecode` if parsing fails.
pub fn parse_json_bytes<T: DeserializeOwned>(bytes: &mut [u8]) -> Result<T> {
    simd_json::from_slice(bytes).map_err(|e| Error::BodyDecode {
        reason: format!("Parse error: {e}"),
    })
}

/// Decode a transport body into a typed value
///
/// Copies the payload once so callers can keep the original bytes.
///
/// # Errors
///
/// Returns `Error::BodyDecode` if parsing fails.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut buffer = bytes.to_vec();
    parse_json_bytes(&mut buffer)
}

/// Serialize a value to a JSON string
///
/// Uses serde_json for serialization (simd-json is primarily for parsing).
///
/// # Errors
///
/// Returns `Error::Serialize` if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialize {
        reason: format!("Serialize error: {e}"),
    })
}

/// Serialize a value to a pretty-printed JSON string
///
/// # Errors
///
/// Returns `Error::Serialize` if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Serialize {
        reason: format!("Serialize error: {e}"),
    })
}
