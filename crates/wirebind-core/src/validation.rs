//! # Validation Error Aggregate
//!
//! Structured client-facing validation failures.
//!
//! ## Design Principles (SOLID)
//!
//! - **S**: Only handles validation failure representation
//! - **O**: Extensible failure codes - plain strings, not a closed enum
//! - **L**: Aggregates merge associatively regardless of origin layer
//!
//! The aggregate maps a *path key* to an ordered list of failure codes.
//! Path keys follow a fixed convention: `section.fieldName` for field-level
//! failures, the bare section name for section-level failures (including
//! raw-byte body checks), and the literal `request` for request-level and
//! rule failures. A `BTreeMap` keeps wire output deterministic.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Path key used for request-level and rule failures
pub const REQUEST_KEY: &str = "request";

/// Well-known failure codes emitted by the built-in constraint checks
pub mod codes {
    /// Field is required but empty or at its zero value
    pub const REQUIRED: &str = "required";
    /// Value (or length) is below the declared minimum
    pub const MIN: &str = "min";
    /// Value (or length) is above the declared maximum
    pub const MAX: &str = "max";
    /// Length differs from the declared exact length
    pub const LEN: &str = "len";
    /// Value does not match the declared format
    pub const FORMAT: &str = "format";
    /// String field does not hold its declared discriminator literal
    pub const DISCRIMINATOR: &str = "discriminator";
}

/// Aggregate of client-caused validation failures for one request
///
/// Built incrementally by the validation pipeline, request-local, and only
/// ever returned as a terminal client-facing result. A server error
/// discovered at any layer discards the aggregate entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    details: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty aggregate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one failure code under a path key
    pub fn push(&mut self, key: impl Into<String>, code: impl Into<String>) {
        self.details.entry(key.into()).or_default().push(code.into());
    }

    /// Append several failure messages under one path key
    pub fn extend(&mut self, key: impl Into<String>, messages: impl IntoIterator<Item = String>) {
        let entry = self.details.entry(key.into()).or_default();
        entry.extend(messages);
    }

    /// Merge another aggregate into this one, preserving per-key order
    pub fn merge(&mut self, other: ValidationErrors) {
        for (key, codes) in other.details {
            self.details.entry(key).or_default().extend(codes);
        }
    }

    /// Failure codes recorded under a path key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.details.get(key).map(Vec::as_slice)
    }

    /// Check whether any failure has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Number of path keys carrying failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.details.len()
    }

    /// All path keys and their failure codes, in key order
    #[must_use]
    pub fn details(&self) -> &BTreeMap<String, Vec<String>> {
        &self.details
    }

    /// Convert to the wire-facing JSON error shape
    ///
    /// Produces `{ "error": string, "details": { pathKey: [code, ...] } }`.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"validation failed","details":{}}"#.to_string())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationErrors", 2)?;
        state.serialize_field("error", "validation failed")?;
        state.serialize_field("details", &self.details)?;
        state.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, codes) in &self.details {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", key, codes.join(", "))?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a custom self-validation hook
///
/// Custom validators report failures through a discriminated type rather
/// than an opaque error value, so the client/server split stays a
/// compile-time invariant: `Invalid` merges into the aggregate, `Failed`
/// aborts the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Client-caused failure messages, merged under the caller's path key
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),

    /// Infrastructure failure inside the validator itself
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl CheckError {
    /// Convenience constructor for a single client-facing message
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(vec![message.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.push("query.limit", codes::MIN);
        errors.push("query.limit", codes::MAX);
        errors.push("request", "conflicting filters");

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("query.limit"),
            Some(&["min".to_string(), "max".to_string()][..])
        );
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut a = ValidationErrors::new();
        a.push("body", "required");

        let mut b = ValidationErrors::new();
        b.push("body", "min");
        b.push("query.q", "format");

        a.merge(b);
        assert_eq!(a.get("body"), Some(&["required".to_string(), "min".to_string()][..]));
        assert_eq!(a.get("query.q"), Some(&["format".to_string()][..]));
    }

    #[test]
    fn test_json_shape() {
        let mut errors = ValidationErrors::new();
        errors.push("query.limit", codes::MIN);

        let json = errors.to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"], "validation failed");
        assert_eq!(value["details"]["query.limit"][0], "min");
    }

    #[test]
    fn test_json_is_deterministic() {
        let mut errors = ValidationErrors::new();
        errors.push("query.b", "min");
        errors.push("query.a", "max");

        // BTreeMap ordering: "query.a" serializes before "query.b"
        let json = errors.to_json();
        assert!(json.find("query.a").unwrap() < json.find("query.b").unwrap());
    }

    #[test]
    fn test_display_joins_keys() {
        let mut errors = ValidationErrors::new();
        errors.push("body", "required");
        errors.push("query.q", "min");
        let text = errors.to_string();
        assert!(text.contains("body: required"));
        assert!(text.contains("query.q: min"));
    }

    #[test]
    fn test_check_error_invalid_display() {
        let err = CheckError::Invalid(vec!["too many tags".to_string(), "bad range".to_string()]);
        assert_eq!(err.to_string(), "too many tags; bad range");
    }
}
