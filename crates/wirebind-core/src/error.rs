//! # Error Handling
//!
//! Centralized error types for the wirebind core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! The taxonomy has exactly two kinds. [`Error`] covers server-classified
//! failures: structural misuse of a shape, wire data that cannot be mapped
//! onto the declared field types, registry misuse, and infrastructure
//! failures inside custom validators or the rules engine. Client-caused
//! failures never appear here; they are aggregated into
//! [`ValidationErrors`](crate::validation::ValidationErrors) and surfaced
//! through [`Rejection::Invalid`].

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type alias for wirebind core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Server-classified error types for the binding and validation engine
///
/// Every variant here indicates that the request could not even be mapped
/// onto the requested shape, or that the engine itself failed. None of
/// these are folded into the client-facing aggregate.
#[derive(Error, Debug)]
pub enum Error {
    /// A declared section does not have a usable layout for its role
    #[error("Section '{section}' is not bindable: {reason}")]
    SectionShape {
        /// Lowercase section role name (e.g. "query")
        section: &'static str,
        /// Reason the section layout was rejected
        reason: String,
    },

    /// A field's declared type has no registered coercion and no built-in
    #[error("Field '{section}.{field}' has unsupported type '{type_name}'")]
    UnsupportedField {
        /// Lowercase section role name
        section: &'static str,
        /// Declared field name
        field: String,
        /// Name of the unsupported type
        type_name: String,
    },

    /// Wire data could not be converted to the field's declared type
    #[error("Cannot coerce '{section}.{field}': {reason}")]
    Coerce {
        /// Lowercase section role name
        section: &'static str,
        /// Declared field name
        field: String,
        /// Underlying conversion failure
        reason: String,
    },

    /// Transport body could not be decoded as structured data
    #[error("Body decode failed: {reason}")]
    BodyDecode {
        /// Underlying decode failure
        reason: String,
    },

    /// Serialization of a value failed
    #[error("Serialize error: {reason}")]
    Serialize {
        /// Underlying serialization failure
        reason: String,
    },

    /// A coercion was registered twice for the same output type
    #[error("Coercion for type '{type_name}' is already registered")]
    DuplicateCoercion {
        /// Name of the doubly-registered type
        type_name: &'static str,
    },

    /// A field's constraint tag could not be parsed
    #[error("Malformed constraint tag on '{field}': {reason}")]
    Constraint {
        /// Path key of the offending field
        field: String,
        /// Reason the tag was rejected
        reason: String,
    },

    /// Constraint evaluation panicked; the panic was recovered
    #[error("Constraint evaluation panicked: {detail}")]
    ValidationPanic {
        /// Recovered panic payload, if printable
        detail: String,
    },

    /// A coerced value was assigned to a field the shape does not declare
    #[error("Shape has no assignable field '{field}'")]
    UnknownField {
        /// The unknown field name
        field: String,
    },

    /// A coerced value did not match the declared field type
    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        /// Declared field name
        field: String,
        /// Expected type name
        expected: &'static str,
        /// Actual type name of the coerced value
        actual: &'static str,
    },

    /// A custom validator or the rules engine failed on its own behalf
    #[error("'{stage}' check failed: {error}")]
    Check {
        /// The stage or section that failed (e.g. "query", "request", "rules")
        stage: String,
        /// The opaque infrastructure failure
        error: anyhow::Error,
    },
}

/// Terminal outcome of binding plus validation
///
/// The two-kind taxonomy as a compile-time-checked invariant: a request is
/// either valid (`Ok(())`), rejected with an aggregate of client-caused
/// failures, or aborted by a single server-classified error. The two
/// failure kinds are never mixed.
#[derive(Error, Debug)]
pub enum Rejection {
    /// Client-caused validation failures, aggregated per path key
    #[error("request validation failed: {0}")]
    Invalid(ValidationErrors),

    /// A server-classified failure; any accumulated client errors were discarded
    #[error(transparent)]
    Server(#[from] Error),
}

impl Rejection {
    /// Returns the aggregate if this is a client-classified rejection
    #[must_use]
    pub fn as_invalid(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Server(_) => None,
        }
    }

    /// True if this rejection was caused by bad client input
    #[must_use]
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}
