//! # Adapter Error Handling
//!
//! Error types for the hyper adapter layer.

use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised while wrapping a transport request
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Request payload exceeded the configured limit
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_display() {
        let err = AdapterError::PayloadTooLarge {
            limit: 1024,
            actual: 4096,
        };
        assert!(err.to_string().contains("1024"));
        assert!(err.to_string().contains("4096"));
    }
}
