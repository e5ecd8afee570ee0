//! Error types for billing operations.

use thiserror::Error;

use crate::types::ResponseCode;

/// Errors that can occur while driving the billing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// Connection retries were exhausted without reaching the service.
    #[error("billing connection failed after exhausting retries")]
    ConnectionExhausted,

    /// A catalog query returned zero or multiple items for one product id.
    #[error("catalog returned {count} items for '{product_id}', expected exactly 1")]
    CatalogMismatch {
        /// The product id that was queried.
        product_id: String,
        /// Number of items the service returned.
        count: usize,
    },

    /// The billing service returned a non-OK result code.
    #[error("billing {operation} failed: {code:?}")]
    ResultError {
        /// The operation that failed (query, launch, consume).
        operation: &'static str,
        /// The code the service returned.
        code: ResponseCode,
    },

    /// A consume response echoed a token that does not match the request.
    ///
    /// This is a protocol-breaking defect, not a recoverable user-facing
    /// condition; the engine terminates instead of reporting a generic
    /// failure.
    #[error("consume token mismatch: requested '{expected}', service echoed '{actual}'")]
    IntegrityViolation {
        /// Token of the purchase the consume was issued for.
        expected: String,
        /// Token the service echoed back.
        actual: String,
    },

    /// The billing client could not be constructed in this environment.
    #[error("billing not supported: {0}")]
    Unsupported(String),

    /// Invalid donation configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Whether this error must terminate the engine instead of being
    /// translated into a donation failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BillingError::IntegrityViolation { .. })
    }
}
