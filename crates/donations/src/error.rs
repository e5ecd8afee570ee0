//! Error types for the host-facing donations handle.

use billing_core::BillingError;
use thiserror::Error;

/// Errors returned by the [`Donations`](crate::Donations) handle.
#[derive(Debug, Error)]
pub enum DonationError {
    /// The engine task has terminated and no longer accepts requests.
    #[error("donations engine is closed")]
    Closed,

    /// A billing-layer error.
    #[error(transparent)]
    Billing(#[from] BillingError),
}
