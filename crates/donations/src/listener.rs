//! The host-facing donation outcome contract.

use async_trait::async_trait;

/// Receives the outcome of donation purchase attempts.
///
/// Invoked exactly once per user-initiated purchase attempt, plus once per
/// externally-initiated purchase reconciled through the update channel.
#[async_trait]
pub trait DonationListener: Send + Sync {
    /// A donation for `product_id` completed and was consumed.
    async fn donation_success(&self, product_id: &str);

    /// A donation attempt failed.
    async fn donation_failure(&self);

    /// Billing is not supported in this environment.
    ///
    /// Default implementation reports a generic failure, so hosts that do
    /// not present a dedicated message keep working.
    async fn billing_unsupported(&self) {
        self.donation_failure().await;
    }
}

/// A listener that discards all outcomes.
#[derive(Debug, Clone, Default)]
pub struct NoOpListener;

#[async_trait]
impl DonationListener for NoOpListener {
    async fn donation_success(&self, _product_id: &str) {}

    async fn donation_failure(&self) {}
}

/// A listener that logs all outcomes, for debugging.
#[derive(Debug, Clone, Default)]
pub struct LoggingListener;

#[async_trait]
impl DonationListener for LoggingListener {
    async fn donation_success(&self, product_id: &str) {
        tracing::info!("Donation for '{}' completed", product_id);
    }

    async fn donation_failure(&self) {
        tracing::warn!("Donation failed");
    }

    async fn billing_unsupported(&self) {
        tracing::warn!("In-app purchases are not supported in this environment");
    }
}
