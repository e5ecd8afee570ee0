//! Delayed billing implementation - wraps another service with artificial latency.

use std::time::Duration;

use billing_core::{
    async_trait, BillingService, ConsumeResponse, ItemDetails, QueryResponse, ResponseCode,
};
use tokio::time::sleep;

/// A billing service that wraps another service and adds artificial delay
/// to every call.
///
/// Useful for exercising ordering and the connection-dropped-during-query
/// paths without a real service.
pub struct DelayedBilling<B: BillingService> {
    inner: B,
    delay: Duration,
}

impl<B: BillingService> DelayedBilling<B> {
    /// Create a new DelayedBilling wrapping the given service.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a service with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<B: BillingService> BillingService for DelayedBilling<B> {
    async fn connect(&self) -> ResponseCode {
        sleep(self.delay).await;
        self.inner.connect().await
    }

    async fn query_item_details(&self, product_ids: &[String]) -> QueryResponse {
        sleep(self.delay).await;
        self.inner.query_item_details(product_ids).await
    }

    async fn launch_purchase(&self, item: &ItemDetails) -> ResponseCode {
        sleep(self.delay).await;
        self.inner.launch_purchase(item).await
    }

    async fn consume(&self, purchase_token: &str) -> ConsumeResponse {
        sleep(self.delay).await;
        self.inner.consume(purchase_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockBilling;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_connect() {
        let (inner, _events) = MockBilling::new();
        let billing = DelayedBilling::with_millis(inner, 50);

        let start = Instant::now();
        let code = billing.connect().await;
        let elapsed = start.elapsed();

        assert_eq!(code, ResponseCode::Ok);
        assert!(elapsed >= Duration::from_millis(50));
    }
}
