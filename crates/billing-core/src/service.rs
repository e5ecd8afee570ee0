//! The billing service capability traits and push channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BillingError;
use crate::types::{BillingEvent, ConsumeResponse, ItemDetails, QueryResponse, ResponseCode};

/// Sending half of the billing push channel, held by the service side.
pub type EventSender = mpsc::UnboundedSender<BillingEvent>;

/// Receiving half of the billing push channel, consumed by the engine.
pub type EventReceiver = mpsc::UnboundedReceiver<BillingEvent>;

/// Create the push channel pair for purchase-update notifications.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// The asynchronous billing capability the orchestration layer drives.
///
/// Implementations wrap the platform billing client. Every method is a
/// network/IPC-bound call and must not block the calling thread. Purchase
/// outcomes are not returned by [`launch_purchase`](Self::launch_purchase);
/// they arrive later as [`BillingEvent`]s on the push channel.
///
/// This trait is object-safe and is used as `Arc<dyn BillingService>`.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Attempt to connect to the billing service.
    async fn connect(&self) -> ResponseCode;

    /// Query catalog details for the given product ids.
    async fn query_item_details(&self, product_ids: &[String]) -> QueryResponse;

    /// Launch the billing service's purchase UI for an item.
    ///
    /// The returned code only acknowledges the launch; the real outcome is
    /// delivered on the push channel.
    async fn launch_purchase(&self, item: &ItemDetails) -> ResponseCode;

    /// Mark the purchase identified by `purchase_token` as fulfilled.
    ///
    /// The response echoes the consumed token for correlation.
    async fn consume(&self, purchase_token: &str) -> ConsumeResponse;
}

#[async_trait]
impl<T: BillingService + ?Sized> BillingService for Arc<T> {
    async fn connect(&self) -> ResponseCode {
        (**self).connect().await
    }

    async fn query_item_details(&self, product_ids: &[String]) -> QueryResponse {
        (**self).query_item_details(product_ids).await
    }

    async fn launch_purchase(&self, item: &ItemDetails) -> ResponseCode {
        (**self).launch_purchase(item).await
    }

    async fn consume(&self, purchase_token: &str) -> ConsumeResponse {
        (**self).consume(purchase_token).await
    }
}

/// Builds billing clients for the host environment.
///
/// A fresh client is created for every connection attempt. Construction
/// fails with [`BillingError::Unsupported`] on hosts where the billing
/// runtime cannot be set up at all.
pub trait BillingServiceProvider: Send + Sync {
    /// Create a new billing client.
    fn create(&self) -> Result<Arc<dyn BillingService>, BillingError>;
}
