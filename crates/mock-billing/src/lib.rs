//! Mock billing service implementations for donation flow testing.
//!
//! This crate provides scripted implementations of the `BillingService`
//! trait:
//! - `MockBilling` - in-memory service with a configurable catalog,
//!   connection-failure budget and consume ledger
//! - `DelayedBilling` - wraps another service with artificial latency
//! - `StaticProvider` / `UnsupportedProvider` - provider helpers
//!
//! # Example
//!
//! ```rust
//! use mock_billing::{ItemDetails, MockBilling, ResponseCode};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (billing, _events) = MockBilling::new();
//!     billing.add_item(ItemDetails {
//!         product_id: "coffee".to_string(),
//!         title: "Coffee".to_string(),
//!         price: "1.99".to_string(),
//!     });
//!
//!     use billing_core::BillingService;
//!     assert_eq!(billing.connect().await, ResponseCode::Ok);
//!     let response = billing.query_item_details(&["coffee".to_string()]).await;
//!     assert_eq!(response.items.len(), 1);
//! }
//! ```

mod delayed;
mod mock;

// Re-export billing-core types for convenience
pub use billing_core::{
    async_trait, BillingError, BillingEvent, BillingService, BillingServiceProvider,
    ConsumeResponse, EventReceiver, EventSender, ItemDetails, Purchase, PurchaseState,
    QueryResponse, ResponseCode,
};

pub use delayed::DelayedBilling;
pub use mock::{MockBilling, StaticProvider, UnsupportedProvider};
