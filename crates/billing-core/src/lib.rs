//! Core traits and types for billing-backed donation flows.
//!
//! This crate defines the narrow protocol the donation orchestration layer
//! drives against a platform billing service:
//!
//! - [`BillingService`] - the asynchronous capability (connect, query,
//!   launch, consume) implemented by the host for its platform
//! - [`BillingServiceProvider`] - the construction seam producing a fresh
//!   client per connection attempt
//! - [`BillingEvent`] - purchase updates pushed by the service at any time
//! - [`BillingError`] - the error taxonomy shared across the workspace
//!
//! The actual orchestration (connection retry, purchase lifecycle,
//! reconciliation) lives in the `donations` crate; scripted implementations
//! for tests live in `mock-billing`.
//!
//! # Example
//!
//! ```rust
//! use billing_core::{
//!     async_trait, BillingService, ConsumeResponse, ItemDetails, QueryResponse, ResponseCode,
//! };
//!
//! struct NoBilling;
//!
//! #[async_trait]
//! impl BillingService for NoBilling {
//!     async fn connect(&self) -> ResponseCode {
//!         ResponseCode::BillingUnavailable
//!     }
//!
//!     async fn query_item_details(&self, _product_ids: &[String]) -> QueryResponse {
//!         QueryResponse { code: ResponseCode::BillingUnavailable, items: vec![] }
//!     }
//!
//!     async fn launch_purchase(&self, _item: &ItemDetails) -> ResponseCode {
//!         ResponseCode::BillingUnavailable
//!     }
//!
//!     async fn consume(&self, purchase_token: &str) -> ConsumeResponse {
//!         ConsumeResponse {
//!             code: ResponseCode::BillingUnavailable,
//!             token: purchase_token.to_string(),
//!         }
//!     }
//! }
//! ```

mod error;
mod service;
mod types;

pub use error::BillingError;
pub use service::{event_channel, BillingService, BillingServiceProvider, EventReceiver, EventSender};
pub use types::{
    BillingEvent, ConsumeResponse, ItemDetails, Purchase, PurchaseState, QueryResponse,
    ResponseCode,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
