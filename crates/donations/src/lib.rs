//! Purchase-flow orchestration for in-app and web donation methods.
//!
//! This crate lets a host application offer in-app purchase donations next
//! to web-redirect methods (PayPal, Flattr) and address display (bitcoin)
//! behind one configuration surface. The algorithmic part is the billing
//! engine:
//!
//! - [`BillingConnection`] - connect/disconnect lifecycle with bounded
//!   shrinking-delay retry
//! - [`Donations`] - the serialized engine driving the
//!   query -> launch -> consume purchase lifecycle and reconciling purchase
//!   updates pushed by the service
//! - [`DonationListener`] - the host contract receiving exactly one outcome
//!   per purchase attempt
//!
//! # Architecture
//!
//! ```text
//! request_purchase()          BillingEvent push channel
//!        ↓                              ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              ENGINE (one spawned task)              │
//! │                                                     │
//! │  ensure connection (bounded retry, shrinking delay) │
//! │        ↓                                            │
//! │  query catalog, reject unless exactly one match     │
//! │        ↓                                            │
//! │  launch purchase UI (outcome arrives as an event)   │
//! │                                                     │
//! │  on purchases-updated:                              │
//! │    skip non-purchased → consume → verify token      │
//! │        ↓                                            │
//! │  listener.donation_success / donation_failure       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use donations::{
//!     CatalogEntry, Donations, DonationsConfig, GoogleConfig, LoggingListener,
//! };
//!
//! # fn provider() -> Arc<dyn donations::BillingServiceProvider> { unimplemented!() }
//! # fn events() -> donations::EventReceiver { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DonationsConfig {
//!         google: Some(GoogleConfig {
//!             public_key: "base64-public-key".to_string(),
//!             catalog: vec![CatalogEntry::new("donation.coffee", "Coffee")],
//!         }),
//!         ..Default::default()
//!     };
//!
//!     let donations = Donations::spawn(config, provider(), events(), Arc::new(LoggingListener));
//!     donations.request_purchase("donation.coffee")?;
//!     // The outcome arrives on the listener once the service reports back.
//!     Ok(())
//! }
//! ```

mod config;
mod connection;
mod engine;
mod error;
mod listener;

// Public exports
pub use config::{
    BitcoinConfig, CatalogEntry, DonationMethod, DonationsConfig, FlattrConfig, GoogleConfig,
    PaypalConfig, SANDBOX_CATALOG,
};
pub use connection::{BillingConnection, ConnectionState, RetryConfig};
pub use engine::Donations;
pub use error::DonationError;
pub use listener::{DonationListener, LoggingListener, NoOpListener};

// Re-export commonly used types from billing-core
pub use billing_core::{
    event_channel, BillingError, BillingEvent, BillingService, BillingServiceProvider,
    ConsumeResponse, EventReceiver, EventSender, ItemDetails, Purchase, PurchaseState,
    QueryResponse, ResponseCode,
};
