//! Drives a scripted donation purchase end to end against the mock billing
//! service.
//!
//! Run with: cargo run -p donations --example donate

use std::sync::Arc;
use std::time::Duration;

use donations::{
    CatalogEntry, Donations, DonationsConfig, GoogleConfig, ItemDetails, LoggingListener,
    Purchase, ResponseCode,
};
use mock_billing::{MockBilling, StaticProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let (billing, events) = MockBilling::new();
    billing.add_item(ItemDetails {
        product_id: "donation.coffee".to_string(),
        title: "Coffee".to_string(),
        price: "1.99".to_string(),
    });

    let config = DonationsConfig {
        google: Some(GoogleConfig {
            public_key: "base64-public-key".to_string(),
            catalog: vec![CatalogEntry::new("donation.coffee", "Coffee")],
        }),
        ..Default::default()
    };

    let donations = Donations::spawn(
        config,
        Arc::new(StaticProvider::new(billing.clone())),
        events,
        Arc::new(LoggingListener),
    );

    donations.request_purchase("donation.coffee")?;

    // Give the engine time to launch the purchase UI, then play the part of
    // the billing service reporting the purchase back.
    tokio::time::sleep(Duration::from_millis(100)).await;
    billing.push_update(
        ResponseCode::Ok,
        Some(vec![Purchase::purchased("donation.coffee", "token-1")]),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    donations.shutdown().await?;
    Ok(())
}
