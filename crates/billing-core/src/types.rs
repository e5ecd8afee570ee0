//! Data types exchanged with the billing service.

use serde::{Deserialize, Serialize};

/// Result code returned by the billing service for an operation.
///
/// The orchestration layer only acts on the OK/non-OK distinction; the full
/// set exists so hosts and mocks can express realistic service behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Operation succeeded.
    Ok,
    /// The user backed out of the purchase UI.
    UserCanceled,
    /// The billing service is temporarily unreachable.
    ServiceUnavailable,
    /// Billing is not available on this device or account.
    BillingUnavailable,
    /// The requested item is not available for purchase.
    ItemUnavailable,
    /// Invalid arguments were supplied to the billing service.
    DeveloperError,
    /// Generic failure.
    Error,
    /// The item is already owned and has not been consumed yet.
    ItemAlreadyOwned,
    /// The item is not owned, e.g. its token was already consumed.
    ItemNotOwned,
}

impl ResponseCode {
    /// Whether this code indicates success.
    pub fn is_ok(self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}

/// Lifecycle state of a reported purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseState {
    /// Payment completed; the purchase must be consumed before the user is
    /// credited.
    Purchased,
    /// Payment is awaiting an external action; no fulfilment yet.
    Pending,
    /// The service did not report a state.
    Unspecified,
}

/// A purchase as reported by the billing service.
///
/// Purchases are never persisted locally; the billing service remains the
/// source of truth for purchase status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Product id this purchase is for.
    pub product_id: String,
    /// Opaque token correlating consume requests with this transaction.
    pub token: String,
    /// Reported lifecycle state.
    pub state: PurchaseState,
}

impl Purchase {
    /// Create a purchase record in the given state.
    pub fn new(
        product_id: impl Into<String>,
        token: impl Into<String>,
        state: PurchaseState,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            token: token.into(),
            state,
        }
    }

    /// Shorthand for a record in the `Purchased` state.
    pub fn purchased(product_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(product_id, token, PurchaseState::Purchased)
    }
}

/// Catalog metadata for one purchasable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    /// Product id of the item.
    pub product_id: String,
    /// Display title.
    pub title: String,
    /// Formatted display price.
    pub price: String,
}

/// Response to a catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Overall result of the query.
    pub code: ResponseCode,
    /// Items matching the queried product ids.
    pub items: Vec<ItemDetails>,
}

/// Response to a consume request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeResponse {
    /// Result of the consumption.
    pub code: ResponseCode,
    /// The token the service consumed. Must match the request token.
    pub token: String,
}

/// Asynchronous notification pushed by the billing service.
///
/// Purchase updates can arrive at any time, not just after a launch;
/// purchases initiated outside the app are reported on the same channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingEvent {
    /// One or more purchases changed state.
    PurchasesUpdated {
        /// Overall result of the update.
        code: ResponseCode,
        /// Updated purchases, absent when the service reports an error.
        purchases: Option<Vec<Purchase>>,
    },
    /// The connection to the billing service dropped.
    Disconnected,
}
