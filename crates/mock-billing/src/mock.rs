//! Scripted in-memory billing service.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use billing_core::{
    async_trait, event_channel, BillingError, BillingEvent, BillingService,
    BillingServiceProvider, ConsumeResponse, EventReceiver, EventSender, ItemDetails, Purchase,
    QueryResponse, ResponseCode,
};

/// A scripted in-memory billing service.
///
/// Behavior is configured up front: how many connection attempts fail before
/// one succeeds, which catalog items exist, and how consume responses are
/// shaped. Purchase updates are injected through
/// [`push_update`](Self::push_update), mirroring the platform's push channel.
pub struct MockBilling {
    catalog: Mutex<Vec<ItemDetails>>,
    connect_failures: AtomicU32,
    connect_calls: AtomicU32,
    query_code: Mutex<ResponseCode>,
    queries: Mutex<Vec<Vec<String>>>,
    launch_code: Mutex<ResponseCode>,
    launches: Mutex<Vec<String>>,
    consumed: Mutex<HashSet<String>>,
    consume_echo: Mutex<Option<String>>,
    events: EventSender,
}

impl MockBilling {
    /// Create a mock service plus the receiving half of its push channel.
    pub fn new() -> (Arc<Self>, EventReceiver) {
        let (events, receiver) = event_channel();
        let mock = Arc::new(Self {
            catalog: Mutex::new(Vec::new()),
            connect_failures: AtomicU32::new(0),
            connect_calls: AtomicU32::new(0),
            query_code: Mutex::new(ResponseCode::Ok),
            queries: Mutex::new(Vec::new()),
            launch_code: Mutex::new(ResponseCode::Ok),
            launches: Mutex::new(Vec::new()),
            consumed: Mutex::new(HashSet::new()),
            consume_echo: Mutex::new(None),
            events,
        });
        (mock, receiver)
    }

    /// Add an item to the catalog. Duplicate product ids are allowed so
    /// tests can script ambiguous catalogs.
    pub fn add_item(&self, item: ItemDetails) {
        self.catalog.lock().unwrap().push(item);
    }

    /// Fail the next `n` connection attempts with `ServiceUnavailable`.
    pub fn fail_connects(&self, n: u32) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }

    /// Return `code` from every catalog query.
    pub fn set_query_code(&self, code: ResponseCode) {
        *self.query_code.lock().unwrap() = code;
    }

    /// Return `code` from every purchase UI launch.
    pub fn set_launch_code(&self, code: ResponseCode) {
        *self.launch_code.lock().unwrap() = code;
    }

    /// Echo `token` from every consume response regardless of the request.
    pub fn echo_token(&self, token: impl Into<String>) {
        *self.consume_echo.lock().unwrap() = Some(token.into());
    }

    /// Push a purchases-updated event.
    pub fn push_update(&self, code: ResponseCode, purchases: Option<Vec<Purchase>>) {
        let _ = self.events.send(BillingEvent::PurchasesUpdated { code, purchases });
    }

    /// Push a disconnect notification.
    pub fn push_disconnected(&self) {
        let _ = self.events.send(BillingEvent::Disconnected);
    }

    /// Number of connection attempts observed.
    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Product id lists from every catalog query, in call order.
    pub fn queried_ids(&self) -> Vec<Vec<String>> {
        self.queries.lock().unwrap().clone()
    }

    /// Product ids for which the purchase UI was launched, in call order.
    pub fn launches(&self) -> Vec<String> {
        self.launches.lock().unwrap().clone()
    }

    /// Whether `token` has been consumed.
    pub fn is_consumed(&self, token: &str) -> bool {
        self.consumed.lock().unwrap().contains(token)
    }
}

#[async_trait]
impl BillingService for MockBilling {
    async fn connect(&self) -> ResponseCode {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.connect_failures.store(remaining - 1, Ordering::SeqCst);
            ResponseCode::ServiceUnavailable
        } else {
            ResponseCode::Ok
        }
    }

    async fn query_item_details(&self, product_ids: &[String]) -> QueryResponse {
        self.queries.lock().unwrap().push(product_ids.to_vec());
        let code = *self.query_code.lock().unwrap();
        let items = self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .filter(|item| product_ids.contains(&item.product_id))
            .cloned()
            .collect();
        QueryResponse { code, items }
    }

    async fn launch_purchase(&self, item: &ItemDetails) -> ResponseCode {
        self.launches.lock().unwrap().push(item.product_id.clone());
        *self.launch_code.lock().unwrap()
    }

    async fn consume(&self, purchase_token: &str) -> ConsumeResponse {
        let token = self
            .consume_echo
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| purchase_token.to_string());
        let newly_consumed = self.consumed.lock().unwrap().insert(purchase_token.to_string());
        let code = if newly_consumed {
            ResponseCode::Ok
        } else {
            ResponseCode::ItemNotOwned
        };
        ConsumeResponse { code, token }
    }
}

/// Provider returning the same shared service on every attempt.
#[derive(Clone)]
pub struct StaticProvider {
    service: Arc<dyn BillingService>,
}

impl StaticProvider {
    /// Wrap a service so it can be handed out as a provider.
    pub fn new(service: Arc<dyn BillingService>) -> Self {
        Self { service }
    }
}

impl BillingServiceProvider for StaticProvider {
    fn create(&self) -> Result<Arc<dyn BillingService>, BillingError> {
        Ok(self.service.clone())
    }
}

/// Provider for environments where the billing runtime cannot be set up.
#[derive(Debug, Clone)]
pub struct UnsupportedProvider {
    reason: String,
}

impl UnsupportedProvider {
    /// Create a provider failing with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl Default for UnsupportedProvider {
    fn default() -> Self {
        Self::new("billing runtime unavailable")
    }
}

impl BillingServiceProvider for UnsupportedProvider {
    fn create(&self) -> Result<Arc<dyn BillingService>, BillingError> {
        Err(BillingError::Unsupported(self.reason.clone()))
    }
}
