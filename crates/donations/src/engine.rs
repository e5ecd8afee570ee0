//! The serialized billing engine and its host-facing handle.

use std::sync::Arc;

use billing_core::{
    BillingError, BillingEvent, BillingServiceProvider, EventReceiver, Purchase, PurchaseState,
    ResponseCode,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::DonationsConfig;
use crate::connection::{BillingConnection, RetryConfig};
use crate::error::DonationError;
use crate::listener::DonationListener;

enum Command {
    RequestPurchase { product_id: String },
    Shutdown,
}

/// Host-facing handle to the donations engine.
///
/// All billing operations run on one spawned task, the engine's single
/// serialized execution context. This handle only enqueues work; outcomes
/// are delivered through the [`DonationListener`] contract.
pub struct Donations {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<Result<(), BillingError>>,
}

impl Donations {
    /// Spawn the engine task with the default retry policy.
    ///
    /// `events` is the receiving half of the billing service's push
    /// channel; purchase updates arriving on it are reconciled even when no
    /// user-initiated flow is in progress.
    pub fn spawn(
        config: DonationsConfig,
        provider: Arc<dyn BillingServiceProvider>,
        events: EventReceiver,
        listener: Arc<dyn DonationListener>,
    ) -> Self {
        Self::spawn_with_retry(config, provider, events, listener, RetryConfig::default())
    }

    /// Spawn the engine task with a custom connection retry policy.
    pub fn spawn_with_retry(
        config: DonationsConfig,
        provider: Arc<dyn BillingServiceProvider>,
        events: EventReceiver,
        listener: Arc<dyn DonationListener>,
        retry: RetryConfig,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let engine = Engine {
            config,
            connection: BillingConnection::new(provider, retry),
            listener,
        };
        let task = tokio::spawn(engine.run(receiver, events));
        Self { commands, task }
    }

    /// Request an in-app purchase donation for `product_id`.
    ///
    /// Returns as soon as the request is enqueued. The outcome is delivered
    /// through the listener, exactly once per request, when the billing
    /// service reports back.
    pub fn request_purchase(&self, product_id: impl Into<String>) -> Result<(), DonationError> {
        self.commands
            .send(Command::RequestPurchase {
                product_id: product_id.into(),
            })
            .map_err(|_| DonationError::Closed)
    }

    /// Stop the engine after draining already queued requests.
    ///
    /// Surfaces the terminal error when the engine aborted on an integrity
    /// violation.
    pub async fn shutdown(self) -> Result<(), DonationError> {
        let _ = self.commands.send(Command::Shutdown);
        match self.task.await {
            Ok(result) => result.map_err(DonationError::Billing),
            Err(_) => Err(DonationError::Closed),
        }
    }
}

/// State owned by the engine task. Everything mutable lives here, giving
/// connection state and the client handle a single writer.
struct Engine {
    config: DonationsConfig,
    connection: BillingConnection,
    listener: Arc<dyn DonationListener>,
}

impl Engine {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: EventReceiver,
    ) -> Result<(), BillingError> {
        let mut events_open = true;
        loop {
            // Commands and events are each handled to completion in arrival
            // order; commands win when both are ready, so an external
            // update can never interleave inside a request flow.
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::RequestPurchase { product_id }) => {
                        self.handle_request(&product_id).await;
                    }
                    Some(Command::Shutdown) | None => break,
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event).await?,
                    None => events_open = false,
                },
            }
        }
        debug!("Billing engine stopped");
        Ok(())
    }

    /// Drive one user-initiated purchase attempt.
    ///
    /// Every failure is absorbed here and translated into exactly one
    /// listener callback; no billing result codes leak to the host.
    async fn handle_request(&mut self, product_id: &str) {
        match self.purchase_flow(product_id).await {
            Ok(()) => {}
            Err(BillingError::Unsupported(reason)) => {
                error!("Billing unsupported: {}", reason);
                self.listener.billing_unsupported().await;
            }
            Err(e) => {
                warn!("Donation request for '{}' failed: {}", product_id, e);
                self.listener.donation_failure().await;
            }
        }
    }

    /// Query the catalog and launch the purchase UI.
    ///
    /// Launching produces no outcome here; success or failure arrives later
    /// on the purchase-update channel.
    async fn purchase_flow(&mut self, requested: &str) -> Result<(), BillingError> {
        if self.config.google.is_none() {
            return Err(BillingError::Config(
                "in-app purchase donations are not enabled".to_string(),
            ));
        }
        let product_id = self.config.effective_product_id(requested);
        debug!("Requesting purchase of '{}'", product_id);

        let client = self.connection.ensure_connected().await?;
        let response = client.query_item_details(&[product_id.clone()]).await;
        if !response.code.is_ok() {
            return Err(BillingError::ResultError {
                operation: "query",
                code: response.code,
            });
        }
        if response.items.len() != 1 {
            return Err(BillingError::CatalogMismatch {
                product_id,
                count: response.items.len(),
            });
        }
        let item = response
            .items
            .into_iter()
            .next()
            .ok_or(BillingError::CatalogMismatch { product_id, count: 0 })?;

        // The connection may have dropped while the query was in flight.
        let client = self.connection.ensure_connected().await?;
        let code = client.launch_purchase(&item).await;
        if !code.is_ok() {
            // The launch code only acknowledges the UI launch; a failed
            // flow still resolves through the update channel.
            warn!("Purchase UI launch for '{}' returned {:?}", item.product_id, code);
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: BillingEvent) -> Result<(), BillingError> {
        match event {
            BillingEvent::Disconnected => {
                self.connection.on_disconnected();
                Ok(())
            }
            BillingEvent::PurchasesUpdated { code, purchases } => {
                self.handle_purchases_updated(code, purchases).await
            }
        }
    }

    /// Reconcile a purchases-updated notification.
    ///
    /// Every purchased record is consumed before its outcome is reported;
    /// an unconsumed purchase would be refunded by the service. Only an
    /// integrity violation escapes this method, terminating the engine.
    async fn handle_purchases_updated(
        &mut self,
        code: ResponseCode,
        purchases: Option<Vec<Purchase>>,
    ) -> Result<(), BillingError> {
        let Some(purchases) = purchases.filter(|_| code.is_ok()) else {
            warn!("Purchase update failed: {:?}", code);
            self.listener.donation_failure().await;
            return Ok(());
        };
        for purchase in purchases {
            debug!(
                "Purchase of '{}' reported, state {:?}",
                purchase.product_id, purchase.state
            );
            if purchase.state != PurchaseState::Purchased {
                continue;
            }
            match self.consume_purchase(&purchase).await {
                Ok(true) => self.listener.donation_success(&purchase.product_id).await,
                Ok(false) => self.listener.donation_failure().await,
                Err(e) if e.is_fatal() => {
                    error!("Aborting billing engine: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Consume for '{}' failed: {}", purchase.product_id, e);
                    self.listener.donation_failure().await;
                }
            }
        }
        Ok(())
    }

    /// Consume one purchased record, returning whether consumption
    /// succeeded.
    ///
    /// A token the service no longer recognizes (e.g. already consumed)
    /// resolves as an ordinary failure, so duplicate update notifications
    /// are tolerated.
    async fn consume_purchase(&mut self, purchase: &Purchase) -> Result<bool, BillingError> {
        let client = self.connection.ensure_connected().await?;
        let response = client.consume(&purchase.token).await;
        if response.token != purchase.token {
            return Err(BillingError::IntegrityViolation {
                expected: purchase.token.clone(),
                actual: response.token,
            });
        }
        if response.code.is_ok() {
            debug!("Consumed purchase of '{}'", purchase.product_id);
            Ok(true)
        } else {
            warn!(
                "Consumption of '{}' failed: {:?}",
                purchase.product_id, response.code
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogEntry, GoogleConfig};
    use billing_core::ItemDetails;
    use mock_billing::{MockBilling, StaticProvider};
    use std::sync::Mutex;

    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Outcome {
        Success(String),
        Failure,
        Unsupported,
    }

    #[derive(Default)]
    struct RecordingListener {
        outcomes: Mutex<Vec<Outcome>>,
    }

    impl RecordingListener {
        fn outcomes(&self) -> Vec<Outcome> {
            self.outcomes.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DonationListener for RecordingListener {
        async fn donation_success(&self, product_id: &str) {
            self.outcomes
                .lock()
                .unwrap()
                .push(Outcome::Success(product_id.to_string()));
        }

        async fn donation_failure(&self) {
            self.outcomes.lock().unwrap().push(Outcome::Failure);
        }

        async fn billing_unsupported(&self) {
            self.outcomes.lock().unwrap().push(Outcome::Unsupported);
        }
    }

    fn config() -> DonationsConfig {
        DonationsConfig {
            google: Some(GoogleConfig {
                public_key: "pubkey".to_string(),
                catalog: vec![CatalogEntry::new("coffee", "Coffee")],
            }),
            ..Default::default()
        }
    }

    fn engine(mock: Arc<MockBilling>, listener: Arc<RecordingListener>) -> Engine {
        Engine {
            config: config(),
            connection: BillingConnection::new(
                Arc::new(StaticProvider::new(mock)),
                RetryConfig::default(),
            ),
            listener,
        }
    }

    fn coffee_item() -> ItemDetails {
        ItemDetails {
            product_id: "coffee".to_string(),
            title: "Coffee".to_string(),
            price: "1.99".to_string(),
        }
    }

    #[tokio::test]
    async fn test_purchase_flow_queries_then_launches() {
        let (mock, _events) = MockBilling::new();
        mock.add_item(coffee_item());
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine.handle_request("coffee").await;

        assert_eq!(mock.launches(), vec!["coffee".to_string()]);
        assert!(listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_catalog_entry_fails_without_launch() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine.handle_request("coffee").await;

        assert!(mock.launches().is_empty());
        assert_eq!(listener.outcomes(), vec![Outcome::Failure]);
    }

    #[tokio::test]
    async fn test_ambiguous_catalog_fails_without_launch() {
        let (mock, _events) = MockBilling::new();
        mock.add_item(coffee_item());
        mock.add_item(coffee_item());
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine.handle_request("coffee").await;

        assert!(mock.launches().is_empty());
        assert_eq!(listener.outcomes(), vec![Outcome::Failure]);
    }

    #[tokio::test]
    async fn test_query_error_fails() {
        let (mock, _events) = MockBilling::new();
        mock.add_item(coffee_item());
        mock.set_query_code(ResponseCode::Error);
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine.handle_request("coffee").await;

        assert!(mock.launches().is_empty());
        assert_eq!(listener.outcomes(), vec![Outcome::Failure]);
    }

    #[tokio::test]
    async fn test_purchases_not_in_purchased_state_are_skipped() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine
            .handle_purchases_updated(
                ResponseCode::Ok,
                Some(vec![Purchase::new("coffee", "token-1", PurchaseState::Pending)]),
            )
            .await
            .unwrap();

        assert!(listener.outcomes().is_empty());
        assert!(!mock.is_consumed("token-1"));
    }

    #[tokio::test]
    async fn test_purchased_record_is_consumed_before_success() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine
            .handle_purchases_updated(
                ResponseCode::Ok,
                Some(vec![Purchase::purchased("coffee", "token-1")]),
            )
            .await
            .unwrap();

        assert!(mock.is_consumed("token-1"));
        assert_eq!(
            listener.outcomes(),
            vec![Outcome::Success("coffee".to_string())]
        );
    }

    #[tokio::test]
    async fn test_update_with_error_code_reports_failure_once() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        engine
            .handle_purchases_updated(
                ResponseCode::UserCanceled,
                Some(vec![Purchase::purchased("coffee", "token-1")]),
            )
            .await
            .unwrap();

        assert_eq!(listener.outcomes(), vec![Outcome::Failure]);
        assert!(!mock.is_consumed("token-1"));
    }

    #[tokio::test]
    async fn test_token_mismatch_is_fatal() {
        let (mock, _events) = MockBilling::new();
        mock.echo_token("other");
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        let err = engine
            .handle_purchases_updated(
                ResponseCode::Ok,
                Some(vec![Purchase::purchased("coffee", "token-1")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::IntegrityViolation { .. }));
        assert!(listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_update_resolves_as_failure() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());

        let update = Some(vec![Purchase::purchased("coffee", "token-1")]);
        engine
            .handle_purchases_updated(ResponseCode::Ok, update.clone())
            .await
            .unwrap();
        engine
            .handle_purchases_updated(ResponseCode::Ok, update)
            .await
            .unwrap();

        assert_eq!(
            listener.outcomes(),
            vec![Outcome::Success("coffee".to_string()), Outcome::Failure]
        );
    }

    #[tokio::test]
    async fn test_purchases_disabled_without_google_config() {
        let (mock, _events) = MockBilling::new();
        let listener = Arc::new(RecordingListener::default());
        let mut engine = engine(mock.clone(), listener.clone());
        engine.config.google = None;

        engine.handle_request("coffee").await;

        assert_eq!(mock.connect_calls(), 0);
        assert_eq!(listener.outcomes(), vec![Outcome::Failure]);
    }
}
