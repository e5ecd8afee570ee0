//! Connection lifecycle to the billing service.

use std::sync::Arc;
use std::time::Duration;

use billing_core::{BillingError, BillingService, BillingServiceProvider};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Retry policy for billing connection attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay; each wait is `base_delay / retries_remaining`.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            base_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay before the next attempt when `remaining` retries are left.
    ///
    /// The delay shrinks as the budget runs out, so attempts speed up
    /// toward exhaustion.
    pub fn delay_for(&self, remaining: u32) -> Duration {
        self.base_delay / remaining.max(1)
    }
}

/// Connection state, owned exclusively by [`BillingConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The client handle is live.
    Connected,
}

/// Manages the connect/disconnect lifecycle of the billing client.
///
/// The engine task owns this exclusively; no other component issues
/// operations against the client handle directly, so connection state has a
/// single writer.
pub struct BillingConnection {
    provider: Arc<dyn BillingServiceProvider>,
    retry: RetryConfig,
    state: ConnectionState,
    client: Option<Arc<dyn BillingService>>,
}

impl BillingConnection {
    /// Create a disconnected connection manager.
    pub fn new(provider: Arc<dyn BillingServiceProvider>, retry: RetryConfig) -> Self {
        Self {
            provider,
            retry,
            state: ConnectionState::Disconnected,
            client: None,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Return a live client, connecting first if necessary.
    ///
    /// Runs the bounded retry loop when disconnected. On exhaustion the
    /// state stays `Disconnected` and the caller gets
    /// [`BillingError::ConnectionExhausted`], so dependent operations fail
    /// fast instead of hanging.
    pub async fn ensure_connected(&mut self) -> Result<Arc<dyn BillingService>, BillingError> {
        if self.state == ConnectionState::Connected {
            if let Some(client) = &self.client {
                return Ok(client.clone());
            }
        }
        self.connect().await
    }

    async fn connect(&mut self) -> Result<Arc<dyn BillingService>, BillingError> {
        self.state = ConnectionState::Connecting;
        let mut remaining = self.retry.max_retries;
        loop {
            // A fresh client per attempt, matching the platform client's
            // one-shot connection lifecycle.
            let client = match self.provider.create() {
                Ok(client) => client,
                Err(e) => {
                    self.state = ConnectionState::Disconnected;
                    return Err(e);
                }
            };
            let code = client.connect().await;
            if code.is_ok() {
                info!("Connected to billing service");
                self.state = ConnectionState::Connected;
                self.client = Some(client.clone());
                return Ok(client);
            }
            if remaining == 0 {
                warn!("Billing connection retries exhausted, giving up");
                self.state = ConnectionState::Disconnected;
                return Err(BillingError::ConnectionExhausted);
            }
            let delay = self.retry.delay_for(remaining);
            debug!(
                "Billing connection failed ({:?}), retrying in {:?} ({} retries left)",
                code, delay, remaining
            );
            sleep(delay).await;
            remaining -= 1;
        }
    }

    /// Handle a disconnect notification from the service.
    ///
    /// Does not reconnect; only `ensure_connected` triggers a new attempt,
    /// so a backgrounded host does not produce reconnect storms.
    pub fn on_disconnected(&mut self) {
        warn!("Billing service connection lost");
        self.state = ConnectionState::Disconnected;
        self.client = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_billing::{MockBilling, StaticProvider, UnsupportedProvider};

    fn connection(mock: Arc<MockBilling>, retry: RetryConfig) -> BillingConnection {
        BillingConnection::new(Arc::new(StaticProvider::new(mock)), retry)
    }

    #[test]
    fn test_delay_shrinks_with_remaining_retries() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(20), Duration::from_millis(500));
        assert_eq!(retry.delay_for(2), Duration::from_secs(5));
        assert_eq!(retry.delay_for(1), Duration::from_secs(10));
        // Guard against division by zero.
        assert_eq!(retry.delay_for(0), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_connects_once_and_reuses_client() {
        let (mock, _events) = MockBilling::new();
        let mut connection = connection(mock.clone(), RetryConfig::default());

        assert_eq!(connection.state(), ConnectionState::Disconnected);
        connection.ensure_connected().await.unwrap();
        connection.ensure_connected().await.unwrap();

        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(mock.connect_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let (mock, _events) = MockBilling::new();
        mock.fail_connects(3);
        let mut connection = connection(mock.clone(), RetryConfig::default());

        connection.ensure_connected().await.unwrap();

        assert_eq!(mock.connect_calls(), 4);
        assert_eq!(connection.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_fails_fast() {
        let (mock, _events) = MockBilling::new();
        mock.fail_connects(u32::MAX);
        let retry = RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        let mut connection = connection(mock.clone(), retry);

        let err = connection.ensure_connected().await.err().unwrap();

        assert_eq!(err, BillingError::ConnectionExhausted);
        // Initial attempt plus two retries.
        assert_eq!(mock.connect_calls(), 3);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnects_after_disconnect() {
        let (mock, _events) = MockBilling::new();
        let mut connection = connection(mock.clone(), RetryConfig::default());

        connection.ensure_connected().await.unwrap();
        connection.on_disconnected();
        assert_eq!(connection.state(), ConnectionState::Disconnected);

        connection.ensure_connected().await.unwrap();
        assert_eq!(mock.connect_calls(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_provider_propagates() {
        let mut connection = BillingConnection::new(
            Arc::new(UnsupportedProvider::default()),
            RetryConfig::default(),
        );

        let err = connection.ensure_connected().await.err().unwrap();
        assert!(matches!(err, BillingError::Unsupported(_)));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }
}
