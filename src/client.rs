//! TradewireClient - Main SDK entry point
//!
//! # Example
//!
//! ```rust,no_run
//! use tradewire::{Config, TradewireClient, TransportMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder()
//!         .endpoint("ws://127.0.0.1:9900/engine")
//!         .build()?;
//!
//!     let client = TradewireClient::connect(config).await?;
//!
//!     let response = client
//!         .batch()
//!         .add_transfer("payer...", "recipient...", 1_000_000)
//!         .fee_payer("payer...")
//!         .transport_mode(TransportMode::Standard)
//!         .send()
//!         .await?;
//!
//!     println!("signature: {:?}", response.signature());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::builder::BatchBuilder;
use crate::config::Config;
use crate::connection::{Transport, WebSocketTransport};
use crate::error::{EngineError, Result};
use crate::types::{BatchRequest, ClientStats, EngineRequest, EngineResponse, RequestBody};

/// Tradewire client for batched trade submission
pub struct TradewireClient {
    config: Config,
    transport: Arc<dyn Transport>,
    stats: std::sync::Mutex<StatsInner>,
}

/// Internally tracked counters; connection state is pulled live from the
/// transport at snapshot time.
struct StatsInner {
    requests_sent: u64,
    requests_successful: u64,
    requests_failed: u64,
    average_latency_ms: f64,
    connected_since: Option<u64>,
}

impl StatsInner {
    fn fresh() -> Self {
        Self {
            requests_sent: 0,
            requests_successful: 0,
            requests_failed: 0,
            average_latency_ms: 0.0,
            connected_since: Some(now_millis()),
        }
    }

    /// Fold one completed attempt into the counters and the running mean.
    fn record_outcome(&mut self, success: bool, latency_ms: f64) {
        if success {
            self.requests_successful += 1;
        } else {
            self.requests_failed += 1;
        }
        let n = (self.requests_successful + self.requests_failed) as f64;
        self.average_latency_ms = (self.average_latency_ms * (n - 1.0) + latency_ms) / n;
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl TradewireClient {
    /// Connect to the engine using the provided configuration.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;

        info!(endpoint = %config.endpoint, "connecting to Tradewire engine");

        let transport = Arc::new(WebSocketTransport::new(config.clone()));
        transport.connect().await?;

        Ok(Self::with_transport(config, transport))
    }

    /// Build a client around an already-constructed transport.
    ///
    /// The caller is responsible for connecting the transport (or leaving
    /// that to auto-reconnect on the first request).
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            stats: std::sync::Mutex::new(StatsInner::fresh()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if the client is connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Disconnect from the engine
    pub async fn disconnect(&self) -> Result<()> {
        self.transport.disconnect().await
    }

    /// Start a new batch against this client
    pub fn batch(&self) -> BatchBuilder<'_> {
        BatchBuilder::new(self)
    }

    /// Submit one batch for execution (or simulation, depending on its
    /// transport mode) and return the engine's response unchanged.
    ///
    /// The batch is validated before it reaches the transport; validation
    /// failures surface as `InvalidRequest` and still count as sent
    /// attempts in the statistics.
    pub async fn execute(&self, request: BatchRequest) -> Result<EngineResponse> {
        self.stats.lock().unwrap().requests_sent += 1;

        self.validate(&request)?;

        debug!(
            operations = request.operations.len(),
            kinds = ?request
                .operations
                .iter()
                .map(|op| op.descriptor())
                .collect::<Vec<_>>(),
            mode = ?request.params.mode,
            "executing batch"
        );

        self.dispatch(EngineRequest::new(RequestBody::Execute(request)))
            .await
    }

    /// Provision a custody wallet for the given owner key.
    ///
    /// This is a distinct request kind, not a batch operation; it shares
    /// the transport, the statistics bookkeeping and the error taxonomy
    /// with `execute`.
    pub async fn create_wallet(&self, owner: impl Into<String>) -> Result<EngineResponse> {
        let owner = owner.into();
        self.stats.lock().unwrap().requests_sent += 1;

        if owner.is_empty() {
            return Err(EngineError::invalid_request("owner public key is required"));
        }

        debug!(owner = %owner, "requesting wallet provisioning");
        self.dispatch(EngineRequest::new(RequestBody::CreateWallet { owner }))
            .await
    }

    /// Liveness probe. Returns `true` on any well-formed response from
    /// the engine, regardless of its success flag.
    pub async fn ping(&self) -> Result<bool> {
        self.stats.lock().unwrap().requests_sent += 1;
        self.dispatch(EngineRequest::new(RequestBody::Ping))
            .await
            .map(|_| true)
    }

    /// Read-only snapshot of the rolling statistics, merged with live
    /// transport state.
    pub fn get_stats(&self) -> ClientStats {
        let stats = self.stats.lock().unwrap();
        ClientStats {
            requests_sent: stats.requests_sent,
            requests_successful: stats.requests_successful,
            requests_failed: stats.requests_failed,
            average_latency_ms: stats.average_latency_ms,
            connected: self.transport.is_connected(),
            connected_since: stats.connected_since,
            reconnect_attempts: self.transport.reconnect_attempts(),
        }
    }

    /// Replace the statistics wholesale and restamp `connected_since`.
    pub fn reset_stats(&self) {
        *self.stats.lock().unwrap() = StatsInner::fresh();
    }

    /// Structural validation applied before any transport contact.
    fn validate(&self, request: &BatchRequest) -> Result<()> {
        if request.operations.is_empty() {
            return Err(EngineError::invalid_request("batch contains no operations"));
        }
        if request.params.fee_payer.is_empty() {
            return Err(EngineError::invalid_request("fee payer is required"));
        }
        if request.params.mode.is_none() {
            return Err(EngineError::invalid_request("transport mode is required"));
        }
        for (index, operation) in request.operations.iter().enumerate() {
            operation
                .validate()
                .map_err(|reason| {
                    EngineError::invalid_request(format!("operation {index}: {reason}"))
                })?;
        }
        Ok(())
    }

    /// Forward one envelope, timing the exchange and folding the outcome
    /// into the statistics. Errors leave here classified.
    async fn dispatch(&self, envelope: EngineRequest) -> Result<EngineResponse> {
        let mode = envelope.mode();
        let started = Instant::now();

        match self.transport.request(envelope).await {
            Ok(response) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
                self.stats
                    .lock()
                    .unwrap()
                    .record_outcome(response.is_success(), latency_ms);
                Ok(response)
            }
            Err(e) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
                self.stats.lock().unwrap().record_outcome(false, latency_ms);
                Err(EngineError::classify(Box::new(e), mode))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockTransport, Reply};
    use crate::types::{ExecutionParams, Operation, TransferParams, TransportMode};

    fn transfer(from: &str, to: &str, lamports: u64) -> Operation {
        Operation::Transfer(TransferParams {
            from: from.into(),
            to: to.into(),
            lamports,
        })
    }

    fn batch(operations: Vec<Operation>, fee_payer: &str) -> BatchRequest {
        BatchRequest {
            operations,
            params: ExecutionParams {
                fee_payer: fee_payer.into(),
                priority_fee: 1_000,
                bribe: None,
                mode: Some(TransportMode::Standard),
            },
        }
    }

    fn client_with(mock: Arc<MockTransport>) -> TradewireClient {
        let config = Config::builder().build().unwrap();
        TradewireClient::with_transport(config, mock)
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_transport() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(mock.clone());

        let err = client
            .execute(batch(vec![], "payer"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidRequest);
        assert!(mock.seen().is_empty());

        let err = client
            .execute(batch(vec![transfer("a", "b", 1)], ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidRequest);
        assert!(mock.seen().is_empty());
    }

    #[tokio::test]
    async fn test_stats_count_validation_failures_as_sent() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(mock.clone());

        client
            .execute(batch(vec![transfer("a", "b", 1)], "payer"))
            .await
            .unwrap();
        client
            .execute(batch(vec![transfer("b", "c", 2)], "payer"))
            .await
            .unwrap();
        // Missing fee payer: fails validation before the transport.
        let _ = client.execute(batch(vec![transfer("a", "b", 1)], "")).await;

        let stats = client.get_stats();
        assert_eq!(stats.requests_sent, 3);
        assert_eq!(stats.requests_successful, 2);
        assert_eq!(stats.requests_failed, 0);
        assert_eq!(mock.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_response_counts_as_failed() {
        let mock = Arc::new(MockTransport::new());
        mock.push(Reply::Failure {
            message: "execution reverted".into(),
            mode: Some(TransportMode::Jito),
        });
        let client = client_with(mock);

        let response = client
            .execute(batch(vec![transfer("a", "b", 1)], "payer"))
            .await
            .unwrap();
        assert!(!response.is_success());

        let stats = client.get_stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.requests_failed, 1);
    }

    #[tokio::test]
    async fn test_transport_error_passes_through_classified() {
        let mock = Arc::new(MockTransport::new());
        mock.push(Reply::Error(EngineError::new(
            crate::ErrorKind::ResourceExhausted,
            "no free worker wallets",
            Some(TransportMode::Bloxroute),
        )));
        let client = client_with(mock);

        let err = client
            .execute(batch(vec![transfer("a", "b", 1)], "payer"))
            .await
            .unwrap_err();
        // Original classification wins; nothing is downgraded on the way out.
        assert_eq!(err.kind(), crate::ErrorKind::ResourceExhausted);
        assert_eq!(err.mode(), Some(TransportMode::Bloxroute));

        let stats = client.get_stats();
        assert_eq!(stats.requests_failed, 1);
    }

    #[tokio::test]
    async fn test_create_wallet_is_a_distinct_request_kind() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(mock.clone());

        client.create_wallet("owner-key").await.unwrap();

        let seen = mock.seen();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            seen[0].body,
            RequestBody::CreateWallet { ref owner } if owner == "owner-key"
        ));
        assert_eq!(client.get_stats().requests_sent, 1);
    }

    #[tokio::test]
    async fn test_ping_true_on_any_well_formed_response() {
        let mock = Arc::new(MockTransport::new());
        mock.push(Reply::Failure {
            message: "engine draining".into(),
            mode: None,
        });
        let client = client_with(mock);

        assert!(client.ping().await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_stats_replaces_snapshot() {
        let mock = Arc::new(MockTransport::new());
        let client = client_with(mock);

        client
            .execute(batch(vec![transfer("a", "b", 1)], "payer"))
            .await
            .unwrap();
        assert_eq!(client.get_stats().requests_sent, 1);

        client.reset_stats();
        let stats = client.get_stats();
        assert_eq!(stats.requests_sent, 0);
        assert_eq!(stats.requests_successful, 0);
        assert_eq!(stats.average_latency_ms, 0.0);
        assert!(stats.connected_since.is_some());
    }

    #[test]
    fn test_running_average_matches_arithmetic_mean() {
        let mut stats = StatsInner::fresh();
        for latency in [100.0, 200.0, 300.0] {
            stats.record_outcome(true, latency);
        }
        assert!((stats.average_latency_ms - 200.0).abs() < f64::EPSILON);

        // Mixed outcomes keep contributing samples.
        stats.record_outcome(false, 400.0);
        assert!((stats.average_latency_ms - 250.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_stats_mirror_transport_state() {
        let mock = Arc::new(MockTransport::new());
        mock.set_reconnect_attempts(3);
        let client = client_with(mock.clone());

        let stats = client.get_stats();
        assert!(!stats.connected);
        assert_eq!(stats.reconnect_attempts, 3);

        mock.connect().await.unwrap();
        assert!(client.get_stats().connected);
    }
}
