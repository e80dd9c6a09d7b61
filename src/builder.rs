//! Chainable batch builder
//!
//! Accumulates an ordered sequence of operations plus the shared execution
//! parameters, then submits everything as one atomic unit. Appenders keep
//! insertion order and never deduplicate; parameter setters are
//! last-write-wins.

use tracing::warn;

use crate::client::TradewireClient;
use crate::error::Result;
use crate::types::{
    BatchRequest, EngineResponse, ExecutionParams, Operation, RawPayload, SwapParams,
    TokenTransferParams, TransferParams, TransportMode,
};

/// Mutable accumulator for one batch. Created via
/// [`TradewireClient::batch`].
pub struct BatchBuilder<'a> {
    client: &'a TradewireClient,
    operations: Vec<Operation>,
    fee_payer: Option<String>,
    priority_fee: u64,
    bribe: Option<u64>,
    mode: Option<TransportMode>,
}

impl<'a> BatchBuilder<'a> {
    pub(crate) fn new(client: &'a TradewireClient) -> Self {
        Self {
            client,
            operations: Vec::new(),
            fee_payer: None,
            priority_fee: 0,
            bribe: None,
            mode: None,
        }
    }

    /// Append a buy-side swap
    pub fn add_buy(mut self, params: SwapParams) -> Self {
        self.operations.push(Operation::Buy(params));
        self
    }

    /// Append a sell-side swap
    pub fn add_sell(mut self, params: SwapParams) -> Self {
        self.operations.push(Operation::Sell(params));
        self
    }

    /// Append a SOL transfer
    pub fn add_transfer(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        lamports: u64,
    ) -> Self {
        self.operations.push(Operation::Transfer(TransferParams {
            from: from.into(),
            to: to.into(),
            lamports,
        }));
        self
    }

    /// Append an SPL token transfer
    pub fn add_token_transfer(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        mint: impl Into<String>,
        amount: u64,
    ) -> Self {
        self.operations
            .push(Operation::TokenTransfer(TokenTransferParams {
                from: from.into(),
                to: to.into(),
                mint: mint.into(),
                amount,
            }));
        self
    }

    /// Append an externally pre-built payload (e.g. a swap instruction
    /// produced by a DEX SDK). The bytes travel opaquely inside the same
    /// ordered, atomic batch as every other operation.
    pub fn add_raw(mut self, payload: &[u8]) -> Self {
        self.operations
            .push(Operation::Raw(RawPayload::from_bytes(payload)));
        self
    }

    /// Append an already-constructed operation
    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Set the fee payer for the whole batch
    pub fn fee_payer(mut self, address: impl Into<String>) -> Self {
        self.fee_payer = Some(address.into());
        self
    }

    /// Set the priority fee in micro-lamports per compute unit
    pub fn priority_fee(mut self, fee: u64) -> Self {
        self.priority_fee = fee;
        self
    }

    /// Set the bribe in lamports
    pub fn bribe(mut self, lamports: u64) -> Self {
        self.bribe = Some(lamports);
        self
    }

    /// Set the transport mode
    pub fn transport_mode(mut self, mode: TransportMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Number of operations accumulated so far
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Dry-run the batch: finalize with the mode forced to
    /// [`TransportMode::Simulation`] (nothing reaches the network, no
    /// bribe required) and submit.
    pub async fn simulate(self) -> Result<EngineResponse> {
        let client = self.client;
        client
            .execute(self.into_request(Some(TransportMode::Simulation)))
            .await
    }

    /// Submit the batch with the configured transport mode and bribe.
    ///
    /// A bribed mode without a bribe is not blocked here - channel policy
    /// lives on the engine and may change without an SDK release - but it
    /// is worth a warning before the engine rejects it.
    pub async fn send(self) -> Result<EngineResponse> {
        let client = self.client;
        client.execute(self.into_request(None)).await
    }

    /// Finalize into a request, optionally overriding the transport mode.
    fn into_request(self, mode_override: Option<TransportMode>) -> BatchRequest {
        let mode = mode_override.or(self.mode);

        if let Some(mode) = mode {
            if mode.requires_bribe() && self.bribe.is_none() {
                warn!(
                    mode = mode.wire_name(),
                    "transport mode expects a bribe but none was set"
                );
            }
        }

        BatchRequest {
            operations: self.operations,
            params: ExecutionParams {
                fee_payer: self.fee_payer.unwrap_or_default(),
                priority_fee: self.priority_fee,
                bribe: self.bribe,
                mode,
            },
        }
    }
}
