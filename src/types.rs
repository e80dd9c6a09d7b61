//! Data model and wire messages for the Tradewire SDK
//!
//! These types mirror the engine-side schema for batch submission and
//! responses. Requests and responses travel as single frames over the
//! request/reply channel; correlation is by `requestId`.

use serde::{Deserialize, Serialize};

/// Channel/policy selector controlling how the engine submits a batch.
///
/// `Simulation` and `Standard` are the two no-bribe modes: the first asks
/// the engine to simulate only, the second is a plain best-effort
/// submission. Every other mode is a bribed, MEV-aware broadcast through
/// the named channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    /// Dry-run only, nothing reaches the network
    Simulation,
    /// Plain submission through the engine's default path
    Standard,
    Jito,
    Bloxroute,
    Nextblock,
    Nozomi,
    Zeroslot,
}

impl TransportMode {
    /// Every legal mode, in a stable order.
    pub const ALL: [TransportMode; 7] = [
        TransportMode::Simulation,
        TransportMode::Standard,
        TransportMode::Jito,
        TransportMode::Bloxroute,
        TransportMode::Nextblock,
        TransportMode::Nozomi,
        TransportMode::Zeroslot,
    ];

    /// Wire-level name the engine expects.
    ///
    /// The client-facing variant name and the wire name differ where the
    /// engine kept an older identifier: `Standard` is still "normal" on
    /// the wire, `Nozomi` submits through the "temporal" channel and
    /// `Zeroslot` is spelled "0slot".
    pub fn wire_name(&self) -> &'static str {
        match self {
            TransportMode::Simulation => "simulation",
            TransportMode::Standard => "normal",
            TransportMode::Jito => "jito",
            TransportMode::Bloxroute => "bloxroute",
            TransportMode::Nextblock => "nextblock",
            TransportMode::Nozomi => "temporal",
            TransportMode::Zeroslot => "0slot",
        }
    }

    /// Parse a mode from either its wire name or its client-facing name.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "simulation" => Some(TransportMode::Simulation),
            "normal" | "standard" => Some(TransportMode::Standard),
            "jito" => Some(TransportMode::Jito),
            "bloxroute" => Some(TransportMode::Bloxroute),
            "nextblock" => Some(TransportMode::Nextblock),
            "temporal" | "nozomi" => Some(TransportMode::Nozomi),
            "0slot" | "zeroslot" => Some(TransportMode::Zeroslot),
            _ => None,
        }
    }

    /// Whether the engine expects a bribe for this mode.
    pub fn requires_bribe(&self) -> bool {
        !matches!(self, TransportMode::Simulation | TransportMode::Standard)
    }
}

impl Serialize for TransportMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for TransportMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TransportMode::from_wire_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown transport mode: {name}")))
    }
}

/// Parameters for a swap through a known pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    /// Pool account address (base58)
    pub pool: String,
    /// Mint being spent
    pub input_mint: String,
    /// Mint being received
    pub output_mint: String,
    /// Amount in, base units of the input mint
    pub amount_in: u64,
    /// Slippage floor, base units of the output mint
    pub min_amount_out: u64,
    /// Owner of the token accounts involved
    pub owner: String,
}

/// Parameters for a plain SOL transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub from: String,
    pub to: String,
    pub lamports: u64,
}

/// Parameters for an SPL token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferParams {
    pub from: String,
    pub to: String,
    pub mint: String,
    /// Amount in base units of the mint
    pub amount: u64,
}

/// An externally pre-built payload carried opaquely inside a batch.
///
/// The SDK never inspects the contents; whatever a DEX integration
/// produced is forwarded to the engine as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    /// Base64-encoded payload bytes
    pub payload: String,
}

impl RawPayload {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        use base64::Engine;
        Self {
            payload: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// One tagged unit of work inside a batch.
///
/// Operations are immutable once appended; the insertion order of a
/// batch is the execution order on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Buy(SwapParams),
    Sell(SwapParams),
    Transfer(TransferParams),
    TokenTransfer(TokenTransferParams),
    Raw(RawPayload),
}

impl Operation {
    /// Fixed action-kind/event-kind pair identifying this operation.
    ///
    /// The match is exhaustive on purpose: adding a variant without a
    /// wire descriptor must not compile.
    pub fn descriptor(&self) -> (&'static str, &'static str) {
        match self {
            Operation::Buy(_) => ("swap", "buy"),
            Operation::Sell(_) => ("swap", "sell"),
            Operation::Transfer(_) => ("transfer", "sol"),
            Operation::TokenTransfer(_) => ("transfer", "spl"),
            Operation::Raw(_) => ("raw", "prebuilt"),
        }
    }

    /// Structural check applied before a batch leaves the client.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Operation::Buy(p) | Operation::Sell(p) => {
                if p.pool.is_empty() || p.input_mint.is_empty() || p.output_mint.is_empty() {
                    return Err("swap operation is missing a pool or mint address".into());
                }
                if p.owner.is_empty() {
                    return Err("swap operation is missing the owner address".into());
                }
                if p.amount_in == 0 {
                    return Err("swap operation has a zero input amount".into());
                }
            }
            Operation::Transfer(p) => {
                if p.from.is_empty() || p.to.is_empty() {
                    return Err("transfer operation is missing an address".into());
                }
            }
            Operation::TokenTransfer(p) => {
                if p.from.is_empty() || p.to.is_empty() || p.mint.is_empty() {
                    return Err("token transfer operation is missing an address or mint".into());
                }
            }
            Operation::Raw(p) => {
                if p.payload.is_empty() {
                    return Err("raw operation carries an empty payload".into());
                }
            }
        }
        Ok(())
    }
}

/// Shared, non-operation-specific settings attached to a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionParams {
    /// Account paying fees for the whole batch (base58)
    pub fee_payer: String,
    /// Priority fee in micro-lamports per compute unit
    pub priority_fee: u64,
    /// Bribe in lamports, expected by the bribed transport modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bribe: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TransportMode>,
}

/// An ordered, non-empty group of operations submitted as a single
/// atomic unit, plus its execution parameters.
///
/// Atomicity is the engine's guarantee; this layer's contract is
/// narrower: operations are never dropped or reordered on the way there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub operations: Vec<Operation>,
    #[serde(flatten)]
    pub params: ExecutionParams,
}

/// Request payload variants understood by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    /// Execute (or simulate) a batch
    Execute(BatchRequest),
    /// Provision a custody wallet for the given owner
    CreateWallet { owner: String },
    /// Liveness probe
    Ping,
}

/// Wire envelope for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    /// Correlation id echoed back by the engine
    pub request_id: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl EngineRequest {
    /// Wrap a body in a fresh envelope with a v4 request id.
    pub fn new(body: RequestBody) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            body,
        }
    }

    /// Transport mode carried by the request, when it has one.
    pub fn mode(&self) -> Option<TransportMode> {
        match &self.body {
            RequestBody::Execute(batch) => batch.params.mode,
            RequestBody::CreateWallet { .. } | RequestBody::Ping => None,
        }
    }
}

/// Outcome reported by the engine for one request.
///
/// `Success` means the engine accepted the request - not that the effects
/// are final on-chain. `signature` carries the batch signature for
/// executions and the provisioned address for wallet requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success {
        signature: String,
        #[serde(default)]
        logs: Vec<String>,
        /// Number of operations the engine recorded for the batch
        #[serde(rename = "operationCount", default)]
        operation_count: Option<u32>,
    },
    Failure {
        message: String,
        /// Transport mode the engine was using when it failed
        #[serde(default)]
        mode: Option<TransportMode>,
    },
}

/// Wire envelope for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub request_id: String,
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,
}

impl EngineResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Success { .. })
    }

    /// Signature/identifier on success, `None` on failure.
    pub fn signature(&self) -> Option<&str> {
        match &self.outcome {
            ExecutionOutcome::Success { signature, .. } => Some(signature),
            ExecutionOutcome::Failure { .. } => None,
        }
    }
}

/// Connection state machine states, owned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Read-only snapshot of client statistics.
///
/// Counters are tracked by the client; `connected` and
/// `reconnect_attempts` are pulled live from the transport at snapshot
/// time so they never go stale.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub requests_sent: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    /// Running mean response time in milliseconds
    pub average_latency_ms: f64,
    pub connected: bool,
    /// Unix millis of the last stats reset (or client construction)
    pub connected_since: Option<u64>,
    pub reconnect_attempts: u32,
}
