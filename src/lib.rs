//! tradewire - Rust SDK for the Tradewire execution engine
//!
//! The SDK composes trading operations (swaps, transfers, pre-built
//! payloads) into atomic batches and ships them to a remote execution
//! engine over a persistent request/reply channel.
//!
//! # Quick Start
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
//!     // Dry-run a two-operation batch before paying for it.
//!     let simulated = client
//!         .batch()
//!         .add_transfer("payer...", "alice...", 1_000_000)
//!         .add_transfer("alice...", "bob...", 500_000)
//!         .fee_payer("payer...")
//!         .simulate()
//!         .await?;
//!     println!("simulation ok: {}", simulated.is_success());
//!
//!     // Submit for real through a bribed channel.
//!     let response = client
//!         .batch()
//!         .add_transfer("payer...", "alice...", 1_000_000)
//!         .fee_payer("payer...")
//!         .priority_fee(10_000)
//!         .bribe(100_000)
//!         .transport_mode(TransportMode::Jito)
//!         .send()
//!         .await?;
//!     println!("signature: {:?}", response.signature());
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod types;

#[cfg(test)]
mod test_util;

pub use builder::BatchBuilder;
pub use client::TradewireClient;
pub use config::{Config, ConfigBuilder};
pub use connection::{Codec, JsonCodec, Transport, WebSocketTransport};
pub use error::{EngineError, ErrorKind, Result};
pub use types::{
    BatchRequest, ClientStats, ConnectionState, EngineRequest, EngineResponse, ExecutionOutcome,
    ExecutionParams, Operation, RawPayload, RequestBody, SwapParams, TokenTransferParams,
    TransferParams, TransportMode,
};
