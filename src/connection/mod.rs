//! Connection management for the engine channel
//!
//! This module provides the transport abstraction, the wire codec seam,
//! and the WebSocket implementation used by default.

pub mod websocket;

use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::types::{EngineRequest, EngineResponse};

pub use websocket::WebSocketTransport;

/// Wire codec seam.
///
/// The transport never touches serde directly; it hands the envelope to a
/// codec and ships bytes. Swapping the codec changes the wire format
/// without touching the transport's contract. Failures in either
/// direction are serialization errors, never network errors.
pub trait Codec: Send + Sync {
    fn encode(&self, request: &EngineRequest) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<EngineResponse>;
}

/// Default JSON codec
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, request: &EngineRequest) -> Result<Vec<u8>> {
        serde_json::to_vec(request)
            .map_err(|e| EngineError::serialization(format!("failed to encode request: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<EngineResponse> {
        serde_json::from_slice(bytes)
            .map_err(|e| EngineError::serialization(format!("failed to decode response: {e}")))
    }
}

/// Transport abstraction over one logical connection to the engine.
///
/// A transport owns its connection state exclusively; callers observe it
/// only through `is_connected()`. At most one request is in flight at a
/// time - implementations serialize concurrent callers so two requests
/// can never interleave on the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the connection. No-op when already connected; concurrent
    /// callers coalesce onto a single in-flight attempt.
    async fn connect(&self) -> Result<()>;

    /// Tear down the connection. Idempotent; close failures are logged,
    /// not propagated.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the connection is currently established
    fn is_connected(&self) -> bool;

    /// Send one request and await its correlated response.
    async fn request(&self, request: EngineRequest) -> Result<EngineResponse>;

    /// Reconnect attempts since the last successful connect
    fn reconnect_attempts(&self) -> u32;

    /// Reset the reconnect accounting, re-arming a transport that gave up.
    fn reset_reconnect_attempts(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestBody, TransportMode};

    #[test]
    fn test_json_codec_round_trip_envelope() {
        let codec = JsonCodec;
        let request = EngineRequest::new(RequestBody::CreateWallet {
            owner: "owner-pubkey".into(),
        });

        let bytes = codec.encode(&request).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"type\":\"create_wallet\""));
        assert!(text.contains(&request.request_id));
    }

    #[test]
    fn test_json_codec_decode_failure_is_serialization() {
        let codec = JsonCodec;
        let err = codec.decode(b"not json at all").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Serialization);
        // A decode failure must not look retryable to the caller.
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_json_codec_decode_response() {
        let codec = JsonCodec;
        let response = codec
            .decode(br#"{"requestId":"r1","status":"failure","message":"pool drained","mode":"jito"}"#)
            .unwrap();
        assert!(!response.is_success());
        match response.outcome {
            crate::types::ExecutionOutcome::Failure { mode, .. } => {
                assert_eq!(mode, Some(TransportMode::Jito));
            }
            _ => panic!("wrong outcome"),
        }
    }
}
