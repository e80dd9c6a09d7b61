//! Error types for the Tradewire SDK

use std::fmt;

use thiserror::Error;

use crate::types::TransportMode;

/// Closed set of failure categories surfaced by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Send/receive failure on the engine channel
    Network,
    /// No response arrived within the configured deadline
    Timeout,
    /// Request rejected before reaching the transport
    InvalidRequest,
    /// The engine accepted the request but execution failed
    ExecutionFailed,
    /// A pooled resource on the engine side was exhausted
    ResourceExhausted,
    /// A referenced account, pool or wallet does not exist
    ResourceNotFound,
    /// Encoding or decoding a wire message failed
    Serialization,
    /// The channel to the engine could not be established or was lost
    Connection,
    /// Anything that could not be categorized
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::ExecutionFailed => "execution_failed",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::ResourceNotFound => "resource_not_found",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Connection => "connection",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// SDK error carrying the failure category and the transport mode that
/// was in effect when the failure occurred.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    kind: ErrorKind,
    message: String,
    mode: Option<TransportMode>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EngineError {
    /// Create an error with an explicit kind and transport-mode tag.
    pub fn new(kind: ErrorKind, message: impl Into<String>, mode: Option<TransportMode>) -> Self {
        Self {
            kind,
            message: message.into(),
            mode,
            source: None,
        }
    }

    /// Attach the lower-level failure that caused this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a connection error (no mode in effect yet)
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message, None)
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>, mode: Option<TransportMode>) -> Self {
        Self::new(ErrorKind::Timeout, message, mode)
    }

    /// Create a network error
    pub fn network(message: impl Into<String>, mode: Option<TransportMode>) -> Self {
        Self::new(ErrorKind::Network, message, mode)
    }

    /// Create a validation error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message, None)
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message, None)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Transport mode that was in effect when the failure occurred, if any.
    pub fn mode(&self) -> Option<TransportMode> {
        self.mode
    }

    /// Whether the caller is expected to retry the request.
    ///
    /// Only transient categories qualify; everything else requires caller
    /// intervention (fixing the request, reconnecting, funding a wallet).
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Timeout)
    }

    /// Stable, user-facing rendering of the failure.
    ///
    /// The raw message is echoed only for `ExecutionFailed` and `Unknown`
    /// so engine-side diagnostic detail is not lost.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Network error - check your connection and try again".to_string()
            }
            ErrorKind::Timeout => {
                "Request timed out - the engine may be busy, try again shortly".to_string()
            }
            ErrorKind::InvalidRequest => {
                "Invalid request - check the batch parameters".to_string()
            }
            ErrorKind::ExecutionFailed => format!("Execution failed: {}", self.message),
            ErrorKind::ResourceExhausted => {
                "Engine resources exhausted - try again later".to_string()
            }
            ErrorKind::ResourceNotFound => "Requested resource was not found".to_string(),
            ErrorKind::Serialization => {
                "Failed to encode or decode an engine message".to_string()
            }
            ErrorKind::Connection => {
                "Not connected to the engine - check the endpoint and connection settings"
                    .to_string()
            }
            ErrorKind::Unknown => format!("Unexpected error: {}", self.message),
        }
    }

    /// Classify an arbitrary failure into the taxonomy.
    ///
    /// An `EngineError` passes through untouched - its original kind and
    /// mode tag win and `mode_hint` is ignored. Anything else is matched
    /// by message text via [`EngineError::classify_message`].
    pub fn classify(
        err: Box<dyn std::error::Error + Send + Sync>,
        mode_hint: Option<TransportMode>,
    ) -> EngineError {
        match err.downcast::<EngineError>() {
            Ok(already) => *already,
            Err(other) => {
                Self::classify_message(&other.to_string(), mode_hint).with_source(WrappedError(other))
            }
        }
    }

    /// Classify a failure by its message text.
    ///
    /// The marker sets are checked in strict priority order: timeout
    /// markers first, then network markers, then validation markers. A
    /// message matching several sets takes the first match, so
    /// "network timeout" classifies as `Timeout`. Callers depend on this
    /// ordering; do not re-derive it.
    pub fn classify_message(message: &str, mode_hint: Option<TransportMode>) -> EngineError {
        let lower = message.to_lowercase();

        const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out"];
        const NETWORK_MARKERS: &[&str] = &[
            "network",
            "econnrefused",
            "connection refused",
            "connection reset",
            "broken pipe",
            "name or service not known",
            "failed to lookup address",
            "connection",
        ];
        const INVALID_MARKERS: &[&str] = &["invalid", "validation"];

        let kind = if TIMEOUT_MARKERS.iter().any(|m| lower.contains(m)) {
            ErrorKind::Timeout
        } else if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
            ErrorKind::Network
        } else if INVALID_MARKERS.iter().any(|m| lower.contains(m)) {
            ErrorKind::InvalidRequest
        } else {
            ErrorKind::Unknown
        };

        EngineError::new(kind, message, mode_hint)
    }
}

/// Adapter so a foreign boxed error can sit in the `#[source]` chain.
#[derive(Debug)]
struct WrappedError(Box<dyn std::error::Error + Send + Sync>);

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for WrappedError {}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(msg: &str) -> Box<dyn std::error::Error + Send + Sync> {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, msg.to_string()))
    }

    #[test]
    fn test_retryable_kinds() {
        let all = [
            ErrorKind::Network,
            ErrorKind::Timeout,
            ErrorKind::InvalidRequest,
            ErrorKind::ExecutionFailed,
            ErrorKind::ResourceExhausted,
            ErrorKind::ResourceNotFound,
            ErrorKind::Serialization,
            ErrorKind::Connection,
            ErrorKind::Unknown,
        ];
        for kind in all {
            let err = EngineError::new(kind, "x", None);
            let expected = matches!(kind, ErrorKind::Network | ErrorKind::Timeout);
            assert_eq!(err.is_retryable(), expected, "kind {kind}");
        }
    }

    #[test]
    fn test_classify_priority_timeout_beats_network() {
        let err = EngineError::classify(boxed("network request timed out"), None);
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_priority_network_beats_invalid() {
        let err = EngineError::classify(boxed("network path returned invalid frame"), None);
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_classify_os_level_markers() {
        for msg in [
            "ECONNREFUSED while dialing",
            "connection reset by peer",
            "failed to lookup address information",
        ] {
            let err = EngineError::classify(boxed(msg), None);
            assert_eq!(err.kind(), ErrorKind::Network, "message: {msg}");
        }
    }

    #[test]
    fn test_classify_validation_and_fallback() {
        assert_eq!(
            EngineError::classify(boxed("validation rejected fee payer"), None).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            EngineError::classify(boxed("something unexpected"), None).kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_classify_is_idempotent_on_engine_errors() {
        // A message full of network markers must not re-classify.
        let original = EngineError::new(
            ErrorKind::ExecutionFailed,
            "network connection dropped mid-execution",
            Some(TransportMode::Jito),
        );
        let reclassified =
            EngineError::classify(Box::new(original), Some(TransportMode::Simulation));
        assert_eq!(reclassified.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(reclassified.mode(), Some(TransportMode::Jito));
    }

    #[test]
    fn test_user_message_echoes_detail_where_required() {
        let exec = EngineError::new(ErrorKind::ExecutionFailed, "slippage exceeded", None);
        assert!(exec.user_message().contains("slippage exceeded"));

        let unknown = EngineError::new(ErrorKind::Unknown, "odd frame 0x7f", None);
        assert!(unknown.user_message().contains("odd frame 0x7f"));

        let net = EngineError::new(ErrorKind::Network, "ECONNREFUSED 1.2.3.4:5555", None);
        assert!(!net.user_message().contains("ECONNREFUSED"));
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = EngineError::new(ErrorKind::Connection, "not connected", None);
        assert_eq!(err.to_string(), "connection: not connected");
    }
}
