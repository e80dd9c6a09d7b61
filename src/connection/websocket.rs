//! WebSocket engine channel using tokio-tungstenite
//!
//! One logical connection, strict request/reply: a request is written as a
//! single frame and exactly one correlated response frame is awaited before
//! the channel is used again. A timed-out exchange leaves an unresolved
//! response on the channel, so the socket is dropped and re-established
//! rather than reused.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::{Codec, JsonCodec, Transport};
use crate::config::Config;
use crate::error::{EngineError, ErrorKind, Result};
use crate::types::{ConnectionState, EngineRequest, EngineResponse, TransportMode};

type WsConn = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STATE_DISCONNECTED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_CONNECTED: u8 = 2;

/// Outcome shared with callers coalesced onto an in-flight connect.
/// Carries only the message; the kind is always `Connection`.
type DialOutcome = std::result::Result<(), String>;

/// WebSocket transport implementation
pub struct WebSocketTransport {
    inner: Arc<Inner>,
}

struct Inner {
    /// Self-reference so failure paths can hand the reconnect task an
    /// owned handle.
    weak: Weak<Inner>,
    config: Config,
    codec: Box<dyn Codec>,
    state: AtomicU8,
    /// The socket, locked for the whole request/reply exchange so two
    /// requests can never interleave on the wire.
    socket: tokio::sync::Mutex<Option<WsConn>>,
    /// Present while a dial is in flight; late callers subscribe instead
    /// of dialing again.
    connecting: tokio::sync::Mutex<Option<watch::Receiver<Option<DialOutcome>>>>,
    reconnect_attempts: AtomicU32,
    reconnect_exhausted: AtomicBool,
    reconnect_task: std::sync::Mutex<Option<JoinHandle<()>>>,
    connected_at: std::sync::Mutex<Option<Instant>>,
}

impl WebSocketTransport {
    /// Create a transport with the default JSON codec
    pub fn new(config: Config) -> Self {
        Self::with_codec(config, Box::new(JsonCodec))
    }

    /// Create a transport with a custom wire codec
    pub fn with_codec(config: Config, codec: Box<dyn Codec>) -> Self {
        Self {
            inner: Arc::new_cyclic(|weak| Inner {
                weak: weak.clone(),
                config,
                codec,
                state: AtomicU8::new(STATE_DISCONNECTED),
                socket: tokio::sync::Mutex::new(None),
                connecting: tokio::sync::Mutex::new(None),
                reconnect_attempts: AtomicU32::new(0),
                reconnect_exhausted: AtomicBool::new(false),
                reconnect_task: std::sync::Mutex::new(None),
                connected_at: std::sync::Mutex::new(None),
            }),
        }
    }
}

impl Inner {
    fn state(&self) -> ConnectionState {
        match self.state.load(Ordering::SeqCst) {
            STATE_CONNECTING => ConnectionState::Connecting,
            STATE_CONNECTED => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let raw = match state {
            ConnectionState::Disconnected => STATE_DISCONNECTED,
            ConnectionState::Connecting => STATE_CONNECTING,
            ConnectionState::Connected => STATE_CONNECTED,
        };
        self.state.store(raw, Ordering::SeqCst);
    }

    /// Establish the connection, coalescing concurrent callers onto a
    /// single underlying dial.
    async fn connect(&self) -> Result<()> {
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }

        let mut slot = self.connecting.lock().await;
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }

        if let Some(rx) = slot.as_ref() {
            // Someone is already dialing; wait for their outcome.
            let mut rx = rx.clone();
            drop(slot);
            loop {
                if let Some(outcome) = rx.borrow_and_update().clone() {
                    return outcome.map_err(EngineError::connection);
                }
                if rx.changed().await.is_err() {
                    return Err(EngineError::connection("connection attempt was abandoned"));
                }
            }
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx);
        drop(slot);

        self.set_state(ConnectionState::Connecting);
        let result = self.dial().await;

        *self.connecting.lock().await = None;
        match &result {
            Ok(()) => {
                let _ = tx.send(Some(Ok(())));
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                let _ = tx.send(Some(Err(e.message().to_string())));
            }
        }
        result
    }

    /// One underlying connect call.
    async fn dial(&self) -> Result<()> {
        let url = self.config.ws_endpoint();
        debug!(endpoint = %url, "connecting to engine");

        let (ws, _) = tokio::time::timeout(self.config.connect_timeout, connect_async(&url))
            .await
            .map_err(|_| {
                EngineError::connection(format!(
                    "connect to {url} timed out after {:?}",
                    self.config.connect_timeout
                ))
            })?
            .map_err(|e| {
                EngineError::connection(format!("failed to connect to {url}: {e}")).with_source(e)
            })?;

        *self.socket.lock().await = Some(ws);
        *self.connected_at.lock().unwrap() = Some(Instant::now());
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.reconnect_exhausted.store(false, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);

        info!(endpoint = %url, "engine channel established");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(handle) = self.reconnect_task.lock().unwrap().take() {
            handle.abort();
        }

        let mut socket = self.socket.lock().await;
        if let Some(mut ws) = socket.take() {
            if let Err(e) = ws.close(None).await {
                warn!(error = %e, "error closing engine channel");
            }
        }
        self.set_state(ConnectionState::Disconnected);

        if let Some(since) = self.connected_at.lock().unwrap().take() {
            debug!(
                uptime_ms = since.elapsed().as_millis() as u64,
                "engine channel disconnected"
            );
        }
        Ok(())
    }

    async fn request(&self, request: EngineRequest) -> Result<EngineResponse> {
        let mode = request.mode();

        if self.reconnect_exhausted.load(Ordering::SeqCst) {
            return Err(EngineError::connection(format!(
                "gave up after {} reconnect attempts; call connect() to re-establish",
                self.config.max_reconnect_attempts
            )));
        }

        if self.state() != ConnectionState::Connected {
            if self.config.auto_reconnect {
                self.connect().await?;
            } else {
                return Err(EngineError::connection("not connected"));
            }
        }

        let bytes = self.codec.encode(&request)?;
        if self.config.verbose {
            debug!(
                request_id = %request.request_id,
                payload = %String::from_utf8_lossy(&bytes),
                "outgoing frame"
            );
        }

        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.request_timeout;

        let mut socket = self.socket.lock().await;
        let ws = match socket.as_mut() {
            Some(ws) => ws,
            None => return Err(EngineError::connection("not connected")),
        };

        debug!(
            request_id = %request.request_id,
            bytes_out = bytes.len(),
            "sending request"
        );

        match tokio::time::timeout_at(deadline, ws.send(Message::Binary(bytes))).await {
            Err(_) => return Err(self.fail_timeout(&mut socket, &request.request_id, mode)),
            Ok(Err(e)) => {
                return Err(self.fail_channel(
                    &mut socket,
                    format!("failed to send request: {e}"),
                    mode,
                ))
            }
            Ok(Ok(())) => {}
        }

        // Await the one response correlated to this request. Frames with
        // a different id belong to an exchange abandoned by timeout and
        // are skipped.
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(self.fail_timeout(&mut socket, &request.request_id, mode));
            }

            let ws = match socket.as_mut() {
                Some(ws) => ws,
                None => return Err(EngineError::connection("not connected")),
            };

            let frame = match tokio::time::timeout(remaining, ws.next()).await {
                Err(_) => return Err(self.fail_timeout(&mut socket, &request.request_id, mode)),
                Ok(None) => {
                    return Err(self.fail_channel(
                        &mut socket,
                        "connection closed by engine".to_string(),
                        mode,
                    ))
                }
                Ok(Some(Err(e))) => {
                    return Err(self.fail_channel(
                        &mut socket,
                        format!("failed to receive response: {e}"),
                        mode,
                    ))
                }
                Ok(Some(Ok(frame))) => frame,
            };

            let payload = match frame {
                Message::Binary(data) => data,
                Message::Text(text) => text.into_bytes(),
                Message::Ping(data) => {
                    if let Some(ws) = socket.as_mut() {
                        let _ = ws.send(Message::Pong(data)).await;
                    }
                    continue;
                }
                Message::Close(_) => {
                    return Err(self.fail_channel(
                        &mut socket,
                        "connection closed by engine".to_string(),
                        mode,
                    ))
                }
                _ => continue,
            };

            if self.config.verbose {
                debug!(payload = %String::from_utf8_lossy(&payload), "incoming frame");
            }

            let response = self.codec.decode(&payload)?;
            if response.request_id != request.request_id {
                debug!(
                    expected = %request.request_id,
                    received = %response.request_id,
                    "skipping response for an abandoned request"
                );
                continue;
            }

            debug!(
                request_id = %request.request_id,
                bytes_in = payload.len(),
                latency_ms = started.elapsed().as_millis() as u64,
                success = response.is_success(),
                "response received"
            );
            return Ok(response);
        }
    }

    /// Tear down after a timed-out exchange; the request/reply channel
    /// cannot be reused with a response still outstanding.
    fn fail_timeout(
        &self,
        socket: &mut Option<WsConn>,
        request_id: &str,
        mode: Option<TransportMode>,
    ) -> EngineError {
        *socket = None;
        self.set_state(ConnectionState::Disconnected);
        warn!(
            request_id = %request_id,
            timeout_ms = self.config.request_timeout.as_millis() as u64,
            "request timed out, dropping channel"
        );
        if self.config.auto_reconnect {
            self.spawn_reconnect();
        }
        EngineError::timeout(
            format!("no response within {:?}", self.config.request_timeout),
            mode,
        )
    }

    /// Classify a send/receive failure; network-classified failures tear
    /// the channel down and trigger a background reconnect.
    fn fail_channel(
        &self,
        socket: &mut Option<WsConn>,
        message: String,
        mode: Option<TransportMode>,
    ) -> EngineError {
        let err = EngineError::classify_message(&message, mode);
        if err.kind() == ErrorKind::Network {
            *socket = None;
            self.set_state(ConnectionState::Disconnected);
            warn!(error = %err, "engine channel failed");
            if self.config.auto_reconnect {
                self.spawn_reconnect();
            }
        }
        err
    }

    /// Schedule the bounded background reconnect loop. At most one loop
    /// runs at a time.
    fn spawn_reconnect(&self) {
        let Some(inner) = self.weak.upgrade() else {
            return;
        };

        let mut guard = self.reconnect_task.lock().unwrap();
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }

        *guard = Some(tokio::spawn(async move {
            loop {
                let attempts = inner.reconnect_attempts.load(Ordering::SeqCst);
                if attempts >= inner.config.max_reconnect_attempts {
                    inner.reconnect_exhausted.store(true, Ordering::SeqCst);
                    error!(attempts, "giving up on automatic reconnection");
                    break;
                }

                tokio::time::sleep(inner.config.reconnect_delay).await;

                let attempt = inner.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(
                    attempt,
                    max = inner.config.max_reconnect_attempts,
                    "attempting reconnect"
                );

                match inner.connect().await {
                    Ok(()) => {
                        info!(attempt, "reconnected to engine");
                        break;
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "reconnect attempt failed");
                    }
                }
            }
        }));
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.inner.state() == ConnectionState::Connected
    }

    async fn request(&self, request: EngineRequest) -> Result<EngineResponse> {
        self.inner.request(request).await
    }

    fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::SeqCst)
    }

    fn reset_reconnect_attempts(&self) {
        self.inner.reconnect_attempts.store(0, Ordering::SeqCst);
        self.inner.reconnect_exhausted.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestBody;
    use std::time::Duration;

    fn test_config(auto_reconnect: bool) -> Config {
        Config::builder()
            .endpoint("ws://127.0.0.1:1") // nothing listens here
            .connect_timeout(Duration::from_millis(200))
            .request_timeout(Duration::from_millis(200))
            .auto_reconnect(auto_reconnect)
            .max_reconnect_attempts(2)
            .reconnect_delay(Duration::from_millis(10))
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_transport_is_disconnected() {
        let transport = WebSocketTransport::new(test_config(true));
        assert!(!transport.is_connected());
        assert_eq!(transport.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_request_without_connection_and_no_auto_reconnect() {
        let transport = WebSocketTransport::new(test_config(false));
        let err = transport
            .request(EngineRequest::new(RequestBody::Ping))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_connection_error() {
        let transport = WebSocketTransport::new(test_config(true));
        let err = transport.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let transport = WebSocketTransport::new(test_config(true));
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_exhausted_transport_fails_terminally_until_reset() {
        let transport = WebSocketTransport::new(test_config(true));
        transport
            .inner
            .reconnect_attempts
            .store(2, Ordering::SeqCst);
        transport
            .inner
            .reconnect_exhausted
            .store(true, Ordering::SeqCst);

        let err = transport
            .request(EngineRequest::new(RequestBody::Ping))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.message().contains("gave up"));

        transport.reset_reconnect_attempts();
        assert_eq!(transport.reconnect_attempts(), 0);
        // After the reset the transport dials again and fails against the
        // dead endpoint with a plain connection error, not the terminal one.
        let err = transport
            .request(EngineRequest::new(RequestBody::Ping))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!err.message().contains("gave up"));
    }
}
