//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::connection::Transport;
use crate::error::{EngineError, Result};
use crate::types::{EngineRequest, EngineResponse, ExecutionOutcome, TransportMode};

/// One scripted transport reply.
pub(crate) enum Reply {
    Success {
        signature: String,
        operation_count: Option<u32>,
    },
    Failure {
        message: String,
        mode: Option<TransportMode>,
    },
    Error(EngineError),
}

/// Scripted in-memory transport. Replies are consumed in order; with the
/// script empty every request succeeds with a fixed signature.
pub(crate) struct MockTransport {
    connected: AtomicBool,
    reconnect_attempts: AtomicU32,
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<EngineRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            reconnect_attempts: AtomicU32::new(0),
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Requests the transport has seen, in arrival order.
    pub(crate) fn seen(&self) -> Vec<EngineRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn set_reconnect_attempts(&self, attempts: u32) {
        self.reconnect_attempts.store(attempts, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn request(&self, request: EngineRequest) -> Result<EngineResponse> {
        self.seen.lock().unwrap().push(request.clone());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            None => Ok(EngineResponse {
                request_id: request.request_id,
                outcome: ExecutionOutcome::Success {
                    signature: "mock-signature".into(),
                    logs: Vec::new(),
                    operation_count: None,
                },
            }),
            Some(Reply::Success {
                signature,
                operation_count,
            }) => Ok(EngineResponse {
                request_id: request.request_id,
                outcome: ExecutionOutcome::Success {
                    signature,
                    logs: Vec::new(),
                    operation_count,
                },
            }),
            Some(Reply::Failure { message, mode }) => Ok(EngineResponse {
                request_id: request.request_id,
                outcome: ExecutionOutcome::Failure { message, mode },
            }),
            Some(Reply::Error(e)) => Err(e),
        }
    }

    fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    fn reset_reconnect_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::SeqCst);
    }
}
