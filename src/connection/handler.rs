// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use crate::core::DispatchError;
use crate::core::protocol::{DISCONNECT_SENTINEL, MAX_MESSAGE_BYTES, REPLY_PREFIX};
use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// The next step for the connection's main loop to take.
enum NextAction {
    Continue,
    Disconnect,
}

/// Manages the full lifecycle of a client connection.
///
/// The connection is `Connected` for as long as this handler's loop runs,
/// `Closing` once a sentinel, EOF, or error breaks the loop, and `Closed`
/// when the handler returns: the guard removes the registry entry and the
/// socket is dropped. No connection object is ever reused.
pub struct ConnectionHandler {
    socket: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            socket,
            addr,
            state,
            session_id,
            shutdown_rx,
        }
    }

    /// The main event loop for the connection: exactly one receive of up to
    /// [`MAX_MESSAGE_BYTES`] per readiness event, then a protocol branch.
    ///
    /// Every failure here is isolated to this connection. A malformed
    /// payload, a failed write, or a read error closes this client and
    /// leaves all other sessions untouched.
    pub async fn run(mut self) -> Result<(), DispatchError> {
        let _guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);
        let mut buf = [0u8; MAX_MESSAGE_BYTES];
        loop {
            tokio::select! {
                // Prioritize shutdown over pending client traffic.
                biased;
                _ = self.shutdown_rx.recv() => {
                    debug!("Connection handler for {} received shutdown signal.", self.addr);
                    break;
                }
                result = self.socket.read(&mut buf) => {
                    match result {
                        Ok(0) => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break;
                        }
                        Ok(n) => match self.process_payload(&buf[..n]).await {
                            Ok(NextAction::Continue) => self.update_last_message_time().await,
                            Ok(NextAction::Disconnect) => break,
                            Err(e) => {
                                if e.is_normal_disconnect() {
                                    debug!("Connection from {} closed by peer: {}", self.addr, e);
                                } else {
                                    warn!("Closing connection from {}: {}", self.addr, e);
                                }
                                break;
                            }
                        },
                        Err(e) => {
                            let e = DispatchError::from(e);
                            if e.is_normal_disconnect() {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Decodes one payload and applies the protocol rules: sentinel
    /// detection, or forward-to-processor followed by a prefixed reply.
    async fn process_payload(&mut self, payload: &[u8]) -> Result<NextAction, DispatchError> {
        let text = std::str::from_utf8(payload)?;

        // The sentinel requests termination and gets no reply.
        if text == DISCONNECT_SENTINEL {
            info!("Client {} requested disconnect.", self.addr);
            return Ok(NextAction::Disconnect);
        }

        debug!(
            "Session {}: dispatching payload ({} bytes).",
            self.session_id,
            payload.len()
        );

        // Hold the processor lock across the peel/execute pair so requests
        // from different clients never interleave inside the collaborator.
        let result = {
            let mut processor = self.state.processor.lock().await;
            processor.peel(text);
            processor.execute()
        };

        let mut reply = String::with_capacity(REPLY_PREFIX.len() + result.len());
        reply.push_str(REPLY_PREFIX);
        reply.push_str(&result);
        self.socket.write_all(reply.as_bytes()).await?;
        self.state.stats.increment_total_messages();
        Ok(NextAction::Continue)
    }

    /// Updates the client's last activity time for introspection.
    async fn update_last_message_time(&self) {
        if let Some(info) = self.state.clients.get(self.session_id) {
            info.lock().await.last_message_time = Instant::now();
        }
    }
}
