// src/server/context.rs

use crate::core::state::ServerState;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Holds all the initialized state required to run the server's main loop.
/// Owned by the loop and passed by value; never a process-wide singleton.
pub struct ServerContext {
    pub state: Arc<ServerState>,
    pub listener: TcpListener,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl ServerContext {
    /// The address the listener is actually bound to. Differs from the
    /// configured address when port 0 requested an OS-assigned port.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a handle that triggers a graceful shutdown when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}
