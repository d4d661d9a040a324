// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// An RAII guard that removes a connection from the registry when the
/// handler's scope is exited, however it is exited. Dropping the guard is the
/// `Closing` to `Closed` transition: by the time any other component can
/// observe the registry again, the member is gone.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    session_id: u64,
    addr: SocketAddr,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, session_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.state.clients.remove(self.session_id) {
            info!("One client disconnected: {}", self.addr);
        } else {
            // Registry removal is idempotent; an absent member is a no-op.
            debug!(
                "Client {} was not in the registry upon cleanup.",
                self.addr
            );
        }
    }
}
