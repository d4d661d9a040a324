// src/core/state.rs

//! Shared server-wide state: the client registry, runtime stats, and the
//! injected processor port.

use crate::config::Config;
use crate::core::processor::Processor;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;

/// Metadata for one connected client. Used for logging and introspection only.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    /// The network address of the client.
    pub addr: SocketAddr,
    /// The unique identifier for the client session.
    pub session_id: u64,
    /// When the connection was accepted.
    pub created: Instant,
    /// When the client last had a message dispatched.
    pub last_message_time: Instant,
}

/// The set of currently connected clients, keyed by a unique session id.
///
/// All registry invariants live here: `add` never duplicates an existing
/// member, `remove` is idempotent, and `snapshot` yields a stable view so
/// iteration never observes concurrent removals.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: DashMap<u64, Arc<Mutex<ClientInfo>>>,
}

impl ClientRegistry {
    /// Registers a client. Returns `false` without overwriting if the
    /// session id is already a member.
    pub fn add(&self, session_id: u64, info: Arc<Mutex<ClientInfo>>) -> bool {
        match self.inner.entry(session_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(info);
                true
            }
        }
    }

    /// Removes a client. Removing an absent member is a no-op, not an error;
    /// returns whether the member was present.
    pub fn remove(&self, session_id: u64) -> bool {
        self.inner.remove(&session_id).is_some()
    }

    /// Looks up the metadata for a registered client.
    pub fn get(&self, session_id: u64) -> Option<Arc<Mutex<ClientInfo>>> {
        self.inner.get(&session_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, session_id: u64) -> bool {
        self.inner.contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns a stable snapshot of the current membership. Removals that
    /// happen while the snapshot is being walked affect the live registry
    /// only, never the snapshot itself.
    pub fn snapshot(&self) -> Vec<(u64, Arc<Mutex<ClientInfo>>)> {
        self.inner
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

/// Monotonic counters describing server activity since startup.
#[derive(Debug, Default)]
pub struct ServerStats {
    total_connections: AtomicU64,
    total_messages: AtomicU64,
}

impl ServerStats {
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_total_messages(&self) {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }
}

/// The central struct holding all shared, server-wide state.
/// Wrapped in an `Arc` and passed to the accept loop and every connection
/// handler; never a process-wide singleton.
pub struct ServerState {
    /// The server's runtime configuration.
    pub config: Config,
    /// A map of all active client connections.
    pub clients: ClientRegistry,
    /// Activity counters.
    pub stats: ServerStats,
    /// The injected command processor. The mutex makes each peel/execute
    /// pair atomic with respect to other clients.
    pub processor: Mutex<Box<dyn Processor>>,
}

impl ServerState {
    /// Creates the shared state for a new server instance.
    pub fn new(config: Config, processor: Box<dyn Processor>) -> Arc<Self> {
        Arc::new(Self {
            config,
            clients: ClientRegistry::default(),
            stats: ServerStats::default(),
            processor: Mutex::new(processor),
        })
    }
}
