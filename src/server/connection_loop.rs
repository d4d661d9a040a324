// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use crate::core::state::ClientInfo;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Duration, timeout};
use tracing::{error, info, warn};

/// The main server loop that accepts connections and handles graceful shutdown.
///
/// One `select!` multiplexes listener acceptability, termination signals, and
/// completed client tasks, so the accept path stays live no matter how busy
/// the connected clients are. Each accepted connection is registered before
/// its handler task is spawned, keeping the registry invariant that a member
/// exists for the whole span of its handler.
pub async fn run(ctx: ServerContext) {
    let ServerContext {
        state,
        listener,
        shutdown_tx,
    } = ctx;

    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to create SIGINT stream");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to create SIGTERM stream");

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested, initiating graceful shutdown.");
                break;
            }

            res = listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!("One client connected: {}", addr);
                        state.stats.increment_total_connections();

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;

                        let info = Arc::new(Mutex::new(ClientInfo {
                            addr,
                            session_id,
                            created: Instant::now(),
                            last_message_time: Instant::now(),
                        }));
                        state.clients.add(session_id, info);

                        let handler = ConnectionHandler::new(
                            socket,
                            addr,
                            state.clone(),
                            session_id,
                            shutdown_tx.subscribe(),
                        );
                        client_tasks.spawn(async move {
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all connections.");
    let _ = shutdown_tx.send(());

    // Give handlers a moment to observe the broadcast and unwind on their
    // own; whatever is left gets aborted.
    if timeout(Duration::from_secs(5), async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for client handlers; aborting the rest.");
    }
    client_tasks.shutdown().await;
    info!("All client connections closed.");

    drop(listener);
    info!("Server close.");
}
