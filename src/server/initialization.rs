// src/server/initialization.rs

//! Handles server initialization: state setup and binding the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::processor::Processor;
use crate::core::state::ServerState;
use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tokio::sync::broadcast;
use tracing::info;

/// Initializes all server components before starting the main loop.
///
/// A bind failure is fatal: the error propagates to the caller and the
/// server never starts. There is no retry.
pub async fn setup(config: Config, processor: Box<dyn Processor>) -> Result<ServerContext> {
    let (shutdown_tx, _) = broadcast::channel(1);

    let listener = bind_listener(&config).await?;
    info!("dispatchd listening on {}", listener.local_addr()?);

    let state = ServerState::new(config, processor);

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
    })
}

/// Binds the listening socket with the configured backlog.
async fn bind_listener(config: &Config) -> Result<TcpListener> {
    let addr: SocketAddr = lookup_host((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to resolve bind address '{}'", config.host))?
        .next()
        .ok_or_else(|| anyhow!("Bind address '{}' resolved to nothing", config.host))?;

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("Failed to bind {addr}"))?;
    let listener = socket
        .listen(config.backlog)
        .with_context(|| format!("Failed to listen on {addr}"))?;
    Ok(listener)
}
