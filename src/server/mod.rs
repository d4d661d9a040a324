// src/server/mod.rs

use crate::config::Config;
use crate::core::processor::Processor;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;

pub use context::ServerContext;
pub use initialization::setup;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config, processor: Box<dyn Processor>) -> Result<()> {
    // 1. Bind the listener and initialize the shared state.
    let server_context = initialization::setup(config, processor).await?;

    // 2. Start the main connection acceptance loop. This runs until shutdown.
    connection_loop::run(server_context).await;

    Ok(())
}

/// Runs the accept loop on an already prepared context.
///
/// Split out of [`run`] so embedders and tests can learn the bound address
/// and take a shutdown handle before the loop starts.
pub async fn serve(ctx: ServerContext) {
    connection_loop::run(ctx).await;
}
