// src/core/processor.rs

//! The injected port to the external command processor.

/// The contract the server depends on for command execution.
///
/// The processor is an opaque, synchronous collaborator: [`Processor::peel`]
/// stages a raw request, and [`Processor::execute`] returns the textual
/// result for the most recently peeled request. The server serializes access
/// so a peel/execute pair is never interleaved between clients; beyond that,
/// no concurrency or failure contract is imposed. Implementations that need
/// to signal failure do so in their result text.
pub trait Processor: Send {
    /// Ingests the decoded request text and stages internal state.
    fn peel(&mut self, raw: &str);

    /// Computes and returns the result for the most recently peeled request.
    fn execute(&mut self) -> String;
}

/// A stand-in processor that echoes the staged request back unchanged.
///
/// The real processor lives outside this crate and is injected at startup;
/// the shipped binary wires this one in so the server is runnable on its own.
#[derive(Debug, Default)]
pub struct EchoProcessor {
    staged: Option<String>,
}

impl Processor for EchoProcessor {
    fn peel(&mut self, raw: &str) {
        self.staged = Some(raw.to_string());
    }

    fn execute(&mut self) -> String {
        self.staged.take().unwrap_or_default()
    }
}
