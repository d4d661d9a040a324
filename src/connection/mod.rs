// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection, including payload
//! decoding, protocol branching, and registry cleanup.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;

// Publicly re-export the primary types from the sub-modules.
pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
