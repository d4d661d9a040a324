// src/core/mod.rs

//! The central module containing the core logic and data structures of dispatchd.

pub mod errors;
pub mod processor;
pub mod protocol;
pub mod state;

pub use errors::DispatchError;
