// src/core/errors.rs

//! Defines the primary error type for the entire application.

use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed payload: not valid UTF-8")]
    MalformedPayload(#[from] std::str::Utf8Error),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns true for error kinds that represent an ordinary peer
    /// disconnect rather than a server-side fault.
    pub fn is_normal_disconnect(&self) -> bool {
        matches!(self, DispatchError::Io(e) if matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionAborted
        ))
    }
}
