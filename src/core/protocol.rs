// src/core/protocol.rs

//! Wire-level constants for the dispatch protocol.
//!
//! The protocol is deliberately frameless: one socket receive is treated as
//! one logical message, and replies carry no delimiter. TCP does not actually
//! guarantee write/read boundary preservation under fragmentation or
//! coalescing; the assumption is inherited from the protocol definition and
//! documented here rather than silently "fixed" with a framing scheme.

/// Maximum number of bytes read per receive; also the maximum message size.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Reserved payload that requests connection termination instead of dispatch.
/// No reply is sent for it.
pub const DISCONNECT_SENTINEL: &str = "fin";

/// Literal prefix prepended to every processor result on the wire.
pub const REPLY_PREFIX: &str = "commands/";
