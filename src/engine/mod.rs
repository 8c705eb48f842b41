//! Engine Client
//!
//! Typed wrapper around the external scan engine's GMP command protocol.
//! Commands are XML documents exchanged through an [`EngineTransport`]; the
//! default transport shells out to the engine's CLI over a unix socket.
//! Responses are parsed into ids, statuses and raw report bytes.
//!
//! Transport-level failures (the CLI process failing or being unreachable)
//! and protocol-level rejections (the engine refusing a command or returning
//! malformed data) are distinct error variants so callers can tell them
//! apart.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::GmpClient;
pub use error::{EngineError, EngineResult};
pub use transport::{EngineTransport, GvmCliTransport};
pub use types::TaskStatus;

#[cfg(test)]
mod tests;
