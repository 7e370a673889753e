//! Client error types for grapl-dgraph.
//!
//! `Transport` failures carry a `transient` flag so callers can tell
//! retriable statuses (e.g. `UNAVAILABLE`) from hard failures. Parse
//! errors indicate schema drift between client and store and are never
//! retried.

use thiserror::Error;

/// Errors produced by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The store call failed at the transport level.
    #[error("transport error: {status}{}", if *transient { " (transient)" } else { "" })]
    Transport { status: String, transient: bool },

    /// The store's response could not be decoded into the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A response had the right JSON syntax but the wrong shape.
    #[error("unexpected response shape: {context}")]
    UnexpectedResponse { context: String },

    /// An operation was issued on a transaction that was already discarded.
    #[error("transaction already discarded")]
    TxnClosed,

    /// Schema provisioning was rejected by the store.
    #[error("provisioning failed: {0}")]
    Provision(String),
}

impl ClientError {
    /// A transient `UNAVAILABLE`-style transport failure.
    pub fn unavailable() -> Self {
        ClientError::Transport {
            status: "UNAVAILABLE".to_string(),
            transient: true,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport { transient: true, .. })
    }
}
