//! Query-layer errors, bridging core construction errors and client
//! transport/parse failures.

use thiserror::Error;

use grapl_core::CoreError;
use grapl_dgraph::ClientError;

/// Errors produced while compiling, executing, or materializing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A builder or schema error from the core layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A client transport or mutation error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A result tree did not have the expected shape. Never retried.
    #[error("malformed result: {context}")]
    Parse { context: String },
}

impl QueryError {
    pub fn parse(context: impl Into<String>) -> Self {
        QueryError::Parse {
            context: context.into(),
        }
    }
}
