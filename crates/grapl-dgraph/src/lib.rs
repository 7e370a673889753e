//! The narrow transactional client interface to the backing graph store,
//! plus the pieces built directly on it: scoped transaction guards,
//! bounded retry, node/edge upserts, and schema provisioning.
//!
//! The query compiler and view layer only ever reach the store through
//! [`DgraphClient`]/[`Transaction`]; [`StubDgraph`] is a first-class
//! scripted backend for tests.

pub mod client;
pub mod error;
pub mod mutate;
pub mod provision;
pub mod retry;
pub mod stub;

pub use client::{
    AlterOp, ClientHandle, DgraphClient, Mutation, MutateResponse, QueryResponse, Transaction,
    TxnGuard,
};
pub use error::ClientError;
pub use mutate::{create_edge, upsert};
pub use provision::{provision, schema_ddl};
pub use retry::{with_retries, RetryPolicy};
pub use stub::StubDgraph;
