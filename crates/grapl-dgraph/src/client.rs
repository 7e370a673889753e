//! The client contract for the backing store, and the scoped transaction
//! guard that releases handles on every exit path.
//!
//! The interface is deliberately narrow: begin a transaction, run a query
//! or a mutation inside it, discard it, and (at provisioning time only)
//! alter the schema. Everything else in the analyzer library is built on
//! these five operations, so backends are fully swappable.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A query response: the store's JSON-shaped result tree, as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub json: String,
}

/// A mutation response: the map from blank-node label to assigned uid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutateResponse {
    pub uids: HashMap<String, String>,
}

/// A mutation: a set object, a delete object, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mutation {
    pub set_json: Option<serde_json::Value>,
    pub delete_json: Option<serde_json::Value>,
}

impl Mutation {
    pub fn set(value: serde_json::Value) -> Self {
        Mutation {
            set_json: Some(value),
            delete_json: None,
        }
    }
}

/// A schema alteration, used only at provisioning time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlterOp {
    pub schema: Option<String>,
    pub drop_all: bool,
}

/// One store transaction. Must be discarded on every exit path; use
/// [`TxnGuard`] rather than holding one of these directly.
pub trait Transaction {
    fn query(
        &mut self,
        query: &str,
        vars: &HashMap<String, String>,
    ) -> Result<QueryResponse, ClientError>;

    fn mutate(&mut self, mutation: &Mutation, commit_now: bool)
        -> Result<MutateResponse, ClientError>;

    fn discard(&mut self) -> Result<(), ClientError>;
}

/// The backing store client. One session per transaction; safe for
/// concurrent use.
pub trait DgraphClient: Send + Sync {
    fn begin_txn(
        &self,
        read_only: bool,
        best_effort: bool,
    ) -> Result<Box<dyn Transaction>, ClientError>;

    fn alter(&self, op: &AlterOp) -> Result<(), ClientError>;
}

/// A shared client handle, held by views for lazy refetch.
pub type ClientHandle = Arc<dyn DgraphClient>;

/// Scoped transaction wrapper: discards the underlying transaction when
/// dropped, whether the enclosing operation succeeded, failed, or panicked.
pub struct TxnGuard {
    txn: Option<Box<dyn Transaction>>,
}

impl TxnGuard {
    /// Begins a transaction on `client` and wraps it.
    pub fn begin(
        client: &dyn DgraphClient,
        read_only: bool,
        best_effort: bool,
    ) -> Result<Self, ClientError> {
        let txn = client.begin_txn(read_only, best_effort)?;
        Ok(TxnGuard { txn: Some(txn) })
    }

    pub fn query(
        &mut self,
        query: &str,
        vars: &HashMap<String, String>,
    ) -> Result<QueryResponse, ClientError> {
        match self.txn.as_mut() {
            Some(txn) => txn.query(query, vars),
            None => Err(ClientError::TxnClosed),
        }
    }

    pub fn mutate(
        &mut self,
        mutation: &Mutation,
        commit_now: bool,
    ) -> Result<MutateResponse, ClientError> {
        match self.txn.as_mut() {
            Some(txn) => txn.mutate(mutation, commit_now),
            None => Err(ClientError::TxnClosed),
        }
    }

    /// Discards eagerly. Dropping the guard has the same effect.
    pub fn discard(mut self) -> Result<(), ClientError> {
        match self.txn.take() {
            Some(mut txn) => txn.discard(),
            None => Ok(()),
        }
    }
}

impl Drop for TxnGuard {
    fn drop(&mut self) {
        if let Some(mut txn) = self.txn.take() {
            if let Err(err) = txn.discard() {
                tracing::debug!(error = %err, "transaction discard failed on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubDgraph;
    use serde_json::json;

    #[test]
    fn guard_discards_on_drop() {
        let stub = StubDgraph::new();
        {
            let _guard = TxnGuard::begin(&stub, true, true).unwrap();
        }
        assert_eq!(stub.discard_count(), 1);
    }

    #[test]
    fn guard_discards_once_with_explicit_discard() {
        let stub = StubDgraph::new();
        let guard = TxnGuard::begin(&stub, true, true).unwrap();
        guard.discard().unwrap();
        assert_eq!(stub.discard_count(), 1);
    }

    #[test]
    fn guard_discards_even_after_query_error() {
        let stub = StubDgraph::new();
        stub.enqueue_transient_failure();
        {
            let mut guard = TxnGuard::begin(&stub, true, true).unwrap();
            let err = guard.query("{ q(func: has(node_key)) { uid } }", &HashMap::new());
            assert!(err.is_err());
        }
        assert_eq!(stub.discard_count(), 1);
    }

    #[test]
    fn guard_forwards_query_responses() {
        let stub = StubDgraph::new();
        stub.enqueue_json(json!({ "res": [{ "uid": "0x1" }] }));
        let mut guard = TxnGuard::begin(&stub, true, true).unwrap();
        let resp = guard
            .query("{ res(func: has(node_key)) { uid } }", &HashMap::new())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&resp.json).unwrap();
        assert_eq!(parsed["res"][0]["uid"], "0x1");
    }
}
