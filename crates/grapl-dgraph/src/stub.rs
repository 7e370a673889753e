//! A scripted in-memory backend implementing the client contract.
//!
//! [`StubDgraph`] is a first-class backend for tests: responses are
//! enqueued ahead of time (including injected transient failures), and
//! every query, mutation, alter, and discard is recorded for assertion.
//! Mutations containing blank-node labels are assigned fresh uids exactly
//! as the store would.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{
    AlterOp, ClientHandle, DgraphClient, Mutation, MutateResponse, QueryResponse, Transaction,
};
use crate::error::ClientError;

#[derive(Debug)]
enum Scripted {
    Json(serde_json::Value),
    TransientFailure,
}

#[derive(Debug, Default)]
struct StubState {
    responses: VecDeque<Scripted>,
    queries: Vec<String>,
    mutations: Vec<serde_json::Value>,
    alters: Vec<String>,
    discards: usize,
    next_uid: u64,
}

/// A scripted store client. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StubDgraph {
    state: Arc<Mutex<StubState>>,
}

impl StubDgraph {
    pub fn new() -> Self {
        StubDgraph::default()
    }

    /// Wraps this stub in a shared client handle.
    pub fn handle(&self) -> ClientHandle {
        Arc::new(self.clone())
    }

    /// Enqueues the next query response.
    pub fn enqueue_json(&self, value: serde_json::Value) {
        self.lock().responses.push_back(Scripted::Json(value));
    }

    /// Enqueues a transient transport failure for the next query.
    pub fn enqueue_transient_failure(&self) {
        self.lock().responses.push_back(Scripted::TransientFailure);
    }

    /// All query strings issued so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    /// All set-mutation payloads issued so far, in order.
    pub fn mutations(&self) -> Vec<serde_json::Value> {
        self.lock().mutations.clone()
    }

    /// All alter schema strings issued so far.
    pub fn alters(&self) -> Vec<String> {
        self.lock().alters.clone()
    }

    /// How many transactions have been discarded.
    pub fn discard_count(&self) -> usize {
        self.lock().discards
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DgraphClient for StubDgraph {
    fn begin_txn(
        &self,
        _read_only: bool,
        _best_effort: bool,
    ) -> Result<Box<dyn Transaction>, ClientError> {
        Ok(Box::new(StubTxn {
            state: self.state.clone(),
            closed: false,
        }))
    }

    fn alter(&self, op: &AlterOp) -> Result<(), ClientError> {
        let mut state = lock(&self.state);
        if let Some(schema) = &op.schema {
            state.alters.push(schema.clone());
        }
        Ok(())
    }
}

struct StubTxn {
    state: Arc<Mutex<StubState>>,
    closed: bool,
}

impl Transaction for StubTxn {
    fn query(
        &mut self,
        query: &str,
        _vars: &std::collections::HashMap<String, String>,
    ) -> Result<QueryResponse, ClientError> {
        if self.closed {
            return Err(ClientError::TxnClosed);
        }
        let mut state = lock(&self.state);
        state.queries.push(query.to_string());
        match state.responses.pop_front() {
            Some(Scripted::Json(value)) => Ok(QueryResponse {
                json: value.to_string(),
            }),
            Some(Scripted::TransientFailure) => Err(ClientError::unavailable()),
            // An unscripted query sees an empty result tree.
            None => Ok(QueryResponse {
                json: "{}".to_string(),
            }),
        }
    }

    fn mutate(
        &mut self,
        mutation: &Mutation,
        _commit_now: bool,
    ) -> Result<MutateResponse, ClientError> {
        if self.closed {
            return Err(ClientError::TxnClosed);
        }
        let mut state = lock(&self.state);
        let mut response = MutateResponse::default();
        if let Some(set) = &mutation.set_json {
            assign_blank_uids(set, &mut state, &mut response);
            state.mutations.push(set.clone());
        }
        Ok(response)
    }

    fn discard(&mut self) -> Result<(), ClientError> {
        if !self.closed {
            self.closed = true;
            lock(&self.state).discards += 1;
        }
        Ok(())
    }
}

fn lock(state: &Arc<Mutex<StubState>>) -> MutexGuard<'_, StubState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Walks a set object and assigns a fresh uid to every `_:label` reference.
fn assign_blank_uids(
    value: &serde_json::Value,
    state: &mut StubState,
    response: &mut MutateResponse,
) {
    match value {
        serde_json::Value::String(s) => {
            if let Some(label) = s.strip_prefix("_:") {
                if !response.uids.contains_key(label) {
                    state.next_uid += 1;
                    response
                        .uids
                        .insert(label.to_string(), format!("0x{:x}", state.next_uid));
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                assign_blank_uids(item, state, response);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                assign_blank_uids(item, state, response);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn scripted_responses_pop_in_order() {
        let stub = StubDgraph::new();
        stub.enqueue_json(json!({ "a": 1 }));
        stub.enqueue_json(json!({ "b": 2 }));
        let mut txn = stub.begin_txn(true, true).unwrap();
        assert_eq!(txn.query("q1", &HashMap::new()).unwrap().json, "{\"a\":1}");
        assert_eq!(txn.query("q2", &HashMap::new()).unwrap().json, "{\"b\":2}");
        // Unscripted queries return an empty tree.
        assert_eq!(txn.query("q3", &HashMap::new()).unwrap().json, "{}");
        assert_eq!(stub.queries(), vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn transient_failures_surface_as_transport_errors() {
        let stub = StubDgraph::new();
        stub.enqueue_transient_failure();
        let mut txn = stub.begin_txn(true, true).unwrap();
        let err = txn.query("q", &HashMap::new()).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn blank_nodes_get_fresh_uids() {
        let stub = StubDgraph::new();
        let mut txn = stub.begin_txn(false, false).unwrap();
        let resp = txn
            .mutate(&Mutation::set(json!({ "uid": "_:new", "k": "v" })), true)
            .unwrap();
        assert!(resp.uids["new"].starts_with("0x"));

        let resp2 = txn
            .mutate(&Mutation::set(json!({ "uid": "_:new" })), true)
            .unwrap();
        assert_ne!(resp.uids["new"], resp2.uids["new"]);
    }

    #[test]
    fn closed_txn_refuses_operations() {
        let stub = StubDgraph::new();
        let mut txn = stub.begin_txn(true, true).unwrap();
        txn.discard().unwrap();
        assert!(matches!(
            txn.query("q", &HashMap::new()),
            Err(ClientError::TxnClosed)
        ));
        // Double discard counts once.
        txn.discard().unwrap();
        assert_eq!(stub.discard_count(), 1);
    }
}
