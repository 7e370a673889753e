//! Node and edge mutations: upsert-by-node_key and edge creation.
//!
//! The upsert primitive runs inside one read-write transaction: it first
//! queries for an existing node with the given `node_key`, then issues a
//! single mutation that either updates it in place or creates it through
//! a blank-node label so the response's `uids` map yields the fresh uid.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::json;

use grapl_core::cmp::escape_string;
use grapl_core::{PropertyValue, NODE_KEY, TYPE_TAG, UID};

use crate::client::{DgraphClient, Mutation, TxnGuard};
use crate::error::ClientError;

const BLANK_LABEL: &str = "upsert-node";

/// Creates or updates the node identified by `node_key`, returning its uid.
///
/// Properties are merged into any existing node (set semantics); repeating
/// an upsert with the same key leaves the uid unchanged.
pub fn upsert(
    client: &dyn DgraphClient,
    node_type: &str,
    node_key: &str,
    props: &IndexMap<String, PropertyValue>,
) -> Result<String, ClientError> {
    let mut txn = TxnGuard::begin(client, false, false)?;

    let query = format!(
        "{{\n  existing(func: eq({NODE_KEY}, \"{}\"), first: 1) {{\n    uid\n  }}\n}}",
        escape_string(node_key)
    );
    let resp = txn.query(&query, &HashMap::new())?;
    let parsed: serde_json::Value = serde_json::from_str(&resp.json)?;
    let existing_uid = parsed["existing"][0]["uid"].as_str().map(String::from);

    let mut set_obj = serde_json::Map::new();
    match &existing_uid {
        Some(uid) => set_obj.insert(UID.to_string(), json!(uid)),
        None => set_obj.insert(UID.to_string(), json!(format!("_:{BLANK_LABEL}"))),
    };
    set_obj.insert(NODE_KEY.to_string(), json!(node_key));
    set_obj.insert(TYPE_TAG.to_string(), json!(node_type));
    for (name, value) in props {
        set_obj.insert(name.clone(), value.to_json());
    }

    let mutate_resp = txn.mutate(&Mutation::set(serde_json::Value::Object(set_obj)), true)?;

    match existing_uid {
        Some(uid) => Ok(uid),
        None => mutate_resp
            .uids
            .get(BLANK_LABEL)
            .cloned()
            .ok_or_else(|| ClientError::UnexpectedResponse {
                context: format!("no uid assigned for blank node '{BLANK_LABEL}'"),
            }),
    }
}

/// Sets the forward edge `edge_name` from `from_uid` to `to_uid` in one
/// committed read-write transaction. The reverse direction is served by the
/// store's reverse-edge index (see provisioning).
pub fn create_edge(
    client: &dyn DgraphClient,
    from_uid: &str,
    edge_name: &str,
    to_uid: &str,
) -> Result<(), ClientError> {
    let mut txn = TxnGuard::begin(client, false, false)?;
    let set_obj = json!({
        UID: from_uid,
        edge_name: { UID: to_uid },
    });
    txn.mutate(&Mutation::set(set_obj), true)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubDgraph;
    use grapl_core::PropertyValue;

    fn props(pairs: &[(&str, PropertyValue)]) -> IndexMap<String, PropertyValue> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn upsert_creates_with_blank_node() {
        let stub = StubDgraph::new();
        // No existing node.
        stub.enqueue_json(json!({ "existing": [] }));

        let uid = upsert(
            &stub,
            "Process",
            "p1",
            &props(&[
                ("process_id", PropertyValue::Int(100)),
                ("process_name", PropertyValue::Str("word.exe".into())),
            ]),
        )
        .unwrap();

        assert!(uid.starts_with("0x"));
        let mutations = stub.mutations();
        assert_eq!(mutations.len(), 1);
        let set = &mutations[0];
        assert_eq!(set["uid"], "_:upsert-node");
        assert_eq!(set["node_key"], "p1");
        assert_eq!(set["dgraph.type"], "Process");
        assert_eq!(set["process_id"], 100);
        // The lookup query scans by node_key equality.
        assert!(stub.queries()[0].contains("eq(node_key, \"p1\")"));
    }

    #[test]
    fn upsert_updates_existing_uid() {
        let stub = StubDgraph::new();
        stub.enqueue_json(json!({ "existing": [{ "uid": "0x42" }] }));

        let uid = upsert(
            &stub,
            "Process",
            "p1",
            &props(&[("process_name", PropertyValue::Str("word.exe".into()))]),
        )
        .unwrap();

        assert_eq!(uid, "0x42");
        assert_eq!(stub.mutations()[0]["uid"], "0x42");
    }

    #[test]
    fn upsert_is_idempotent_on_uid() {
        let stub = StubDgraph::new();
        stub.enqueue_json(json!({ "existing": [] }));
        let first = upsert(&stub, "File", "f1", &IndexMap::new()).unwrap();

        // Second upsert finds the node created by the first.
        stub.enqueue_json(json!({ "existing": [{ "uid": first.clone() }] }));
        let second = upsert(
            &stub,
            "File",
            "f1",
            &props(&[("file_path", PropertyValue::Str("/tmp/a".into()))]),
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_discards_txn_on_every_path() {
        let stub = StubDgraph::new();
        stub.enqueue_json(json!({ "existing": [] }));
        upsert(&stub, "Process", "p1", &IndexMap::new()).unwrap();
        assert_eq!(stub.discard_count(), 1);

        // Failure path: the guard still discards.
        stub.enqueue_transient_failure();
        let err = upsert(&stub, "Process", "p2", &IndexMap::new());
        assert!(err.is_err());
        assert_eq!(stub.discard_count(), 2);
    }

    #[test]
    fn create_edge_sets_forward_predicate() {
        let stub = StubDgraph::new();
        create_edge(&stub, "0x1", "children", "0x2").unwrap();
        let set = &stub.mutations()[0];
        assert_eq!(set["uid"], "0x1");
        assert_eq!(set["children"]["uid"], "0x2");
    }
}
