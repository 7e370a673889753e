//! Flattened adjacency-list rendering of a view graph, for export to
//! downstream consumers that cannot hold cyclic structures.
//!
//! Output is deterministic: node entries are keyed by node key and
//! inserted in uid order, edge rows sort by source key, edge name, then
//! target key.

use std::collections::BTreeMap;

use grapl_core::{NODE_KEY, TYPE_TAG, UID};

use crate::node_view::NodeView;

/// Renders the graph reachable from `root` as
/// `{ "nodes": { node_key: {props} }, "edges": { node_key: [rows] } }`.
/// Each node entry carries its identity predicates and cached properties;
/// each edge row is a `{from, edge_name, to}` triple of node keys.
pub fn to_adjacency_list(root: &NodeView) -> serde_json::Value {
    let mut by_uid: BTreeMap<String, NodeView> = BTreeMap::new();
    let mut stack = vec![root.clone()];
    while let Some(view) = stack.pop() {
        if by_uid.contains_key(&view.uid()) {
            continue;
        }
        for targets in view.edges().values() {
            for target in targets {
                stack.push(target.clone());
            }
        }
        by_uid.insert(view.uid(), view);
    }

    let mut nodes = serde_json::Map::with_capacity(by_uid.len());
    let mut edge_rows: Vec<(String, String, String)> = Vec::new();
    for view in by_uid.values() {
        let mut entry = serde_json::Map::new();
        entry.insert(UID.to_string(), serde_json::Value::String(view.uid()));
        entry.insert(
            NODE_KEY.to_string(),
            serde_json::Value::String(view.node_key()),
        );
        entry.insert(
            TYPE_TAG.to_string(),
            serde_json::Value::Array(
                view.node_types()
                    .into_iter()
                    .map(serde_json::Value::String)
                    .collect(),
            ),
        );
        for (name, value) in view.properties() {
            entry.insert(name, value.to_json());
        }
        nodes.insert(view.node_key(), serde_json::Value::Object(entry));

        for (name, targets) in view.edges() {
            for target in targets {
                edge_rows.push((view.node_key(), name.clone(), target.node_key()));
            }
        }
    }

    edge_rows.sort();
    edge_rows.dedup();
    let mut edges = serde_json::Map::new();
    for (from, name, to) in edge_rows {
        let row = serde_json::json!({ "from": from.clone(), "edge_name": name, "to": to });
        if let serde_json::Value::Array(rows) = edges
            .entry(from)
            .or_insert_with(|| serde_json::Value::Array(Vec::new()))
        {
            rows.push(row);
        }
    }

    serde_json::json!({ "nodes": nodes, "edges": edges })
}
