//! Hydration of projected result rows into [`NodeView`] graphs.
//!
//! One materializer is used per query execution; it deduplicates views by
//! uid, so a node reached along several paths (or appearing in several
//! rows) materializes once and every reference shares its cache. Property
//! values are coerced against the node's schema; keys prefixed `~` resolve
//! to the schema's declared reverse edge; fields the schema does not know
//! are skipped.

use std::collections::{BTreeSet, HashMap};

use grapl_core::schema::SchemaEntry;
use grapl_core::{registry, CoreError, EdgeDirection, NodeSchema, PropertyValue};
use grapl_core::{NODE_KEY, TYPE_TAG, UID};
use grapl_dgraph::ClientHandle;

use crate::error::QueryError;
use crate::node_view::NodeView;

/// Builds uid-deduplicated views from result rows.
pub struct Materializer {
    client: ClientHandle,
    seen: HashMap<String, NodeView>,
}

impl Materializer {
    pub fn new(client: ClientHandle) -> Self {
        Materializer {
            client,
            seen: HashMap::new(),
        }
    }

    /// Hydrates one result row (and its nested edge rows, recursively).
    pub fn materialize(&mut self, row: &serde_json::Value) -> Result<NodeView, QueryError> {
        let obj = row
            .as_object()
            .ok_or_else(|| QueryError::parse(format!("expected a result row, got {row}")))?;

        let uid = obj
            .get(UID)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| QueryError::parse("result row missing uid"))?;
        let node_key = obj
            .get(NODE_KEY)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| QueryError::parse(format!("row for uid {uid} missing node_key")))?;
        let type_tags = type_tags(obj.get(TYPE_TAG))
            .ok_or_else(|| QueryError::parse(format!("row for uid {uid} missing type tag")))?;
        let (node_type, schema) = resolve_schema(&type_tags)?;

        let view = match self.seen.get(uid) {
            Some(existing) => {
                let existing = existing.clone();
                if existing.node_type() != node_type {
                    return Err(CoreError::InconsistentMerge {
                        uid: uid.to_string(),
                        existing: existing.node_type(),
                        incoming: node_type,
                    }
                    .into());
                }
                existing.add_node_types(type_tags.iter().cloned().collect());
                existing
            }
            None => {
                let view = NodeView::new(
                    self.client.clone(),
                    uid.to_string(),
                    node_key.to_string(),
                    node_type,
                    type_tags.iter().cloned().collect::<BTreeSet<_>>(),
                    schema.clone(),
                );
                self.seen.insert(uid.to_string(), view.clone());
                view
            }
        };

        for (key, value) in obj {
            if key.as_str() == UID || key.as_str() == NODE_KEY || key.as_str() == TYPE_TAG {
                continue;
            }
            if let Some(forward) = key.strip_prefix('~') {
                if let Some(name) = reverse_edge_name(&schema, forward) {
                    self.attach_edge(&view, &name, value)?;
                }
                continue;
            }
            match schema.lookup(key) {
                Some(SchemaEntry::Property(ty)) => {
                    let coerced = PropertyValue::coerce(value, &ty)?;
                    view.set_property(key, coerced);
                }
                Some(SchemaEntry::Edge(_)) => {
                    self.attach_edge(&view, key, value)?;
                }
                // Projections can carry fields from other type tags.
                None => {}
            }
        }

        Ok(view)
    }

    fn attach_edge(
        &mut self,
        view: &NodeView,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), QueryError> {
        match value {
            serde_json::Value::Array(rows) => {
                for row in rows {
                    let target = self.materialize(row)?;
                    view.add_edge(name, target);
                }
            }
            serde_json::Value::Object(_) => {
                let target = self.materialize(value)?;
                view.add_edge(name, target);
            }
            other => {
                return Err(QueryError::parse(format!(
                    "edge '{name}' holds a non-node value: {other}"
                )))
            }
        }
        Ok(())
    }
}

/// The row's type tags, in reported order. The store emits a string for a
/// single tag and an array otherwise.
fn type_tags(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    match value {
        Some(serde_json::Value::String(tag)) => Some(vec![tag.clone()]),
        Some(serde_json::Value::Array(tags)) => {
            let collected: Vec<String> = tags
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect();
            if collected.is_empty() {
                None
            } else {
                Some(collected)
            }
        }
        _ => None,
    }
}

/// Picks the primary type: the first reported tag with a registered schema.
fn resolve_schema(tags: &[String]) -> Result<(String, NodeSchema), QueryError> {
    let registry = registry::global_read();
    for tag in tags {
        if let Some(schema) = registry.schema(tag) {
            return Ok((tag.clone(), schema.clone()));
        }
    }
    Err(CoreError::SchemaNotRegistered {
        node_type: tags.join(", "),
    }
    .into())
}

/// Resolves a `~forward` result key to this schema's declared reverse edge.
fn reverse_edge_name(schema: &NodeSchema, forward: &str) -> Option<String> {
    schema
        .edges()
        .iter()
        .find(|(_, decl)| decl.direction == EdgeDirection::Reverse && decl.paired_name == forward)
        .map(|(name, _)| name.clone())
}
