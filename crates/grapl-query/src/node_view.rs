//! Materialized result nodes: shared, cached views over fetched graph
//! data, with lazy refetch for anything the original query did not
//! project.
//!
//! Views for one uid are deduplicated by the materializer, so every path
//! that reaches a node observes the same cached state. A view holds the
//! client handle it was fetched with; `cached: false` (or a cache miss)
//! refetches through it and merges the fresh data in place.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use grapl_core::schema::SchemaEntry;
use grapl_core::{CoreError, NodeSchema, PropertyValue};
use grapl_dgraph::ClientHandle;

use crate::error::QueryError;
use crate::node_query::NodeQuery;

struct ViewNode {
    uid: String,
    node_key: String,
    /// The primary (schema-bearing) node type.
    node_type: String,
    /// Every type tag the store reported for this node.
    node_types: BTreeSet<String>,
    schema: NodeSchema,
    properties: IndexMap<String, PropertyValue>,
    edges: IndexMap<String, Vec<NodeView>>,
}

/// A view over one fetched node. Cloning is shallow; clones share cache
/// state.
#[derive(Clone)]
pub struct NodeView {
    inner: Rc<RefCell<ViewNode>>,
    client: ClientHandle,
}

impl NodeView {
    pub(crate) fn new(
        client: ClientHandle,
        uid: String,
        node_key: String,
        node_type: String,
        node_types: BTreeSet<String>,
        schema: NodeSchema,
    ) -> Self {
        NodeView {
            inner: Rc::new(RefCell::new(ViewNode {
                uid,
                node_key,
                node_type,
                node_types,
                schema,
                properties: IndexMap::new(),
                edges: IndexMap::new(),
            })),
            client,
        }
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub fn uid(&self) -> String {
        self.inner.borrow().uid.clone()
    }

    pub fn node_key(&self) -> String {
        self.inner.borrow().node_key.clone()
    }

    pub fn node_type(&self) -> String {
        self.inner.borrow().node_type.clone()
    }

    pub fn node_types(&self) -> BTreeSet<String> {
        self.inner.borrow().node_types.clone()
    }

    pub fn schema(&self) -> NodeSchema {
        self.inner.borrow().schema.clone()
    }

    pub fn ptr_eq(&self, other: &NodeView) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Cached state
    // -----------------------------------------------------------------------

    pub fn properties(&self) -> IndexMap<String, PropertyValue> {
        self.inner.borrow().properties.clone()
    }

    pub fn edges(&self) -> IndexMap<String, Vec<NodeView>> {
        self.inner.borrow().edges.clone()
    }

    pub(crate) fn set_property(&self, name: &str, value: PropertyValue) {
        self.inner
            .borrow_mut()
            .properties
            .insert(name.to_string(), value);
    }

    pub(crate) fn add_node_types(&self, tags: BTreeSet<String>) {
        self.inner.borrow_mut().node_types.extend(tags);
    }

    /// Records an edge target, deduplicating by uid.
    pub(crate) fn add_edge(&self, name: &str, target: NodeView) {
        let target_uid = target.uid();
        let mut node = self.inner.borrow_mut();
        let targets = node.edges.entry(name.to_string()).or_default();
        if !targets.iter().any(|t| t.uid() == target_uid) {
            targets.push(target);
        }
    }

    // -----------------------------------------------------------------------
    // Lazy access
    // -----------------------------------------------------------------------

    /// Returns the named property, refetching it when `cached` is false or
    /// the cache has no value for it. `Ok(None)` means the store has no
    /// value either.
    pub fn get_property(&self, name: &str, cached: bool) -> Result<Option<PropertyValue>, QueryError> {
        if cached {
            if let Some(value) = self.inner.borrow().properties.get(name) {
                return Ok(Some(value.clone()));
            }
        }
        let query = NodeQuery::for_schema(self.schema())
            .with_uid_eq(&self.uid())
            .with_has(name)?;
        if let Some(fresh) = query.query_first(&self.client, None)? {
            self.merge_from(&fresh)?;
        }
        Ok(self.inner.borrow().properties.get(name).cloned())
    }

    /// Returns the first target of the named edge, refetching on a cache
    /// miss.
    pub fn get_edge(&self, name: &str, cached: bool) -> Result<Option<NodeView>, QueryError> {
        Ok(self.get_edges(name, cached)?.into_iter().next())
    }

    /// Returns every known target of the named edge, refetching when
    /// `cached` is false or the cache holds none.
    pub fn get_edges(&self, name: &str, cached: bool) -> Result<Vec<NodeView>, QueryError> {
        if cached {
            let node = self.inner.borrow();
            if let Some(targets) = node.edges.get(name) {
                if !targets.is_empty() {
                    return Ok(targets.clone());
                }
            }
        }
        let dest_type = match self.schema().lookup(name) {
            Some(SchemaEntry::Edge(decl)) => decl.edge.dest_type,
            _ => {
                return Err(CoreError::UnknownEdge {
                    node_type: self.node_type(),
                    name: name.to_string(),
                }
                .into())
            }
        };
        let neighbor = NodeQuery::for_type(&dest_type)?;
        let query = NodeQuery::for_schema(self.schema())
            .with_uid_eq(&self.uid())
            .with_edge(name, neighbor)?;
        if let Some(fresh) = query.query_first(&self.client, None)? {
            self.merge_from(&fresh)?;
        }
        Ok(self
            .inner
            .borrow()
            .edges
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Merging
    // -----------------------------------------------------------------------

    /// Folds another view of the same node into this one: later property
    /// values win, type tags union, edge targets concatenate deduplicated
    /// by uid. Disagreement on the primary type is fatal.
    pub fn merge_from(&self, other: &NodeView) -> Result<(), QueryError> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        {
            let node = self.inner.borrow();
            let incoming = other.inner.borrow();
            if node.node_type != incoming.node_type {
                return Err(CoreError::InconsistentMerge {
                    uid: node.uid.clone(),
                    existing: node.node_type.clone(),
                    incoming: incoming.node_type.clone(),
                }
                .into());
            }
        }
        let (properties, node_types, edges) = {
            let incoming = other.inner.borrow();
            (
                incoming.properties.clone(),
                incoming.node_types.clone(),
                incoming.edges.clone(),
            )
        };
        {
            let mut node = self.inner.borrow_mut();
            for (name, value) in properties {
                node.properties.insert(name, value);
            }
            node.node_types.extend(node_types);
        }
        for (name, targets) in edges {
            for target in targets {
                self.add_edge(&name, target);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NodeView {
    // Shallow on purpose: edge targets may cycle back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.inner.borrow();
        f.debug_struct("NodeView")
            .field("uid", &node.uid)
            .field("node_key", &node.node_key)
            .field("node_type", &node.node_type)
            .field("properties", &node.properties.len())
            .field("edges", &node.edges.len())
            .finish()
    }
}
