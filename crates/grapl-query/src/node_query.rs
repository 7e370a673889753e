//! The query graph: shared, mutable builder nodes linked by forward and
//! reverse edges.
//!
//! Each [`NodeQuery`] holds its schema snapshot (taken at construction,
//! which is the extension grafting boundary), a map from property name to
//! DNF filter, and its neighbor links. Attaching a neighbor on either
//! direction always records the link symmetrically on both endpoints so
//! the compiler emits symmetric constraints. Links may form cycles; node
//! identity is by shared allocation.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use grapl_core::cmp::{int_cmps, str_cmps, IntCmp, StrCmp};
use grapl_core::filter::{and_combine, PropertyFilter};
use grapl_core::schema::SchemaEntry;
use grapl_core::{
    registry, Cmp, CoreError, EdgeDirection, NodeSchema, Primitive, NODE_KEY, TYPE_TAG, UID,
};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct QueryNode {
    schema: NodeSchema,
    query_id: u64,
    filters: IndexMap<String, PropertyFilter>,
    /// Forward edge name -> OR list of neighbor queries.
    forward_edges: IndexMap<String, Vec<NodeQuery>>,
    /// Reverse edge name -> OR list of `(neighbor, forward name on neighbor)`.
    reverse_edges: IndexMap<String, Vec<(NodeQuery, String)>>,
}

/// One node of a query pattern. Cloning is shallow: clones refer to the
/// same underlying node.
#[derive(Debug, Clone)]
pub struct NodeQuery {
    inner: Rc<RefCell<QueryNode>>,
}

impl NodeQuery {
    /// Builds a query rooted at `node_type`, snapshotting its schema from
    /// the global registry.
    pub fn for_type(node_type: &str) -> Result<Self, CoreError> {
        let schema = registry::global_read()
            .schema(node_type)
            .cloned()
            .ok_or_else(|| CoreError::SchemaNotRegistered {
                node_type: node_type.to_string(),
            })?;
        Ok(Self::for_schema(schema))
    }

    /// Builds a query over an explicit schema snapshot.
    ///
    /// Seeds the default filters: `Has(node_key)` (so the root scan always
    /// has an existence criterion) and the node's type tag.
    pub fn for_schema(schema: NodeSchema) -> Self {
        let mut filters = IndexMap::new();
        filters.insert(NODE_KEY.to_string(), vec![vec![Cmp::has(NODE_KEY)]]);
        filters.insert(
            TYPE_TAG.to_string(),
            vec![vec![Cmp::eq_str(TYPE_TAG, schema.self_type())]],
        );
        NodeQuery {
            inner: Rc::new(RefCell::new(QueryNode {
                schema,
                query_id: NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed),
                filters,
                forward_edges: IndexMap::new(),
                reverse_edges: IndexMap::new(),
            })),
        }
    }

    // -----------------------------------------------------------------------
    // Builder methods
    // -----------------------------------------------------------------------

    /// Tightens the root filter from `Has(node_key)` to exact equality.
    pub fn with_node_key_eq(self, node_key: &str) -> Self {
        self.inner.borrow_mut().filters.insert(
            NODE_KEY.to_string(),
            vec![vec![Cmp::eq_str(NODE_KEY, node_key)]],
        );
        self
    }

    /// Pins the query to one store-assigned uid.
    pub fn with_uid_eq(self, uid: &str) -> Self {
        self.inner
            .borrow_mut()
            .filters
            .insert(UID.to_string(), vec![vec![Cmp::eq_str(UID, uid)]]);
        self
    }

    /// ANDs a string-comparator disjunction into the filter for `name`.
    ///
    /// `name` must be a declared `Str` property (or `node_key`).
    pub fn with_str_filter(self, name: &str, cmps: &[StrCmp]) -> Result<Self, CoreError> {
        self.check_property(name, Primitive::Str)?;
        let dnf = str_cmps(name, cmps)?;
        self.and_filter(name, dnf);
        Ok(self)
    }

    /// ANDs an integer-comparator disjunction into the filter for `name`.
    pub fn with_int_filter(self, name: &str, cmps: &[IntCmp]) -> Result<Self, CoreError> {
        self.check_property(name, Primitive::Int)?;
        let dnf = int_cmps(name, cmps);
        self.and_filter(name, dnf);
        Ok(self)
    }

    /// ANDs a bare existence constraint on `name` (any primitive). Used by
    /// the view layer to project a single property in a refetch.
    pub fn with_has(self, name: &str) -> Result<Self, CoreError> {
        let node = self.inner.borrow();
        match node.schema.lookup(name) {
            Some(SchemaEntry::Property(_)) => {}
            _ if name == NODE_KEY || name == UID => {}
            _ => {
                return Err(CoreError::UnknownProperty {
                    node_type: node.schema.self_type().to_string(),
                    name: name.to_string(),
                })
            }
        }
        drop(node);
        self.and_filter(name, vec![vec![Cmp::has(name)]]);
        Ok(self)
    }

    /// Attaches a neighbor constraint on `edge_name`, which may be either a
    /// declared forward or reverse edge of this node's schema. Both
    /// endpoints are updated so the link is symmetric.
    pub fn with_edge(self, edge_name: &str, neighbor: NodeQuery) -> Result<Self, CoreError> {
        let decl = {
            let node = self.inner.borrow();
            match node.schema.lookup(edge_name) {
                Some(SchemaEntry::Edge(decl)) => decl,
                _ => {
                    return Err(CoreError::UnknownEdge {
                        node_type: node.schema.self_type().to_string(),
                        name: edge_name.to_string(),
                    })
                }
            }
        };

        if self.ptr_eq(&neighbor) {
            // Self-loop: both directions land on the same allocation.
            let mut node = self.inner.borrow_mut();
            match decl.direction {
                EdgeDirection::Forward => {
                    node.forward_edges
                        .entry(edge_name.to_string())
                        .or_default()
                        .push(neighbor.clone());
                    node.reverse_edges
                        .entry(decl.paired_name.clone())
                        .or_default()
                        .push((neighbor.clone(), edge_name.to_string()));
                }
                EdgeDirection::Reverse => {
                    node.reverse_edges
                        .entry(edge_name.to_string())
                        .or_default()
                        .push((neighbor.clone(), decl.paired_name.clone()));
                    node.forward_edges
                        .entry(decl.paired_name.clone())
                        .or_default()
                        .push(neighbor.clone());
                }
            }
            drop(node);
            return Ok(self);
        }

        match decl.direction {
            EdgeDirection::Forward => {
                self.inner
                    .borrow_mut()
                    .forward_edges
                    .entry(edge_name.to_string())
                    .or_default()
                    .push(neighbor.clone());
                neighbor
                    .inner
                    .borrow_mut()
                    .reverse_edges
                    .entry(decl.paired_name.clone())
                    .or_default()
                    .push((self.clone(), edge_name.to_string()));
            }
            EdgeDirection::Reverse => {
                self.inner
                    .borrow_mut()
                    .reverse_edges
                    .entry(edge_name.to_string())
                    .or_default()
                    .push((neighbor.clone(), decl.paired_name.clone()));
                neighbor
                    .inner
                    .borrow_mut()
                    .forward_edges
                    .entry(decl.paired_name.clone())
                    .or_default()
                    .push(self.clone());
            }
        }
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Introspection (used by the compiler and the view layer)
    // -----------------------------------------------------------------------

    pub fn query_id(&self) -> u64 {
        self.inner.borrow().query_id
    }

    pub fn node_type_name(&self) -> String {
        self.inner.borrow().schema.self_type().to_string()
    }

    pub fn unique_predicate(&self) -> Option<String> {
        self.inner
            .borrow()
            .schema
            .unique_predicate()
            .map(String::from)
    }

    pub fn schema(&self) -> NodeSchema {
        self.inner.borrow().schema.clone()
    }

    /// All property filters, including the schema-defaulted `Has(node_key)`
    /// and type-tag entries.
    pub fn property_filters(&self) -> IndexMap<String, PropertyFilter> {
        self.inner.borrow().filters.clone()
    }

    pub fn forward_edges(&self) -> IndexMap<String, Vec<NodeQuery>> {
        self.inner.borrow().forward_edges.clone()
    }

    pub fn reverse_edges(&self) -> IndexMap<String, Vec<(NodeQuery, String)>> {
        self.inner.borrow().reverse_edges.clone()
    }

    /// Stable identity of the underlying allocation, for visited sets.
    pub fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    pub fn ptr_eq(&self, other: &NodeQuery) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_property(&self, name: &str, expected: Primitive) -> Result<(), CoreError> {
        if name == NODE_KEY || name == UID {
            return Ok(());
        }
        let node = self.inner.borrow();
        match node.schema.lookup(name) {
            Some(SchemaEntry::Property(ty)) if ty.primitive == expected => Ok(()),
            Some(SchemaEntry::Property(ty)) => Err(CoreError::InvalidOperand {
                predicate: name.to_string(),
                expected: ty.to_string(),
                got: format!("{expected}"),
            }),
            _ => Err(CoreError::UnknownProperty {
                node_type: node.schema.self_type().to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn and_filter(&self, name: &str, dnf: PropertyFilter) {
        let mut node = self.inner.borrow_mut();
        let existing = node.filters.shift_remove(name).unwrap_or_default();
        node.filters
            .insert(name.to_string(), and_combine(existing, dnf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapl_core::{EdgeRelation, EdgeT, PropertyType};

    fn process_schema() -> NodeSchema {
        let mut registry = grapl_core::SchemaRegistry::new();
        registry.register(
            NodeSchema::new("Process")
                .with_property("process_id", PropertyType::int_prop())
                .with_property("process_name", PropertyType::str_prop())
                .with_forward_edge(
                    "children",
                    EdgeT::new("Process", "Process", EdgeRelation::OneToMany),
                    "parent",
                )
                .with_unique_predicate("process_id"),
        );
        registry.materialize_reverses().unwrap();
        registry.schema("Process").unwrap().clone()
    }

    #[test]
    fn construction_seeds_default_filters() {
        let q = NodeQuery::for_schema(process_schema());
        let filters = q.property_filters();
        assert_eq!(filters[NODE_KEY], vec![vec![Cmp::has(NODE_KEY)]]);
        assert_eq!(
            filters[TYPE_TAG],
            vec![vec![Cmp::eq_str(TYPE_TAG, "Process")]]
        );
    }

    #[test]
    fn node_key_eq_replaces_has_default() {
        let q = NodeQuery::for_schema(process_schema()).with_node_key_eq("p1");
        let filters = q.property_filters();
        assert_eq!(filters[NODE_KEY], vec![vec![Cmp::eq_str(NODE_KEY, "p1")]]);
    }

    #[test]
    fn str_filter_on_int_property_is_refused() {
        let q = NodeQuery::for_schema(process_schema());
        let err = q.with_str_filter("process_id", &[StrCmp::eq("x")]);
        assert!(matches!(err, Err(CoreError::InvalidOperand { .. })));
    }

    #[test]
    fn unknown_property_is_refused() {
        let q = NodeQuery::for_schema(process_schema());
        let err = q.with_str_filter("nonexistent", &[StrCmp::eq("x")]);
        assert!(matches!(err, Err(CoreError::UnknownProperty { .. })));
    }

    #[test]
    fn repeated_filters_are_anded() {
        let q = NodeQuery::for_schema(process_schema())
            .with_str_filter("process_name", &[StrCmp::eq(vec!["a", "b"])])
            .unwrap()
            .with_str_filter("process_name", &[StrCmp::contains("x")])
            .unwrap();
        let dnf = &q.property_filters()["process_name"];
        // (eq a OR eq b) AND contains x -> two clauses of two comparators.
        assert_eq!(dnf.len(), 2);
        assert!(dnf.iter().all(|clause| clause.len() == 2));
    }

    #[test]
    fn forward_attachment_is_symmetric() {
        let parent = NodeQuery::for_schema(process_schema());
        let child = NodeQuery::for_schema(process_schema());
        let parent = parent.with_edge("children", child.clone()).unwrap();

        let fwd = parent.forward_edges();
        assert!(fwd["children"][0].ptr_eq(&child));

        let rev = child.reverse_edges();
        let (back, forward_name) = &rev["parent"][0];
        assert!(back.ptr_eq(&parent));
        assert_eq!(forward_name, "children");
    }

    #[test]
    fn reverse_attachment_is_symmetric() {
        let child = NodeQuery::for_schema(process_schema());
        let parent = NodeQuery::for_schema(process_schema());
        let child = child.with_edge("parent", parent.clone()).unwrap();

        let rev = child.reverse_edges();
        let (neighbor, forward_name) = &rev["parent"][0];
        assert!(neighbor.ptr_eq(&parent));
        assert_eq!(forward_name, "children");

        let fwd = parent.forward_edges();
        assert!(fwd["children"][0].ptr_eq(&child));
    }

    #[test]
    fn unknown_edge_is_refused() {
        let q = NodeQuery::for_schema(process_schema());
        let other = NodeQuery::for_schema(process_schema());
        let err = q.with_edge("bin_file", other);
        assert!(matches!(err, Err(CoreError::UnknownEdge { .. })));
    }

    #[test]
    fn self_loop_attachment_does_not_deadlock() {
        let q = NodeQuery::for_schema(process_schema());
        let q = q.clone().with_edge("children", q).unwrap();
        assert!(q.forward_edges()["children"][0].ptr_eq(&q));
        assert!(q.reverse_edges()["parent"][0].0.ptr_eq(&q));
    }

    #[test]
    fn query_ids_are_distinct() {
        let a = NodeQuery::for_schema(process_schema());
        let b = NodeQuery::for_schema(process_schema());
        assert_ne!(a.query_id(), b.query_id());
        // Clones share identity.
        assert_eq!(a.clone().query_id(), a.query_id());
        assert!(a.clone().ptr_eq(&a));
    }
}
