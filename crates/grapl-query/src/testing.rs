//! Shared fixtures for this crate's unit tests.

use grapl_core::registry;
use grapl_core::{EdgeRelation, EdgeT, NodeSchema, PropertyType};
use grapl_dgraph::StubDgraph;

use crate::node_view::NodeView;

/// Registers the Process/File fixture schemas in the global registry.
/// Registration is idempotent, so every test can call this.
pub fn setup_registry() {
    let mut registry = registry::global_write();
    registry.register(
        NodeSchema::new("Process")
            .with_property("process_id", PropertyType::int_prop())
            .with_property("process_name", PropertyType::str_prop())
            .with_forward_edge(
                "children",
                EdgeT::new("Process", "Process", EdgeRelation::OneToMany),
                "parent",
            )
            .with_forward_edge(
                "bin_file",
                EdgeT::new("Process", "File", EdgeRelation::ManyToOne),
                "spawned_from",
            )
            .with_unique_predicate("process_id"),
    );
    registry.register(
        NodeSchema::new("File")
            .with_property("file_path", PropertyType::str_prop())
            .with_unique_predicate("file_path"),
    );
    registry.materialize_reverses().unwrap();
}

pub fn stub() -> StubDgraph {
    StubDgraph::new()
}

/// A bare Process view with no cached properties or edges.
pub fn process_view(stub: &StubDgraph, uid: &str, node_key: &str) -> NodeView {
    let schema = registry::global_read().schema("Process").unwrap().clone();
    NodeView::new(
        stub.handle(),
        uid.to_string(),
        node_key.to_string(),
        "Process".to_string(),
        ["Process".to_string()].into_iter().collect(),
        schema,
    )
}
