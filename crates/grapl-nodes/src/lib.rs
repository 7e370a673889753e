//! The built-in entity surface: one module per node type, each with its
//! schema declaration plus typed query/view wrappers over the generic
//! layers in `grapl-query`.
//!
//! Call [`init`] once at startup (typed constructors also call it
//! implicitly) to register every built-in schema in the global registry
//! and derive reverse edges. Third-party schemas extend the built-ins
//! through [`extensions`] before any queries run.

use grapl_core::registry;
use grapl_core::{EdgeRelation, EdgeT, NodeSchema, SchemaRegistry};

pub(crate) mod macros;

pub mod asset;
pub mod extensions;
pub mod file;
pub mod ip_address;
pub mod ip_connection;
pub mod ip_port;
pub mod lens;
pub mod network_connection;
pub mod process;
pub mod process_inbound_connection;
pub mod process_outbound_connection;
pub mod risk;

use std::sync::Once;

static INIT: Once = Once::new();

/// Registers every built-in schema in the global registry and materializes
/// reverse edges. Idempotent.
pub fn init() {
    INIT.call_once(|| {
        let mut registry = registry::global_write();
        register_builtin_schemas(&mut registry);
        if let Err(err) = registry.materialize_reverses() {
            tracing::error!(error = %err, "built-in schema registration is incomplete");
        }
    });
}

/// Registers the built-in schemas into `registry` without touching the
/// global singleton. Reverse materialization is left to the caller so
/// further schemas can be registered first.
pub fn register_builtin_schemas(registry: &mut SchemaRegistry) {
    for schema in builtin_schemas() {
        registry.register(schema);
    }
}

fn builtin_schemas() -> Vec<NodeSchema> {
    vec![
        process::schema(),
        file::schema(),
        asset::schema(),
        ip_address::schema(),
        ip_port::schema(),
        ip_connection::schema(),
        network_connection::schema(),
        process_inbound_connection::schema(),
        process_outbound_connection::schema(),
        risk::schema(),
        lens::schema(),
    ]
}

/// Edges every entity carries: it can be the subject of a `Risk` and a
/// member of a `Lens` scope.
pub(crate) fn with_entity_edges(schema: NodeSchema) -> NodeSchema {
    let self_type = schema.self_type().to_string();
    schema
        .with_forward_edge(
            "risks",
            EdgeT::new(&self_type, risk::NODE_TYPE, EdgeRelation::ManyToMany),
            "risky_nodes",
        )
        .with_forward_edge(
            "in_lens",
            EdgeT::new(&self_type, lens::NODE_TYPE, EdgeRelation::ManyToMany),
            "scope",
        )
}
