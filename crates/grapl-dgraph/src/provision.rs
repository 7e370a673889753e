//! Schema DDL emission and provisioning-time alteration.
//!
//! The DDL is a newline-separated list of predicate declarations followed
//! by one `type` block per node schema. String predicates default to
//! `(trigram, exact, hash)` indexing; `node_key` is always
//! `string @upsert @index(hash)`. Forward edges are uid predicates with
//! `@reverse` so the tilde-prefixed direction is queryable.

use indexmap::IndexMap;

use grapl_core::{Primitive, PropertyType, SchemaRegistry, NODE_KEY};

use crate::client::{AlterOp, DgraphClient};
use crate::error::ClientError;

/// Renders the full store schema for every registered node type.
pub fn schema_ddl(registry: &SchemaRegistry) -> String {
    let mut out = String::new();
    out.push_str("node_key: string @upsert @index(hash) .\n");

    // Predicate declarations are global in the store; dedupe across
    // schemas, first declaration wins.
    let mut declared: IndexMap<String, String> = IndexMap::new();
    for schema in registry.schemas() {
        for (name, ty) in schema.properties() {
            if name == NODE_KEY {
                continue;
            }
            declared
                .entry(name.clone())
                .or_insert_with(|| property_ddl(name, ty));
        }
        for (name, decl) in schema.forward_edges() {
            let card = if decl.edge.relation.is_to_many() {
                "[uid]"
            } else {
                "uid"
            };
            declared
                .entry(name.clone())
                .or_insert_with(|| format!("{name}: {card} @reverse ."));
        }
    }
    for line in declared.values() {
        out.push_str(line);
        out.push('\n');
    }

    for schema in registry.schemas() {
        out.push('\n');
        out.push_str(&format!("type {} {{\n", schema.self_type()));
        out.push_str(&format!("  {NODE_KEY}\n"));
        for name in schema.properties().keys() {
            if name != NODE_KEY {
                out.push_str(&format!("  {name}\n"));
            }
        }
        for (name, _) in schema.forward_edges() {
            out.push_str(&format!("  {name}\n"));
        }
        out.push_str("}\n");
    }
    out
}

fn property_ddl(name: &str, ty: &PropertyType) -> String {
    let (scalar, index) = match ty.primitive {
        Primitive::Str => ("string", "@index(trigram, exact, hash)"),
        Primitive::Int => ("int", "@index(int)"),
        Primitive::Bool => ("bool", "@index(bool)"),
    };
    let scalar = if ty.is_set {
        format!("[{scalar}]")
    } else {
        scalar.to_string()
    };
    format!("{name}: {scalar} {index} .")
}

/// Pushes the registry's DDL to the store in one alter operation.
pub fn provision(client: &dyn DgraphClient, registry: &SchemaRegistry) -> Result<(), ClientError> {
    let ddl = schema_ddl(registry);
    tracing::info!(bytes = ddl.len(), "provisioning store schema");
    client.alter(&AlterOp {
        schema: Some(ddl),
        drop_all: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubDgraph;
    use grapl_core::{EdgeRelation, EdgeT, NodeSchema};

    fn test_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
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
                ),
        );
        registry.register(
            NodeSchema::new("File")
                .with_property("file_path", PropertyType::str_prop())
                .with_property("is_signed", PropertyType::bool_prop()),
        );
        registry.materialize_reverses().unwrap();
        registry
    }

    #[test]
    fn ddl_declares_node_key_upsert() {
        let ddl = schema_ddl(&test_registry());
        assert!(ddl.starts_with("node_key: string @upsert @index(hash) .\n"));
    }

    #[test]
    fn ddl_indexes_by_primitive() {
        let ddl = schema_ddl(&test_registry());
        assert!(ddl.contains("process_name: string @index(trigram, exact, hash) ."));
        assert!(ddl.contains("process_id: int @index(int) ."));
        assert!(ddl.contains("is_signed: bool @index(bool) ."));
    }

    #[test]
    fn ddl_edges_carry_reverse_and_cardinality() {
        let ddl = schema_ddl(&test_registry());
        assert!(ddl.contains("children: [uid] @reverse ."));
        assert!(ddl.contains("bin_file: uid @reverse ."));
        // Reverse entries are not separate predicates.
        assert!(!ddl.contains("parent:"));
        assert!(!ddl.contains("spawned_from:"));
    }

    #[test]
    fn ddl_emits_type_blocks() {
        let ddl = schema_ddl(&test_registry());
        assert!(ddl.contains("type Process {"));
        assert!(ddl.contains("type File {"));
        let process_block = ddl
            .split("type Process {")
            .nth(1)
            .and_then(|s| s.split('}').next())
            .unwrap();
        assert!(process_block.contains("node_key"));
        assert!(process_block.contains("process_name"));
        assert!(process_block.contains("children"));
    }

    #[test]
    fn provision_issues_single_alter() {
        let stub = StubDgraph::new();
        provision(&stub, &test_registry()).unwrap();
        let alters = stub.alters();
        assert_eq!(alters.len(), 1);
        assert!(alters[0].contains("type Process {"));
    }
}
