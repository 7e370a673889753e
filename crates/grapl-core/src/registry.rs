//! The schema registry: singleton-per-type schema storage, automatic
//! reverse-edge materialization, and additive runtime extension.
//!
//! Registration is idempotent (the first schema for a type wins). Reverse
//! edges are derived once, after all initial schemas are registered, via
//! [`SchemaRegistry::materialize_reverses`]; any `add_edge` after that
//! materializes its inverse immediately. Extension must complete during
//! process startup; the registry is read-only at query time.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::edge::{EdgeDeclaration, EdgeT};
use crate::error::CoreError;
use crate::property::PropertyType;
use crate::schema::{NodeSchema, SchemaEntry};

/// Holds one canonical schema per node type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, NodeSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: IndexMap::new(),
        }
    }

    /// Stores a schema keyed by its `self_type`. Idempotent: a type that is
    /// already registered keeps its canonical (possibly extended) schema.
    pub fn register(&mut self, schema: NodeSchema) {
        self.schemas
            .entry(schema.self_type().to_string())
            .or_insert(schema);
    }

    pub fn schema(&self, node_type: &str) -> Option<&NodeSchema> {
        self.schemas.get(node_type)
    }

    pub fn node_types(&self) -> impl Iterator<Item = &String> {
        self.schemas.keys()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &NodeSchema> {
        self.schemas.values()
    }

    /// Resolves `name` on `node_type` to a property type or edge entry.
    pub fn prop_type(&self, node_type: &str, name: &str) -> Option<SchemaEntry> {
        self.schemas.get(node_type).and_then(|s| s.lookup(name))
    }

    /// Derives the reverse entry for every declared forward edge onto its
    /// destination schema. Idempotent; unknown destination types error.
    pub fn materialize_reverses(&mut self) -> Result<(), CoreError> {
        // Collect first: inserting reverses mutates destination schemas.
        let mut pending: Vec<(String, String, EdgeDeclaration)> = Vec::new();
        for schema in self.schemas.values() {
            for (name, decl) in schema.forward_edges() {
                pending.push((
                    decl.edge.dest_type.clone(),
                    decl.paired_name.clone(),
                    EdgeDeclaration::reverse_of(decl, name),
                ));
            }
        }
        for (dest_type, reverse_name, reverse_decl) in pending {
            let dest = self.schemas.get_mut(&dest_type).ok_or_else(|| {
                CoreError::SchemaNotRegistered {
                    node_type: dest_type.clone(),
                }
            })?;
            dest.insert_edge(&reverse_name, reverse_decl);
        }
        for schema in self.schemas.values_mut() {
            schema.mark_reverses_materialized();
        }
        Ok(())
    }

    /// Additively declares a property on an existing schema.
    pub fn add_property(
        &mut self,
        node_type: &str,
        name: &str,
        ty: PropertyType,
    ) -> Result<(), CoreError> {
        let schema = self.schemas.get_mut(node_type).ok_or_else(|| {
            CoreError::SchemaNotRegistered {
                node_type: node_type.to_string(),
            }
        })?;
        schema.insert_property(name, ty);
        Ok(())
    }

    /// Additively declares a forward edge on an existing schema and
    /// immediately materializes its inverse on the destination schema.
    pub fn add_edge(
        &mut self,
        node_type: &str,
        forward_name: &str,
        edge: EdgeT,
        reverse_name: &str,
    ) -> Result<(), CoreError> {
        if !self.schemas.contains_key(&edge.dest_type) {
            return Err(CoreError::SchemaNotRegistered {
                node_type: edge.dest_type.clone(),
            });
        }
        let forward = EdgeDeclaration::forward(edge, reverse_name);
        let reverse = EdgeDeclaration::reverse_of(&forward, forward_name);
        let dest_type = forward.edge.dest_type.clone();

        let schema = self.schemas.get_mut(node_type).ok_or_else(|| {
            CoreError::SchemaNotRegistered {
                node_type: node_type.to_string(),
            }
        })?;
        schema.insert_edge(forward_name, forward);

        // Destination schema existence checked above.
        if let Some(dest) = self.schemas.get_mut(&dest_type) {
            dest.insert_edge(reverse_name, reverse);
        }
        Ok(())
    }
}

static GLOBAL: OnceLock<RwLock<SchemaRegistry>> = OnceLock::new();

/// The process-wide registry consulted by query constructors.
pub fn global() -> &'static RwLock<SchemaRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(SchemaRegistry::new()))
}

/// Read access to the global registry, recovering from lock poisoning
/// (the registry is read-only at query time, a poisoned write cannot have
/// left it half-mutated in a way readers care about).
pub fn global_read() -> RwLockReadGuard<'static, SchemaRegistry> {
    match global().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Write access to the global registry, for startup-time registration and
/// extension only.
pub fn global_write() -> RwLockWriteGuard<'static, SchemaRegistry> {
    match global().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{EdgeDirection, EdgeRelation};

    fn registry_with_process_and_file() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            NodeSchema::new("Process")
                .with_property("process_id", PropertyType::int_prop())
                .with_forward_edge(
                    "created_files",
                    EdgeT::new("Process", "File", EdgeRelation::OneToMany),
                    "creator",
                ),
        );
        registry.register(
            NodeSchema::new("File").with_property("file_path", PropertyType::str_prop()),
        );
        registry.materialize_reverses().unwrap();
        registry
    }

    #[test]
    fn reverse_edges_materialized_on_destination() {
        let registry = registry_with_process_and_file();
        let file = registry.schema("File").unwrap();
        let decl = file.edges().get("creator").expect("reverse edge");
        assert_eq!(decl.direction, EdgeDirection::Reverse);
        assert_eq!(decl.paired_name, "created_files");
        assert_eq!(decl.edge.relation, EdgeRelation::ManyToOne);
        assert_eq!(decl.edge.source_type, "File");
        assert_eq!(decl.edge.dest_type, "Process");
        assert!(file.reverses_materialized());
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = registry_with_process_and_file();
        // Re-registering a bare Process schema must not clobber the canonical one.
        registry.register(NodeSchema::new("Process"));
        assert!(registry
            .schema("Process")
            .unwrap()
            .properties()
            .contains_key("process_id"));
    }

    #[test]
    fn materialize_reverses_is_idempotent() {
        let mut registry = registry_with_process_and_file();
        registry.materialize_reverses().unwrap();
        let file = registry.schema("File").unwrap();
        assert_eq!(
            file.edges().get("creator").unwrap().paired_name,
            "created_files"
        );
    }

    #[test]
    fn add_edge_materializes_inverse_immediately() {
        let mut registry = registry_with_process_and_file();
        registry
            .add_edge(
                "Process",
                "wrote_files",
                EdgeT::new("Process", "File", EdgeRelation::ManyToMany),
                "writers",
            )
            .unwrap();
        let file = registry.schema("File").unwrap();
        let decl = file.edges().get("writers").expect("inverse present");
        assert_eq!(decl.paired_name, "wrote_files");
        assert_eq!(decl.edge.relation, EdgeRelation::ManyToMany);
    }

    #[test]
    fn add_edge_unknown_destination_errors() {
        let mut registry = registry_with_process_and_file();
        let err = registry.add_edge(
            "Process",
            "process_asset",
            EdgeT::new("Process", "Asset", EdgeRelation::ManyToOne),
            "asset_processes",
        );
        assert!(matches!(err, Err(CoreError::SchemaNotRegistered { .. })));
    }

    #[test]
    fn add_property_extends_schema() {
        let mut registry = registry_with_process_and_file();
        registry
            .add_property("Process", "auid", PropertyType::int_prop())
            .unwrap();
        assert_eq!(
            registry.prop_type("Process", "auid"),
            Some(SchemaEntry::Property(PropertyType::int_prop()))
        );
    }

    #[test]
    fn prop_type_resolves_all_kinds() {
        let registry = registry_with_process_and_file();
        assert!(matches!(
            registry.prop_type("Process", "process_id"),
            Some(SchemaEntry::Property(_))
        ));
        assert!(matches!(
            registry.prop_type("Process", "created_files"),
            Some(SchemaEntry::Edge(_))
        ));
        assert_eq!(registry.prop_type("Process", "nope"), None);
        assert_eq!(registry.prop_type("Missing", "process_id"), None);
    }
}
